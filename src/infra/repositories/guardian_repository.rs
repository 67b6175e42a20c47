use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use super::entities::guardian;
use super::student_repository::ensure_not_guardian;
use super::unique_violation;
use crate::domain::{Guardian, GuardianKind};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait GuardianRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Guardian>>;

    /// Lookup by NIK blind index.
    async fn find_by_nik_hash(&self, nik_hash: &str) -> AppResult<Option<Guardian>>;

    async fn find_by_user_id(&self, user_id: Uuid) -> AppResult<Option<Guardian>>;

    async fn list(&self, params: PaginationParams) -> AppResult<(Vec<Guardian>, u64)>;

    async fn create(&self, guardian: Guardian) -> AppResult<Guardian>;

    async fn update(&self, guardian: Guardian) -> AppResult<Guardian>;

    /// Delete the guardian; refused with `Conflict` while a student points at it.
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

pub struct GuardianStore {
    db: DatabaseConnection,
}

impl GuardianStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl GuardianRepository for GuardianStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Guardian>> {
        let model = guardian::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Guardian::from))
    }

    async fn find_by_nik_hash(&self, nik_hash: &str) -> AppResult<Option<Guardian>> {
        let model = guardian::Entity::find()
            .filter(guardian::Column::NikHash.eq(nik_hash))
            .one(&self.db)
            .await?;
        Ok(model.map(Guardian::from))
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> AppResult<Option<Guardian>> {
        let model = guardian::Entity::find()
            .filter(guardian::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;
        Ok(model.map(Guardian::from))
    }

    async fn list(&self, params: PaginationParams) -> AppResult<(Vec<Guardian>, u64)> {
        let paginator = guardian::Entity::find()
            .order_by_asc(guardian::Column::FullName)
            .paginate(&self.db, params.limit());
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(params.page.saturating_sub(1)).await?;
        Ok((models.into_iter().map(Guardian::from).collect(), total))
    }

    async fn create(&self, g: Guardian) -> AppResult<Guardian> {
        let model = guardian::ActiveModel {
            id: Set(g.id),
            full_name: Set(g.full_name),
            nik: Set(g.nik),
            nik_hash: Set(g.nik_hash),
            phone: Set(g.phone),
            email: Set(g.email),
            relationship_to_student: Set(g.relationship_to_student),
            address: Set(g.address),
            user_id: Set(g.user_id),
            created_at: Set(g.created_at),
            updated_at: Set(g.updated_at),
        }
        .insert(&self.db)
        .await
        .map_err(|e| unique_violation(e, "Guardian"))?;

        Ok(Guardian::from(model))
    }

    async fn update(&self, g: Guardian) -> AppResult<Guardian> {
        let existing = guardian::Entity::find_by_id(g.id)
            .one(&self.db)
            .await?
            .ok_or_not_found("Guardian")?;

        let mut active: guardian::ActiveModel = existing.into();
        active.full_name = Set(g.full_name);
        active.nik = Set(g.nik);
        active.nik_hash = Set(g.nik_hash);
        active.phone = Set(g.phone);
        active.email = Set(g.email);
        active.relationship_to_student = Set(g.relationship_to_student);
        active.address = Set(g.address);
        active.user_id = Set(g.user_id);
        active.updated_at = Set(chrono::Utc::now());

        let model = active
            .update(&self.db)
            .await
            .map_err(|e| unique_violation(e, "Guardian"))?;
        Ok(Guardian::from(model))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let txn = self.db.begin().await?;
        ensure_not_guardian(&txn, GuardianKind::Guardian, id).await?;

        let result = guardian::Entity::delete_by_id(id).exec(&txn).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Guardian"));
        }

        txn.commit().await?;
        Ok(())
    }
}
