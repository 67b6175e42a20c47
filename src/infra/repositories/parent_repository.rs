use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use super::entities::{parent, student_parent};
use super::student_repository::ensure_not_guardian;
use super::unique_violation;
use crate::domain::{GuardianKind, Parent};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ParentRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Parent>>;

    /// Lookup by NIK blind index.
    async fn find_by_nik_hash(&self, nik_hash: &str) -> AppResult<Option<Parent>>;

    async fn find_by_user_id(&self, user_id: Uuid) -> AppResult<Option<Parent>>;

    async fn list(&self, params: PaginationParams) -> AppResult<(Vec<Parent>, u64)>;

    async fn create(&self, parent: Parent) -> AppResult<Parent>;

    async fn update(&self, parent: Parent) -> AppResult<Parent>;

    /// Delete the parent and its links to students; refused with `Conflict`
    /// while a student names the parent as guardian.
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

pub struct ParentStore {
    db: DatabaseConnection,
}

impl ParentStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ParentRepository for ParentStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Parent>> {
        let model = parent::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Parent::from))
    }

    async fn find_by_nik_hash(&self, nik_hash: &str) -> AppResult<Option<Parent>> {
        let model = parent::Entity::find()
            .filter(parent::Column::NikHash.eq(nik_hash))
            .one(&self.db)
            .await?;
        Ok(model.map(Parent::from))
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> AppResult<Option<Parent>> {
        let model = parent::Entity::find()
            .filter(parent::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;
        Ok(model.map(Parent::from))
    }

    async fn list(&self, params: PaginationParams) -> AppResult<(Vec<Parent>, u64)> {
        let paginator = parent::Entity::find()
            .order_by_asc(parent::Column::FullName)
            .paginate(&self.db, params.limit());
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(params.page.saturating_sub(1)).await?;
        Ok((models.into_iter().map(Parent::from).collect(), total))
    }

    async fn create(&self, p: Parent) -> AppResult<Parent> {
        let model = parent::ActiveModel {
            id: Set(p.id),
            full_name: Set(p.full_name),
            nik: Set(p.nik),
            nik_hash: Set(p.nik_hash),
            phone: Set(p.phone),
            email: Set(p.email),
            occupation: Set(p.occupation),
            address: Set(p.address),
            user_id: Set(p.user_id),
            created_at: Set(p.created_at),
            updated_at: Set(p.updated_at),
        }
        .insert(&self.db)
        .await
        .map_err(|e| unique_violation(e, "Parent"))?;

        Ok(Parent::from(model))
    }

    async fn update(&self, p: Parent) -> AppResult<Parent> {
        let existing = parent::Entity::find_by_id(p.id)
            .one(&self.db)
            .await?
            .ok_or_not_found("Parent")?;

        let mut active: parent::ActiveModel = existing.into();
        active.full_name = Set(p.full_name);
        active.nik = Set(p.nik);
        active.nik_hash = Set(p.nik_hash);
        active.phone = Set(p.phone);
        active.email = Set(p.email);
        active.occupation = Set(p.occupation);
        active.address = Set(p.address);
        active.user_id = Set(p.user_id);
        active.updated_at = Set(chrono::Utc::now());

        let model = active
            .update(&self.db)
            .await
            .map_err(|e| unique_violation(e, "Parent"))?;
        Ok(Parent::from(model))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let txn = self.db.begin().await?;
        ensure_not_guardian(&txn, GuardianKind::Parent, id).await?;

        student_parent::Entity::delete_many()
            .filter(student_parent::Column::ParentId.eq(id))
            .exec(&txn)
            .await?;

        let result = parent::Entity::delete_by_id(id).exec(&txn).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Parent"));
        }

        txn.commit().await?;
        Ok(())
    }
}
