use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use uuid::Uuid;

use super::entities::academic_year;
use super::unique_violation;
use crate::domain::AcademicYear;
use crate::errors::{AppError, AppResult, OptionExt};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AcademicYearRepository: Send + Sync {
    async fn list(&self) -> AppResult<Vec<AcademicYear>>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<AcademicYear>>;

    async fn find_by_name(&self, name: &str) -> AppResult<Option<AcademicYear>>;

    async fn create(&self, year: AcademicYear) -> AppResult<AcademicYear>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Deactivate every year and activate `id`, atomically.
    async fn activate(&self, id: Uuid) -> AppResult<AcademicYear>;
}

pub struct AcademicYearStore {
    db: DatabaseConnection,
}

impl AcademicYearStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AcademicYearRepository for AcademicYearStore {
    async fn list(&self) -> AppResult<Vec<AcademicYear>> {
        let models = academic_year::Entity::find()
            .order_by_desc(academic_year::Column::StartsOn)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(AcademicYear::from).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<AcademicYear>> {
        let model = academic_year::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(AcademicYear::from))
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<AcademicYear>> {
        let model = academic_year::Entity::find()
            .filter(academic_year::Column::Name.eq(name))
            .one(&self.db)
            .await?;
        Ok(model.map(AcademicYear::from))
    }

    async fn create(&self, year: AcademicYear) -> AppResult<AcademicYear> {
        let model = academic_year::ActiveModel {
            id: Set(year.id),
            name: Set(year.name),
            starts_on: Set(year.starts_on),
            ends_on: Set(year.ends_on),
            is_active: Set(year.is_active),
            created_at: Set(year.created_at),
            updated_at: Set(year.updated_at),
        }
        .insert(&self.db)
        .await
        .map_err(|e| unique_violation(e, "Academic year"))?;

        Ok(AcademicYear::from(model))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = academic_year::Entity::delete_by_id(id)
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Academic year"));
        }
        Ok(())
    }

    async fn activate(&self, id: Uuid) -> AppResult<AcademicYear> {
        let txn = self.db.begin().await?;

        let target = academic_year::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_not_found("Academic year")?;

        let now = chrono::Utc::now();
        academic_year::Entity::update_many()
            .col_expr(academic_year::Column::IsActive, Expr::value(false))
            .col_expr(academic_year::Column::UpdatedAt, Expr::value(now))
            .filter(academic_year::Column::IsActive.eq(true))
            .exec(&txn)
            .await?;

        let mut active: academic_year::ActiveModel = target.into();
        active.is_active = Set(true);
        active.updated_at = Set(now);
        let model = active.update(&txn).await?;

        txn.commit().await?;
        Ok(AcademicYear::from(model))
    }
}
