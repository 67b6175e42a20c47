use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use super::entities::employee;
use super::unique_violation;
use crate::domain::Employee;
use crate::errors::{AppError, AppResult, OptionExt};
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Employee>>;

    /// Lookup by NIK blind index.
    async fn find_by_nik_hash(&self, nik_hash: &str) -> AppResult<Option<Employee>>;

    async fn find_by_nip(&self, nip: &str) -> AppResult<Option<Employee>>;

    async fn find_by_user_id(&self, user_id: Uuid) -> AppResult<Option<Employee>>;

    async fn list(&self, params: PaginationParams) -> AppResult<(Vec<Employee>, u64)>;

    async fn create(&self, employee: Employee) -> AppResult<Employee>;

    async fn update(&self, employee: Employee) -> AppResult<Employee>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

pub struct EmployeeStore {
    db: DatabaseConnection,
}

impl EmployeeStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EmployeeRepository for EmployeeStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Employee>> {
        let model = employee::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Employee::from))
    }

    async fn find_by_nik_hash(&self, nik_hash: &str) -> AppResult<Option<Employee>> {
        let model = employee::Entity::find()
            .filter(employee::Column::NikHash.eq(nik_hash))
            .one(&self.db)
            .await?;
        Ok(model.map(Employee::from))
    }

    async fn find_by_nip(&self, nip: &str) -> AppResult<Option<Employee>> {
        let model = employee::Entity::find()
            .filter(employee::Column::Nip.eq(nip))
            .one(&self.db)
            .await?;
        Ok(model.map(Employee::from))
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> AppResult<Option<Employee>> {
        let model = employee::Entity::find()
            .filter(employee::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;
        Ok(model.map(Employee::from))
    }

    async fn list(&self, params: PaginationParams) -> AppResult<(Vec<Employee>, u64)> {
        let paginator = employee::Entity::find()
            .order_by_asc(employee::Column::FullName)
            .paginate(&self.db, params.limit());
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(params.page.saturating_sub(1)).await?;
        Ok((models.into_iter().map(Employee::from).collect(), total))
    }

    async fn create(&self, e: Employee) -> AppResult<Employee> {
        let model = employee::ActiveModel {
            id: Set(e.id),
            full_name: Set(e.full_name),
            nik: Set(e.nik),
            nik_hash: Set(e.nik_hash),
            nip: Set(e.nip),
            position: Set(e.position),
            phone: Set(e.phone),
            email: Set(e.email),
            address: Set(e.address),
            user_id: Set(e.user_id),
            created_at: Set(e.created_at),
            updated_at: Set(e.updated_at),
        }
        .insert(&self.db)
        .await
        .map_err(|err| unique_violation(err, "Employee"))?;

        Ok(Employee::from(model))
    }

    async fn update(&self, e: Employee) -> AppResult<Employee> {
        let existing = employee::Entity::find_by_id(e.id)
            .one(&self.db)
            .await?
            .ok_or_not_found("Employee")?;

        let mut active: employee::ActiveModel = existing.into();
        active.full_name = Set(e.full_name);
        active.nik = Set(e.nik);
        active.nik_hash = Set(e.nik_hash);
        active.nip = Set(e.nip);
        active.position = Set(e.position);
        active.phone = Set(e.phone);
        active.email = Set(e.email);
        active.address = Set(e.address);
        active.user_id = Set(e.user_id);
        active.updated_at = Set(chrono::Utc::now());

        let model = active
            .update(&self.db)
            .await
            .map_err(|err| unique_violation(err, "Employee"))?;
        Ok(Employee::from(model))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = employee::Entity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Employee"));
        }
        Ok(())
    }
}
