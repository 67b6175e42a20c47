use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::identity::require_text;
use crate::domain::AcademicYear;
use crate::errors::{AppError, AppResult};
use crate::infra::UnitOfWork;

#[async_trait]
pub trait AcademicYearService: Send + Sync {
    async fn list_years(&self) -> AppResult<Vec<AcademicYear>>;

    async fn create_year(
        &self,
        name: String,
        starts_on: NaiveDate,
        ends_on: NaiveDate,
    ) -> AppResult<AcademicYear>;

    async fn delete_year(&self, id: Uuid) -> AppResult<()>;

    /// Make `id` the only active year.
    async fn activate_year(&self, id: Uuid) -> AppResult<AcademicYear>;
}

pub struct AcademicYearManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> AcademicYearManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> AcademicYearService for AcademicYearManager<U> {
    async fn list_years(&self) -> AppResult<Vec<AcademicYear>> {
        self.uow.academic_years().list().await
    }

    async fn create_year(
        &self,
        name: String,
        starts_on: NaiveDate,
        ends_on: NaiveDate,
    ) -> AppResult<AcademicYear> {
        let name = require_text("name", &name)?;
        let year = AcademicYear::new(name, starts_on, ends_on)?;

        let years = self.uow.academic_years();
        if years.find_by_name(&year.name).await?.is_some() {
            return Err(AppError::already_exists("Academic year"));
        }
        years.create(year).await
    }

    async fn delete_year(&self, id: Uuid) -> AppResult<()> {
        self.uow.academic_years().delete(id).await
    }

    async fn activate_year(&self, id: Uuid) -> AppResult<AcademicYear> {
        let year = self.uow.academic_years().activate(id).await?;
        tracing::info!(academic_year = %year.name, "Academic year activated");
        Ok(year)
    }
}
