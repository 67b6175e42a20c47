use axum::{
    extract::{Extension, Path, State},
    response::Json,
    routing::{delete, get, post},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{AcademicYear, Perm};
use crate::errors::AppResult;
use crate::types::{Created, NoContent};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAcademicYearRequest {
    /// e.g. `2024/2025`
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
}

pub fn academic_year_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_years).post(create_year))
        .route("/:id", delete(delete_year))
        .route("/:id/activate", post(activate_year))
}

pub async fn list_years(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<AcademicYear>>> {
    current_user.require(Perm::AcademicYearsRead)?;
    Ok(Json(state.services.academic_years().list_years().await?))
}

pub async fn create_year(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateAcademicYearRequest>,
) -> AppResult<Created<AcademicYear>> {
    current_user.require(Perm::AcademicYearsManage)?;
    let year = state
        .services
        .academic_years()
        .create_year(payload.name, payload.starts_on, payload.ends_on)
        .await?;
    Ok(Created(year))
}

pub async fn delete_year(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<NoContent> {
    current_user.require(Perm::AcademicYearsManage)?;
    state.services.academic_years().delete_year(id).await?;
    Ok(NoContent)
}

/// Activate one year; every other year is deactivated in the same transaction.
pub async fn activate_year(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<AcademicYear>> {
    current_user.require(Perm::AcademicYearsManage)?;
    Ok(Json(state.services.academic_years().activate_year(id).await?))
}
