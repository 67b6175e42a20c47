//! Parent, guardian and employee handlers.

use axum::{
    extract::{Extension, Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{
    EmployeePatch, EmployeeView, GuardianPatch, GuardianView, NewEmployee, NewGuardian,
    NewParent, ParentPatch, ParentView, Perm, PersonInput, PersonPatch,
};
use crate::errors::AppResult;
use crate::types::{Created, NoContent, Paginated, PaginationParams};

/// Fields every person record is created with.
#[derive(Debug, Deserialize, Validate)]
pub struct PersonFields {
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    pub nik: String,
    pub phone: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub address: Option<String>,
    pub user_id: Option<Uuid>,
}

impl From<PersonFields> for PersonInput {
    fn from(p: PersonFields) -> Self {
        PersonInput {
            full_name: p.full_name,
            nik: p.nik,
            phone: p.phone,
            email: p.email,
            address: p.address,
            user_id: p.user_id,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct PersonPatchFields {
    #[validate(length(min = 1, message = "Full name cannot be empty"))]
    pub full_name: Option<String>,
    pub nik: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub address: Option<String>,
}

impl From<PersonPatchFields> for PersonPatch {
    fn from(p: PersonPatchFields) -> Self {
        PersonPatch {
            full_name: p.full_name,
            nik: p.nik,
            phone: p.phone,
            email: p.email,
            address: p.address,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateParentRequest {
    #[serde(flatten)]
    #[validate(nested)]
    pub person: PersonFields,
    pub occupation: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateParentRequest {
    #[serde(flatten)]
    #[validate(nested)]
    pub person: PersonPatchFields,
    pub occupation: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateGuardianRequest {
    #[serde(flatten)]
    #[validate(nested)]
    pub person: PersonFields,
    #[validate(length(min = 1, message = "relationship_to_student is required"))]
    pub relationship_to_student: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateGuardianRequest {
    #[serde(flatten)]
    #[validate(nested)]
    pub person: PersonPatchFields,
    pub relationship_to_student: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateEmployeeRequest {
    #[serde(flatten)]
    #[validate(nested)]
    pub person: PersonFields,
    pub nip: Option<String>,
    pub position: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateEmployeeRequest {
    #[serde(flatten)]
    #[validate(nested)]
    pub person: PersonPatchFields,
    pub nip: Option<String>,
    pub position: Option<String>,
}

pub fn parent_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_parents).post(create_parent))
        .route("/:id", get(get_parent).put(update_parent).delete(delete_parent))
}

pub fn guardian_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_guardians).post(create_guardian))
        .route(
            "/:id",
            get(get_guardian).put(update_guardian).delete(delete_guardian),
        )
}

pub fn employee_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_employees).post(create_employee))
        .route(
            "/:id",
            get(get_employee).put(update_employee).delete(delete_employee),
        )
}

// Parents

pub async fn list_parents(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<ParentView>>> {
    current_user.require(Perm::ParentsRead)?;
    let (page, per_page) = (params.page, params.limit());
    let (parents, total) = state.services.parents().list_parents(params).await?;
    Ok(Json(Paginated::new(parents, page, per_page, total)))
}

pub async fn get_parent(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ParentView>> {
    current_user.require(Perm::ParentsRead)?;
    Ok(Json(state.services.parents().get_parent(id).await?))
}

pub async fn create_parent(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateParentRequest>,
) -> AppResult<Created<ParentView>> {
    current_user.require(Perm::ParentsManage)?;
    let parent = state
        .services
        .parents()
        .create_parent(NewParent {
            person: payload.person.into(),
            occupation: payload.occupation,
        })
        .await?;
    Ok(Created(parent))
}

pub async fn update_parent(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateParentRequest>,
) -> AppResult<Json<ParentView>> {
    current_user.require(Perm::ParentsManage)?;
    let parent = state
        .services
        .parents()
        .update_parent(
            id,
            ParentPatch {
                person: payload.person.into(),
                occupation: payload.occupation,
            },
        )
        .await?;
    Ok(Json(parent))
}

pub async fn delete_parent(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<NoContent> {
    current_user.require(Perm::ParentsManage)?;
    state.services.parents().delete_parent(id).await?;
    Ok(NoContent)
}

// Guardians

pub async fn list_guardians(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<GuardianView>>> {
    current_user.require(Perm::GuardiansRead)?;
    let (page, per_page) = (params.page, params.limit());
    let (guardians, total) = state.services.guardians().list_guardians(params).await?;
    Ok(Json(Paginated::new(guardians, page, per_page, total)))
}

pub async fn get_guardian(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<GuardianView>> {
    current_user.require(Perm::GuardiansRead)?;
    Ok(Json(state.services.guardians().get_guardian(id).await?))
}

pub async fn create_guardian(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateGuardianRequest>,
) -> AppResult<Created<GuardianView>> {
    current_user.require(Perm::GuardiansManage)?;
    let guardian = state
        .services
        .guardians()
        .create_guardian(NewGuardian {
            person: payload.person.into(),
            relationship_to_student: payload.relationship_to_student,
        })
        .await?;
    Ok(Created(guardian))
}

pub async fn update_guardian(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateGuardianRequest>,
) -> AppResult<Json<GuardianView>> {
    current_user.require(Perm::GuardiansManage)?;
    let guardian = state
        .services
        .guardians()
        .update_guardian(
            id,
            GuardianPatch {
                person: payload.person.into(),
                relationship_to_student: payload.relationship_to_student,
            },
        )
        .await?;
    Ok(Json(guardian))
}

pub async fn delete_guardian(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<NoContent> {
    current_user.require(Perm::GuardiansManage)?;
    state.services.guardians().delete_guardian(id).await?;
    Ok(NoContent)
}

// Employees

pub async fn list_employees(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<EmployeeView>>> {
    current_user.require(Perm::EmployeesRead)?;
    let (page, per_page) = (params.page, params.limit());
    let (employees, total) = state.services.employees().list_employees(params).await?;
    Ok(Json(Paginated::new(employees, page, per_page, total)))
}

pub async fn get_employee(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<EmployeeView>> {
    current_user.require(Perm::EmployeesRead)?;
    Ok(Json(state.services.employees().get_employee(id).await?))
}

pub async fn create_employee(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateEmployeeRequest>,
) -> AppResult<Created<EmployeeView>> {
    current_user.require(Perm::EmployeesManage)?;
    let employee = state
        .services
        .employees()
        .create_employee(NewEmployee {
            person: payload.person.into(),
            nip: payload.nip,
            position: payload.position,
        })
        .await?;
    Ok(Created(employee))
}

pub async fn update_employee(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateEmployeeRequest>,
) -> AppResult<Json<EmployeeView>> {
    current_user.require(Perm::EmployeesManage)?;
    let employee = state
        .services
        .employees()
        .update_employee(
            id,
            EmployeePatch {
                person: payload.person.into(),
                nip: payload.nip,
                position: payload.position,
            },
        )
        .await?;
    Ok(Json(employee))
}

pub async fn delete_employee(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<NoContent> {
    current_user.require(Perm::EmployeesManage)?;
    state.services.employees().delete_employee(id).await?;
    Ok(NoContent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flattened_person_fields_deserialize() {
        let body = serde_json::json!({
            "full_name": "Siti Aminah",
            "nik": "3201010101010001",
            "email": "siti@example.com",
            "occupation": "Teacher"
        });
        let req: CreateParentRequest = serde_json::from_value(body).unwrap();

        assert_eq!(req.person.full_name, "Siti Aminah");
        assert_eq!(req.occupation.as_deref(), Some("Teacher"));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_nested_email_is_validated() {
        let body = serde_json::json!({
            "full_name": "Budi",
            "nik": "3201010101010002",
            "email": "not-an-email",
            "relationship_to_student": "uncle"
        });
        let req: CreateGuardianRequest = serde_json::from_value(body).unwrap();

        assert!(req.validate().is_err());
    }
}
