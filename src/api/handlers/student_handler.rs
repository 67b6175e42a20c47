//! Student handlers, including the guardian pointer and parent links.

use axum::{
    extract::{Extension, Path, Query, State},
    response::Json,
    routing::{get, put},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{
    Gender, GuardianInfo, GuardianKind, LinkedParentView, NewStudent, ParentLink, Perm,
    StudentPatch, StudentView,
};
use crate::errors::AppResult;
use crate::types::{Created, NoContent, Paginated, PaginationParams};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateStudentRequest {
    #[validate(length(min = 1, message = "NISN is required"))]
    pub nisn: String,
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    pub gender: Gender,
    pub birth_place: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub nik: String,
    pub no_kk: Option<String>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStudentRequest {
    #[validate(length(min = 1, message = "NISN cannot be empty"))]
    pub nisn: Option<String>,
    #[validate(length(min = 1, message = "Full name cannot be empty"))]
    pub full_name: Option<String>,
    pub gender: Option<Gender>,
    pub birth_place: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub nik: Option<String>,
    pub no_kk: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetGuardianRequest {
    pub guardian_id: Uuid,
    /// `parent` or `guardian`
    pub guardian_type: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ParentLinkRequest {
    pub parent_id: Uuid,
    #[validate(length(min = 1, message = "relationship_type is required"))]
    pub relationship_type: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SyncParentsRequest {
    #[validate(nested)]
    pub parents: Vec<ParentLinkRequest>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LinkUserRequest {
    pub user_id: Uuid,
}

pub fn student_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_students).post(create_student))
        .route("/me", get(own_student))
        .route(
            "/:id",
            get(get_student).put(update_student).delete(delete_student),
        )
        .route(
            "/:id/guardian",
            get(get_guardian).put(set_guardian).delete(remove_guardian),
        )
        .route("/:id/parents", get(list_parents).put(sync_parents))
        .route("/:id/user", put(link_user))
}

pub async fn list_students(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<StudentView>>> {
    current_user.require(Perm::StudentsRead)?;
    let (page, per_page) = (params.page, params.limit());
    let (students, total) = state.services.students().list_students(params).await?;
    Ok(Json(Paginated::new(students, page, per_page, total)))
}

pub async fn get_student(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<StudentView>> {
    current_user.require(Perm::StudentsRead)?;
    Ok(Json(state.services.students().get_student(id).await?))
}

/// Caller's own student record, reached through `students.user_id`.
pub async fn own_student(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<StudentView>> {
    current_user.require(Perm::StudentsReadOwn)?;
    Ok(Json(
        state
            .services
            .students()
            .student_for_user(current_user.id)
            .await?,
    ))
}

pub async fn create_student(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateStudentRequest>,
) -> AppResult<Created<StudentView>> {
    current_user.require(Perm::StudentsCreate)?;
    let student = state
        .services
        .students()
        .create_student(NewStudent {
            nisn: payload.nisn,
            full_name: payload.full_name,
            gender: payload.gender,
            birth_place: payload.birth_place,
            birth_date: payload.birth_date,
            address: payload.address,
            nik: payload.nik,
            no_kk: payload.no_kk,
            user_id: payload.user_id,
        })
        .await?;
    Ok(Created(student))
}

pub async fn update_student(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateStudentRequest>,
) -> AppResult<Json<StudentView>> {
    current_user.require(Perm::StudentsUpdate)?;
    let student = state
        .services
        .students()
        .update_student(
            id,
            StudentPatch {
                nisn: payload.nisn,
                full_name: payload.full_name,
                gender: payload.gender,
                birth_place: payload.birth_place,
                birth_date: payload.birth_date,
                address: payload.address,
                nik: payload.nik,
                no_kk: payload.no_kk,
            },
        )
        .await?;
    Ok(Json(student))
}

pub async fn delete_student(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<NoContent> {
    current_user.require(Perm::StudentsDelete)?;
    state.services.students().delete_student(id).await?;
    Ok(NoContent)
}

pub async fn get_guardian(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Option<GuardianInfo>>> {
    current_user.require(Perm::StudentsRead)?;
    Ok(Json(state.services.students().guardian_of(id).await?))
}

pub async fn set_guardian(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<SetGuardianRequest>,
) -> AppResult<Json<StudentView>> {
    current_user.require(Perm::StudentsManageGuardian)?;
    let kind: GuardianKind = payload.guardian_type.parse()?;
    let student = state
        .services
        .students()
        .set_guardian(id, payload.guardian_id, kind)
        .await?;
    Ok(Json(student))
}

pub async fn remove_guardian(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<StudentView>> {
    current_user.require(Perm::StudentsManageGuardian)?;
    Ok(Json(state.services.students().remove_guardian(id).await?))
}

pub async fn list_parents(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<LinkedParentView>>> {
    current_user.require(Perm::StudentsRead)?;
    Ok(Json(state.services.students().parents_of(id).await?))
}

pub async fn sync_parents(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<SyncParentsRequest>,
) -> AppResult<Json<Vec<LinkedParentView>>> {
    current_user.require(Perm::StudentsManageParents)?;
    let links = payload
        .parents
        .into_iter()
        .map(|p| ParentLink {
            parent_id: p.parent_id,
            relationship_type: p.relationship_type,
        })
        .collect();
    Ok(Json(state.services.students().sync_parents(id, links).await?))
}

pub async fn link_user(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<LinkUserRequest>,
) -> AppResult<Json<StudentView>> {
    current_user.require(Perm::StudentsUpdate)?;
    Ok(Json(
        state
            .services
            .students()
            .link_user(id, payload.user_id)
            .await?,
    ))
}
