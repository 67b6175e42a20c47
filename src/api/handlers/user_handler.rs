//! User account handlers.

use axum::{
    extract::{Extension, Path, Query, State},
    response::Json,
    routing::{get, put},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::role_handler::PermissionNamesRequest;
use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{Perm, PermissionSet, UserPatch, UserResponse};
use crate::errors::AppResult;
use crate::types::{NoContent, Paginated, PaginationParams};

/// Full replacement list of role ids.
#[derive(Debug, Deserialize, Validate)]
pub struct RoleIdsRequest {
    pub role_ids: Vec<Uuid>,
}

/// Profile update; omitted fields stay as they are.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub full_name: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
}

impl From<UpdateUserRequest> for UserPatch {
    fn from(req: UpdateUserRequest) -> Self {
        Self {
            email: req.email,
            full_name: req.full_name,
            password: req.password,
        }
    }
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
        .route("/:id/roles", put(set_roles))
        .route("/:id/permissions", get(effective_permissions).put(set_permissions))
}

pub async fn list_users(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<UserResponse>>> {
    current_user.require(Perm::UsersRead)?;
    let (page, per_page) = (params.page, params.limit());
    let (users, total) = state.services.users().list_users(params).await?;
    Ok(Json(Paginated::new(
        users.into_iter().map(UserResponse::from).collect(),
        page,
        per_page,
        total,
    )))
}

pub async fn get_user(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserResponse>> {
    // Own account is always readable.
    if current_user.id != id {
        current_user.require(Perm::UsersRead)?;
    }
    let user = state.services.users().get_user(id).await?;
    Ok(Json(UserResponse::from(user)))
}

pub async fn update_user(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    if current_user.id != id {
        current_user.require(Perm::UsersManage)?;
    }
    let user = state.services.users().update_user(id, payload.into()).await?;
    Ok(Json(UserResponse::from(user)))
}

pub async fn delete_user(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<NoContent> {
    current_user.require(Perm::UsersManage)?;
    state.services.users().delete_user(id).await?;
    Ok(NoContent)
}

pub async fn set_roles(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<RoleIdsRequest>,
) -> AppResult<Json<UserResponse>> {
    current_user.require(Perm::UsersManage)?;
    let user = state.services.users().set_roles(id, payload.role_ids).await?;
    Ok(Json(UserResponse::from(user)))
}

pub async fn set_permissions(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<PermissionNamesRequest>,
) -> AppResult<Json<UserResponse>> {
    current_user.require(Perm::UsersManage)?;
    let user = state
        .services
        .users()
        .set_permissions(id, payload.permissions)
        .await?;
    Ok(Json(UserResponse::from(user)))
}

pub async fn effective_permissions(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PermissionSet>> {
    current_user.require(Perm::UsersRead)?;
    Ok(Json(state.services.users().effective_permissions(id).await?))
}
