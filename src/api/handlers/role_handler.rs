//! Role and permission administration handlers.

use axum::{
    extract::{Extension, Path, State},
    response::Json,
    routing::{get, put},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{NewRole, Perm, Permission, RolePatch, RoleResponse};
use crate::errors::AppResult;
use crate::types::{Created, NoContent};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoleRequest {
    #[validate(length(min = 1, message = "Role name is required"))]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRoleRequest {
    #[validate(length(min = 1, message = "Role name cannot be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_default: Option<bool>,
}

/// Full replacement list of permission names.
#[derive(Debug, Deserialize, Validate)]
pub struct PermissionNamesRequest {
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePermissionRequest {
    #[validate(length(min = 1, message = "Permission name is required"))]
    pub name: String,
    pub description: Option<String>,
}

pub fn role_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_roles).post(create_role))
        .route("/:id", get(get_role).put(update_role).delete(delete_role))
        .route("/:id/permissions", put(set_role_permissions))
}

pub fn permission_routes() -> Router<AppState> {
    Router::new().route("/", get(list_permissions).post(create_permission))
}

pub async fn list_roles(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<RoleResponse>>> {
    current_user.require(Perm::RolesRead)?;
    let roles = state.services.roles().list_roles().await?;
    Ok(Json(roles.into_iter().map(RoleResponse::from).collect()))
}

pub async fn get_role(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RoleResponse>> {
    current_user.require(Perm::RolesRead)?;
    let role = state.services.roles().get_role(id).await?;
    Ok(Json(RoleResponse::from(role)))
}

pub async fn create_role(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateRoleRequest>,
) -> AppResult<Created<RoleResponse>> {
    current_user.require(Perm::RolesManage)?;
    let role = state
        .services
        .roles()
        .create_role(NewRole {
            name: payload.name,
            description: payload.description,
            is_default: payload.is_default,
            permission_names: payload.permissions,
        })
        .await?;
    Ok(Created(RoleResponse::from(role)))
}

pub async fn update_role(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateRoleRequest>,
) -> AppResult<Json<RoleResponse>> {
    current_user.require(Perm::RolesManage)?;
    let role = state
        .services
        .roles()
        .update_role(
            id,
            RolePatch {
                name: payload.name,
                description: payload.description,
                is_default: payload.is_default,
            },
        )
        .await?;
    Ok(Json(RoleResponse::from(role)))
}

pub async fn set_role_permissions(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<PermissionNamesRequest>,
) -> AppResult<Json<RoleResponse>> {
    current_user.require(Perm::RolesManage)?;
    let role = state
        .services
        .roles()
        .set_role_permissions(id, payload.permissions)
        .await?;
    Ok(Json(RoleResponse::from(role)))
}

pub async fn delete_role(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<NoContent> {
    current_user.require(Perm::RolesManage)?;
    state.services.roles().delete_role(id).await?;
    Ok(NoContent)
}

pub async fn list_permissions(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Permission>>> {
    current_user.require(Perm::RolesRead)?;
    Ok(Json(state.services.roles().list_permissions().await?))
}

pub async fn create_permission(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreatePermissionRequest>,
) -> AppResult<Created<Permission>> {
    current_user.require(Perm::RolesManage)?;
    let permission = state
        .services
        .roles()
        .create_permission(payload.name, payload.description)
        .await?;
    Ok(Created(permission))
}
