//! User service - account profile, listing, deletion and grant management.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use super::role_service::resolve_permission_names;
use crate::domain::identity::require_text;
use crate::domain::{Password, PermissionSet, User, UserPatch};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;
use crate::types::PaginationParams;

/// User service trait for dependency injection.
#[async_trait]
pub trait UserService: Send + Sync {
    async fn get_user(&self, id: Uuid) -> AppResult<User>;

    async fn list_users(&self, params: PaginationParams) -> AppResult<(Vec<User>, u64)>;

    /// Change email, full name or password. A new password ends the
    /// current session.
    async fn update_user(&self, id: Uuid, patch: UserPatch) -> AppResult<User>;

    async fn delete_user(&self, id: Uuid) -> AppResult<()>;

    /// Replace the user's roles. Every id must name an existing role.
    async fn set_roles(&self, id: Uuid, role_ids: Vec<Uuid>) -> AppResult<User>;

    /// Replace the user's direct permissions by name.
    async fn set_permissions(&self, id: Uuid, names: Vec<String>) -> AppResult<User>;

    /// Union of role-derived and direct permissions.
    async fn effective_permissions(&self, id: Uuid) -> AppResult<PermissionSet>;
}

/// Concrete implementation of UserService using Unit of Work.
pub struct UserManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> UserManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> UserService for UserManager<U> {
    async fn get_user(&self, id: Uuid) -> AppResult<User> {
        self.uow.users().find_by_id(id).await?.ok_or_not_found("User")
    }

    async fn list_users(&self, params: PaginationParams) -> AppResult<(Vec<User>, u64)> {
        self.uow.users().list(params).await
    }

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> AppResult<User> {
        let users = self.uow.users();
        let mut user = users.find_by_id(id).await?.ok_or_not_found("User")?;

        if let Some(email) = patch.email {
            let email = require_text("email", &email)?;
            if email != user.email {
                if users.find_by_email(&email).await?.is_some() {
                    return Err(AppError::already_exists("Email"));
                }
                user.email = email;
            }
        }
        if let Some(full_name) = patch.full_name {
            user.full_name = require_text("full_name", &full_name)?;
        }
        let password_changed = match patch.password {
            Some(plain) => {
                user.password_hash = Password::new(&plain)?.into_string();
                true
            }
            None => false,
        };

        let user = users.update_profile(user, password_changed).await?;
        if password_changed {
            tracing::info!(user_id = %id, "Password changed, session ended");
        }
        Ok(user)
    }

    async fn delete_user(&self, id: Uuid) -> AppResult<()> {
        self.uow.users().delete(id).await?;
        tracing::info!(user_id = %id, "User deleted");
        Ok(())
    }

    async fn set_roles(&self, id: Uuid, mut role_ids: Vec<Uuid>) -> AppResult<User> {
        role_ids.sort();
        role_ids.dedup();

        let found = self.uow.roles().find_by_ids(role_ids.clone()).await?;
        if let Some(missing) = role_ids.iter().find(|id| !found.iter().any(|r| r.id == **id)) {
            tracing::debug!(role_id = %missing, "Unknown role in assignment");
            return Err(AppError::NotFound("Role"));
        }

        self.uow.users().replace_roles(id, role_ids).await
    }

    async fn set_permissions(&self, id: Uuid, names: Vec<String>) -> AppResult<User> {
        let permission_ids =
            resolve_permission_names(self.uow.permissions().as_ref(), names).await?;
        self.uow.users().replace_permissions(id, permission_ids).await
    }

    async fn effective_permissions(&self, id: Uuid) -> AppResult<PermissionSet> {
        Ok(self.get_user(id).await?.effective_permissions())
    }
}
