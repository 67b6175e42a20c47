//! Role and permission administration.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::identity::require_text;
use crate::domain::{NewRole, Permission, Role, RolePatch};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{PermissionRepository, RoleRecord, UnitOfWork};

/// Resolve permission names to ids; any unknown name is a `BadRequest`.
pub(crate) async fn resolve_permission_names(
    permissions: &dyn PermissionRepository,
    names: Vec<String>,
) -> AppResult<Vec<Uuid>> {
    let wanted: BTreeSet<String> = names.into_iter().map(|n| n.trim().to_string()).collect();
    if wanted.is_empty() {
        return Ok(Vec::new());
    }

    let found = permissions
        .find_by_names(wanted.iter().cloned().collect())
        .await?;

    if let Some(missing) = wanted
        .iter()
        .find(|name| !found.iter().any(|p| &p.name == *name))
    {
        return Err(AppError::bad_request(format!("unknown permission '{}'", missing)));
    }

    Ok(found.into_iter().map(|p| p.id).collect())
}

#[async_trait]
pub trait RoleService: Send + Sync {
    async fn list_roles(&self) -> AppResult<Vec<Role>>;

    async fn get_role(&self, id: Uuid) -> AppResult<Role>;

    async fn create_role(&self, input: NewRole) -> AppResult<Role>;

    async fn update_role(&self, id: Uuid, patch: RolePatch) -> AppResult<Role>;

    /// Replace the role's permission list with `names`.
    async fn set_role_permissions(&self, id: Uuid, names: Vec<String>) -> AppResult<Role>;

    /// Delete a role; the default role cannot be deleted.
    async fn delete_role(&self, id: Uuid) -> AppResult<()>;

    async fn list_permissions(&self) -> AppResult<Vec<Permission>>;

    async fn create_permission(&self, name: String, description: Option<String>)
        -> AppResult<Permission>;
}

pub struct RoleManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> RoleManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> RoleService for RoleManager<U> {
    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        self.uow.roles().list().await
    }

    async fn get_role(&self, id: Uuid) -> AppResult<Role> {
        self.uow.roles().find_by_id(id).await?.ok_or_not_found("Role")
    }

    async fn create_role(&self, input: NewRole) -> AppResult<Role> {
        let name = require_text("name", &input.name)?;
        let roles = self.uow.roles();

        if roles.find_by_name(&name).await?.is_some() {
            return Err(AppError::already_exists("Role"));
        }

        let permission_ids =
            resolve_permission_names(self.uow.permissions().as_ref(), input.permission_names)
                .await?;

        let role = roles
            .create(
                RoleRecord {
                    name,
                    description: input.description,
                    is_default: input.is_default,
                },
                permission_ids,
            )
            .await?;

        tracing::info!(role = %role.name, is_default = role.is_default, "Role created");
        Ok(role)
    }

    async fn update_role(&self, id: Uuid, mut patch: RolePatch) -> AppResult<Role> {
        let roles = self.uow.roles();
        let current = roles.find_by_id(id).await?.ok_or_not_found("Role")?;

        if let Some(name) = patch.name.take() {
            let name = require_text("name", &name)?;
            if name != current.name && roles.find_by_name(&name).await?.is_some() {
                return Err(AppError::already_exists("Role"));
            }
            patch.name = Some(name);
        }

        roles.update(id, patch).await
    }

    async fn set_role_permissions(&self, id: Uuid, names: Vec<String>) -> AppResult<Role> {
        let roles = self.uow.roles();
        roles.find_by_id(id).await?.ok_or_not_found("Role")?;

        let permission_ids =
            resolve_permission_names(self.uow.permissions().as_ref(), names).await?;
        roles.replace_permissions(id, permission_ids).await
    }

    async fn delete_role(&self, id: Uuid) -> AppResult<()> {
        self.uow.roles().delete(id).await?;
        tracing::info!(role_id = %id, "Role deleted");
        Ok(())
    }

    async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        self.uow.permissions().list().await
    }

    async fn create_permission(
        &self,
        name: String,
        description: Option<String>,
    ) -> AppResult<Permission> {
        let name = require_text("name", &name)?;
        let permissions = self.uow.permissions();

        if permissions.find_by_name(&name).await?.is_some() {
            return Err(AppError::already_exists("Permission"));
        }
        permissions.create(name, description).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::access::fixtures::{permission, role};
    use crate::infra::{MockPermissionRepository, MockRoleRepository, MockUnitOfWork};

    fn manager(roles: MockRoleRepository, permissions: MockPermissionRepository) -> RoleManager<MockUnitOfWork> {
        let roles: Arc<dyn crate::infra::RoleRepository> = Arc::new(roles);
        let permissions: Arc<dyn PermissionRepository> = Arc::new(permissions);
        let mut uow = MockUnitOfWork::new();
        uow.expect_roles().returning(move || roles.clone());
        uow.expect_permissions().returning(move || permissions.clone());
        RoleManager::new(Arc::new(uow))
    }

    #[tokio::test]
    async fn test_create_role_with_unknown_permission_is_rejected() {
        let mut roles = MockRoleRepository::new();
        roles.expect_find_by_name().returning(|_| Ok(None));
        roles.expect_create().never();
        let mut permissions = MockPermissionRepository::new();
        permissions
            .expect_find_by_names()
            .returning(|_| Ok(vec![permission("students.read")]));

        let err = manager(roles, permissions)
            .create_role(NewRole {
                name: "teacher".into(),
                description: None,
                is_default: false,
                permission_names: vec!["students.read".into(), "grades.write".into()],
            })
            .await
            .unwrap_err();

        match err {
            AppError::BadRequest(msg) => assert!(msg.contains("grades.write")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_duplicate_role_conflicts() {
        let mut roles = MockRoleRepository::new();
        roles
            .expect_find_by_name()
            .returning(|_| Ok(Some(role("teacher", &[]))));

        let err = manager(roles, MockPermissionRepository::new())
            .create_role(NewRole {
                name: "teacher".into(),
                description: None,
                is_default: false,
                permission_names: vec![],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
