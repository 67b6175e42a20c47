//! Loading of the role/permission graph shared by the user and role stores.

use std::collections::HashMap;

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use super::entities::{permission, role, role_permission, user_permission, user_role};
use crate::domain::{Permission, Role, User};
use crate::errors::AppResult;

pub(crate) async fn permissions_by_ids<C: ConnectionTrait>(
    db: &C,
    ids: Vec<Uuid>,
) -> AppResult<Vec<Permission>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let models = permission::Entity::find()
        .filter(permission::Column::Id.is_in(ids))
        .order_by_asc(permission::Column::Name)
        .all(db)
        .await?;

    Ok(models.into_iter().map(Permission::from).collect())
}

/// Fill `permissions` on each role from the role-permission table.
pub(crate) async fn attach_role_permissions<C: ConnectionTrait>(
    db: &C,
    mut roles: Vec<Role>,
) -> AppResult<Vec<Role>> {
    if roles.is_empty() {
        return Ok(roles);
    }

    let role_ids: Vec<Uuid> = roles.iter().map(|r| r.id).collect();
    let links = role_permission::Entity::find()
        .filter(role_permission::Column::RoleId.is_in(role_ids))
        .all(db)
        .await?;

    let mut permission_ids: Vec<Uuid> = links.iter().map(|l| l.permission_id).collect();
    permission_ids.sort();
    permission_ids.dedup();

    let by_id: HashMap<Uuid, Permission> = permissions_by_ids(db, permission_ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    for role in &mut roles {
        let mut granted: Vec<Permission> = links
            .iter()
            .filter(|l| l.role_id == role.id)
            .filter_map(|l| by_id.get(&l.permission_id).cloned())
            .collect();
        granted.sort_by(|a, b| a.name.cmp(&b.name));
        role.permissions = granted;
    }

    Ok(roles)
}

/// Attach the user's roles (with their permissions) and direct permissions.
pub(crate) async fn attach_user_grants<C: ConnectionTrait>(db: &C, mut user: User) -> AppResult<User> {
    let role_ids: Vec<Uuid> = user_role::Entity::find()
        .filter(user_role::Column::UserId.eq(user.id))
        .all(db)
        .await?
        .into_iter()
        .map(|link| link.role_id)
        .collect();

    let roles = if role_ids.is_empty() {
        Vec::new()
    } else {
        role::Entity::find()
            .filter(role::Column::Id.is_in(role_ids))
            .order_by_asc(role::Column::Name)
            .all(db)
            .await?
            .into_iter()
            .map(Role::from)
            .collect()
    };
    user.roles = attach_role_permissions(db, roles).await?;

    let permission_ids: Vec<Uuid> = user_permission::Entity::find()
        .filter(user_permission::Column::UserId.eq(user.id))
        .all(db)
        .await?
        .into_iter()
        .map(|link| link.permission_id)
        .collect();
    user.permissions = permissions_by_ids(db, permission_ids).await?;

    Ok(user)
}
