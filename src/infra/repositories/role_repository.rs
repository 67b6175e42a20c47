//! Role and permission repositories.

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use super::entities::{permission, role, role_permission, user_role};
use super::grants::attach_role_permissions;
use super::unique_violation;
use crate::domain::{Permission, Role, RolePatch};
use crate::errors::{AppError, AppResult, OptionExt};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Role columns supplied on creation; permissions are linked separately.
#[derive(Debug, Clone)]
pub struct RoleRecord {
    pub name: String,
    pub description: Option<String>,
    pub is_default: bool,
}

/// Roles always come back with their permissions attached.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn list(&self) -> AppResult<Vec<Role>>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Role>>;

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Role>>;

    /// The role linked to self-registered accounts, if one is configured.
    async fn find_default(&self) -> AppResult<Option<Role>>;

    async fn find_by_ids(&self, ids: Vec<Uuid>) -> AppResult<Vec<Role>>;

    /// Insert a role with its permissions. A default role takes the flag
    /// away from every other role in the same transaction.
    async fn create(&self, record: RoleRecord, permission_ids: Vec<Uuid>) -> AppResult<Role>;

    /// Apply the patch. The default role cannot be demoted directly; another
    /// role has to be promoted in its place.
    async fn update(&self, id: Uuid, patch: RolePatch) -> AppResult<Role>;

    async fn replace_permissions(&self, id: Uuid, permission_ids: Vec<Uuid>) -> AppResult<Role>;

    /// Delete the role and its grant rows. Refused with `BadRequest` when the
    /// role is the default one at the time of the delete.
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    async fn list(&self) -> AppResult<Vec<Permission>>;

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Permission>>;

    /// Permissions whose names are in `names`; unknown names are skipped.
    async fn find_by_names(&self, names: Vec<String>) -> AppResult<Vec<Permission>>;

    async fn create(&self, name: String, description: Option<String>) -> AppResult<Permission>;
}

pub struct RoleStore {
    db: DatabaseConnection,
}

impl RoleStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn load(&self, model: Option<role::Model>) -> AppResult<Option<Role>> {
        match model {
            Some(model) => {
                let mut roles = attach_role_permissions(&self.db, vec![Role::from(model)]).await?;
                Ok(roles.pop())
            }
            None => Ok(None),
        }
    }
}

async fn clear_default_flag<C: ConnectionTrait>(db: &C, except: Uuid) -> AppResult<()> {
    role::Entity::update_many()
        .col_expr(role::Column::IsDefault, Expr::value(false))
        .filter(role::Column::IsDefault.eq(true))
        .filter(role::Column::Id.ne(except))
        .exec(db)
        .await?;
    Ok(())
}

async fn link_permissions<C: ConnectionTrait>(
    db: &C,
    role_id: Uuid,
    permission_ids: Vec<Uuid>,
) -> AppResult<()> {
    if permission_ids.is_empty() {
        return Ok(());
    }
    let links = permission_ids
        .into_iter()
        .map(|permission_id| role_permission::ActiveModel {
            role_id: Set(role_id),
            permission_id: Set(permission_id),
        });
    role_permission::Entity::insert_many(links)
        .exec_without_returning(db)
        .await?;
    Ok(())
}

#[async_trait]
impl RoleRepository for RoleStore {
    async fn list(&self) -> AppResult<Vec<Role>> {
        let roles = role::Entity::find()
            .order_by_asc(role::Column::Name)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Role::from)
            .collect();
        attach_role_permissions(&self.db, roles).await
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Role>> {
        let model = role::Entity::find_by_id(id).one(&self.db).await?;
        self.load(model).await
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        let model = role::Entity::find()
            .filter(role::Column::Name.eq(name))
            .one(&self.db)
            .await?;
        self.load(model).await
    }

    async fn find_default(&self) -> AppResult<Option<Role>> {
        let model = role::Entity::find()
            .filter(role::Column::IsDefault.eq(true))
            .one(&self.db)
            .await?;
        self.load(model).await
    }

    async fn find_by_ids(&self, ids: Vec<Uuid>) -> AppResult<Vec<Role>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let roles = role::Entity::find()
            .filter(role::Column::Id.is_in(ids))
            .order_by_asc(role::Column::Name)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Role::from)
            .collect();
        attach_role_permissions(&self.db, roles).await
    }

    async fn create(&self, record: RoleRecord, permission_ids: Vec<Uuid>) -> AppResult<Role> {
        let txn = self.db.begin().await?;

        let id = Uuid::new_v4();
        if record.is_default {
            clear_default_flag(&txn, id).await?;
        }

        let now = chrono::Utc::now();
        let model = role::ActiveModel {
            id: Set(id),
            name: Set(record.name),
            description: Set(record.description),
            is_default: Set(record.is_default),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| unique_violation(e, "Role"))?;

        link_permissions(&txn, id, permission_ids).await?;

        let mut roles = attach_role_permissions(&txn, vec![Role::from(model)]).await?;
        txn.commit().await?;
        roles.pop().ok_or_not_found("Role")
    }

    async fn update(&self, id: Uuid, patch: RolePatch) -> AppResult<Role> {
        let txn = self.db.begin().await?;

        let model = role::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_not_found("Role")?;

        match patch.is_default {
            Some(true) => clear_default_flag(&txn, id).await?,
            Some(false) if model.is_default => {
                return Err(AppError::bad_request(
                    "the default role cannot be demoted; promote another role instead",
                ));
            }
            _ => {}
        }

        let mut active: role::ActiveModel = model.into();
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(description) = patch.description {
            active.description = Set(Some(description));
        }
        if let Some(is_default) = patch.is_default {
            active.is_default = Set(is_default);
        }
        active.updated_at = Set(chrono::Utc::now());

        let model = active
            .update(&txn)
            .await
            .map_err(|e| unique_violation(e, "Role"))?;

        let mut roles = attach_role_permissions(&txn, vec![Role::from(model)]).await?;
        txn.commit().await?;
        roles.pop().ok_or_not_found("Role")
    }

    async fn replace_permissions(&self, id: Uuid, permission_ids: Vec<Uuid>) -> AppResult<Role> {
        let txn = self.db.begin().await?;

        let model = role::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_not_found("Role")?;

        role_permission::Entity::delete_many()
            .filter(role_permission::Column::RoleId.eq(id))
            .exec(&txn)
            .await?;
        link_permissions(&txn, id, permission_ids).await?;

        let mut roles = attach_role_permissions(&txn, vec![Role::from(model)]).await?;
        txn.commit().await?;
        roles.pop().ok_or_not_found("Role")
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let txn = self.db.begin().await?;

        // Locks the row for the rest of the transaction, so a concurrent
        // promotion either sees it gone or makes this match nothing.
        let claimed = role::Entity::update_many()
            .col_expr(role::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
            .filter(role::Column::Id.eq(id))
            .filter(role::Column::IsDefault.eq(false))
            .exec(&txn)
            .await?;
        if claimed.rows_affected == 0 {
            return match role::Entity::find_by_id(id).one(&txn).await? {
                Some(_) => Err(AppError::bad_request("the default role cannot be deleted")),
                None => Err(AppError::NotFound("Role")),
            };
        }

        role_permission::Entity::delete_many()
            .filter(role_permission::Column::RoleId.eq(id))
            .exec(&txn)
            .await?;
        user_role::Entity::delete_many()
            .filter(user_role::Column::RoleId.eq(id))
            .exec(&txn)
            .await?;

        role::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }
}

pub struct PermissionStore {
    db: DatabaseConnection,
}

impl PermissionStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PermissionRepository for PermissionStore {
    async fn list(&self) -> AppResult<Vec<Permission>> {
        let models = permission::Entity::find()
            .order_by_asc(permission::Column::Name)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Permission::from).collect())
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Permission>> {
        let model = permission::Entity::find()
            .filter(permission::Column::Name.eq(name))
            .one(&self.db)
            .await?;
        Ok(model.map(Permission::from))
    }

    async fn find_by_names(&self, names: Vec<String>) -> AppResult<Vec<Permission>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let models = permission::Entity::find()
            .filter(permission::Column::Name.is_in(names))
            .order_by_asc(permission::Column::Name)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Permission::from).collect())
    }

    async fn create(&self, name: String, description: Option<String>) -> AppResult<Permission> {
        let model = permission::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            description: Set(description),
            created_at: Set(chrono::Utc::now()),
        }
        .insert(&self.db)
        .await
        .map_err(|e| unique_violation(e, "Permission"))?;

        Ok(Permission::from(model))
    }
}
