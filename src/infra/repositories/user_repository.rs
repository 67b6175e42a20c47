//! User repository: accounts, their grants and the single active session.

use async_trait::async_trait;
use sea_orm::sea_query::{Condition, Expr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use super::entities::{employee, guardian, parent, student, user, user_permission, user_role};
use super::entities::user::{ActiveModel, Entity as UserEntity};
use super::grants::attach_user_grants;
use super::unique_violation;
use crate::domain::{NewUser, TokenHash, User};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
///
/// Every `User` returned carries its roles and direct permissions.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Look a user up by username or email.
    async fn find_by_identifier(&self, identifier: &str) -> AppResult<Option<User>>;

    async fn exists(&self, id: Uuid) -> AppResult<bool>;

    async fn list(&self, params: PaginationParams) -> AppResult<(Vec<User>, u64)>;

    /// Insert the user and link `role_id` in one transaction.
    async fn create_with_role(&self, new_user: NewUser, role_id: Uuid) -> AppResult<User>;

    /// Write `email`, `full_name` and `password_hash` in one statement. With
    /// `end_session` the stored token hash is cleared by the same write.
    /// Grants are left alone.
    async fn update_profile(&self, user: User, end_session: bool) -> AppResult<User>;

    /// Delete the user, their grants and any person-record links.
    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Unconditionally set or clear the stored session hash (last write wins).
    async fn set_session(&self, id: Uuid, token_hash: Option<TokenHash>) -> AppResult<()>;

    /// Replace the stored session hash only if it still equals `expected`.
    /// Returns `false` when another login or refresh got there first.
    async fn swap_session(&self, id: Uuid, expected: TokenHash, next: TokenHash)
        -> AppResult<bool>;

    async fn replace_roles(&self, id: Uuid, role_ids: Vec<Uuid>) -> AppResult<User>;

    async fn replace_permissions(&self, id: Uuid, permission_ids: Vec<Uuid>) -> AppResult<User>;
}

/// Concrete implementation of UserRepository
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn load(&self, model: Option<user::Model>) -> AppResult<Option<User>> {
        match model {
            Some(model) => Ok(Some(attach_user_grants(&self.db, User::from(model)).await?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let model = UserEntity::find_by_id(id).one(&self.db).await?;
        self.load(model).await
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let model = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?;
        self.load(model).await
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let model = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?;
        self.load(model).await
    }

    async fn find_by_identifier(&self, identifier: &str) -> AppResult<Option<User>> {
        let model = UserEntity::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.eq(identifier))
                    .add(user::Column::Email.eq(identifier)),
            )
            .one(&self.db)
            .await?;
        self.load(model).await
    }

    async fn exists(&self, id: Uuid) -> AppResult<bool> {
        let count = UserEntity::find()
            .filter(user::Column::Id.eq(id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn list(&self, params: PaginationParams) -> AppResult<(Vec<User>, u64)> {
        let paginator = UserEntity::find()
            .order_by_asc(user::Column::Username)
            .paginate(&self.db, params.limit());
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(params.page.saturating_sub(1)).await?;

        let mut users = Vec::with_capacity(models.len());
        for model in models {
            users.push(attach_user_grants(&self.db, User::from(model)).await?);
        }
        Ok((users, total))
    }

    async fn create_with_role(&self, new_user: NewUser, role_id: Uuid) -> AppResult<User> {
        let txn = self.db.begin().await?;

        let now = chrono::Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(new_user.username),
            email: Set(new_user.email),
            password_hash: Set(new_user.password_hash),
            full_name: Set(new_user.full_name),
            current_token_hash: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let model = active_model
            .insert(&txn)
            .await
            .map_err(|e| unique_violation(e, "User"))?;

        user_role::ActiveModel {
            user_id: Set(model.id),
            role_id: Set(role_id),
        }
        .insert(&txn)
        .await?;

        let created = attach_user_grants(&txn, User::from(model)).await?;
        txn.commit().await?;
        Ok(created)
    }

    async fn update_profile(&self, user: User, end_session: bool) -> AppResult<User> {
        let model = UserEntity::find_by_id(user.id)
            .one(&self.db)
            .await?
            .ok_or_not_found("User")?;

        let mut active: ActiveModel = model.into();
        active.email = Set(user.email);
        active.full_name = Set(user.full_name);
        active.password_hash = Set(user.password_hash);
        if end_session {
            active.current_token_hash = Set(None);
        }
        active.updated_at = Set(chrono::Utc::now());
        let model = active
            .update(&self.db)
            .await
            .map_err(|e| unique_violation(e, "Email"))?;

        attach_user_grants(&self.db, User::from(model)).await
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let txn = self.db.begin().await?;

        user_role::Entity::delete_many()
            .filter(user_role::Column::UserId.eq(id))
            .exec(&txn)
            .await?;
        user_permission::Entity::delete_many()
            .filter(user_permission::Column::UserId.eq(id))
            .exec(&txn)
            .await?;

        student::Entity::update_many()
            .col_expr(student::Column::UserId, Expr::value(Option::<Uuid>::None))
            .filter(student::Column::UserId.eq(id))
            .exec(&txn)
            .await?;
        parent::Entity::update_many()
            .col_expr(parent::Column::UserId, Expr::value(Option::<Uuid>::None))
            .filter(parent::Column::UserId.eq(id))
            .exec(&txn)
            .await?;
        guardian::Entity::update_many()
            .col_expr(guardian::Column::UserId, Expr::value(Option::<Uuid>::None))
            .filter(guardian::Column::UserId.eq(id))
            .exec(&txn)
            .await?;
        employee::Entity::update_many()
            .col_expr(employee::Column::UserId, Expr::value(Option::<Uuid>::None))
            .filter(employee::Column::UserId.eq(id))
            .exec(&txn)
            .await?;

        let result = UserEntity::delete_by_id(id).exec(&txn).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("User"));
        }

        txn.commit().await?;
        Ok(())
    }

    async fn set_session(&self, id: Uuid, token_hash: Option<TokenHash>) -> AppResult<()> {
        let stored = token_hash.map(|hash| hash.as_str().to_string());
        let result = UserEntity::update_many()
            .col_expr(user::Column::CurrentTokenHash, Expr::value(stored))
            .col_expr(user::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
            .filter(user::Column::Id.eq(id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound("User"));
        }
        Ok(())
    }

    async fn swap_session(
        &self,
        id: Uuid,
        expected: TokenHash,
        next: TokenHash,
    ) -> AppResult<bool> {
        let result = UserEntity::update_many()
            .col_expr(
                user::Column::CurrentTokenHash,
                Expr::value(next.as_str().to_string()),
            )
            .col_expr(user::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
            .filter(user::Column::Id.eq(id))
            .filter(user::Column::CurrentTokenHash.eq(expected.as_str()))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }

    async fn replace_roles(&self, id: Uuid, role_ids: Vec<Uuid>) -> AppResult<User> {
        let txn = self.db.begin().await?;

        let model = UserEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_not_found("User")?;

        user_role::Entity::delete_many()
            .filter(user_role::Column::UserId.eq(id))
            .exec(&txn)
            .await?;

        if !role_ids.is_empty() {
            let links = role_ids.into_iter().map(|role_id| user_role::ActiveModel {
                user_id: Set(id),
                role_id: Set(role_id),
            });
            user_role::Entity::insert_many(links)
                .exec_without_returning(&txn)
                .await?;
        }

        let updated = attach_user_grants(&txn, User::from(model)).await?;
        txn.commit().await?;
        Ok(updated)
    }

    async fn replace_permissions(&self, id: Uuid, permission_ids: Vec<Uuid>) -> AppResult<User> {
        let txn = self.db.begin().await?;

        let model = UserEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_not_found("User")?;

        user_permission::Entity::delete_many()
            .filter(user_permission::Column::UserId.eq(id))
            .exec(&txn)
            .await?;

        if !permission_ids.is_empty() {
            let links = permission_ids
                .into_iter()
                .map(|permission_id| user_permission::ActiveModel {
                    user_id: Set(id),
                    permission_id: Set(permission_id),
                });
            user_permission::Entity::insert_many(links)
                .exec_without_returning(&txn)
                .await?;
        }

        let updated = attach_user_grants(&txn, User::from(model)).await?;
        txn.commit().await?;
        Ok(updated)
    }
}
