//! Authentication service - registration, login and the single active session.
//!
//! A user has at most one accepted access token at a time. Its SHA-256 is
//! stored on the user row; login overwrites it, refresh swaps it, logout
//! clears it. Every authenticated request re-reads the row, so a token
//! stops working the moment it is superseded or logged out.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use super::authorization::Principal;
use super::tokens::{TokenIssuer, TokenPair};
use crate::config::Config;
use crate::domain::{NewUser, Password, Revocation, Session, TokenHash, User};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;

/// Self-registration input. Role assignment is never caller-controlled.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
}

/// Authentication service trait for dependency injection.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create an account linked to the default role.
    async fn register(&self, registration: Registration) -> AppResult<User>;

    /// Verify credentials (username or email) and start a new session,
    /// replacing any previous one.
    async fn login(&self, identifier: &str, password: &str) -> AppResult<TokenPair>;

    /// Exchange a refresh token for a new pair while the session is active.
    async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair>;

    /// End the user's session.
    async fn logout(&self, user_id: Uuid) -> AppResult<()>;

    /// Check an access token against signature, expiry and the stored
    /// session, returning the user it belongs to.
    async fn validate(&self, access_token: &str) -> AppResult<User>;

    /// `validate` plus the caller's effective permissions.
    async fn authenticate(&self, access_token: &str) -> AppResult<Principal>;

    async fn me(&self, user_id: Uuid) -> AppResult<User>;
}

/// Concrete implementation of AuthService using Unit of Work.
pub struct Authenticator<U: UnitOfWork> {
    uow: Arc<U>,
    tokens: TokenIssuer,
}

impl<U: UnitOfWork> Authenticator<U> {
    pub fn new(uow: Arc<U>, config: &Config) -> Self {
        Self {
            uow,
            tokens: TokenIssuer::new(config),
        }
    }
}

#[async_trait]
impl<U: UnitOfWork> AuthService for Authenticator<U> {
    async fn register(&self, registration: Registration) -> AppResult<User> {
        let users = self.uow.users();

        if users.find_by_username(&registration.username).await?.is_some() {
            return Err(AppError::already_exists("Username"));
        }
        if users.find_by_email(&registration.email).await?.is_some() {
            return Err(AppError::already_exists("Email"));
        }

        let password_hash = Password::new(&registration.password)?.into_string();

        let default_role = self
            .uow
            .roles()
            .find_default()
            .await?
            .ok_or_else(|| AppError::internal("default role is not configured"))?;

        let user = users
            .create_with_role(
                NewUser {
                    username: registration.username,
                    email: registration.email,
                    password_hash,
                    full_name: registration.full_name,
                },
                default_role.id,
            )
            .await?;

        tracing::info!(user_id = %user.id, role = %default_role.name, "User registered");
        Ok(user)
    }

    async fn login(&self, identifier: &str, password: &str) -> AppResult<TokenPair> {
        let users = self.uow.users();
        let user = users.find_by_identifier(identifier).await?;

        let stored_hash = user.as_ref().map(|u| u.password_hash.as_str());
        if !Password::verify_or_dummy(stored_hash, password) {
            tracing::warn!("Rejected login attempt");
            return Err(AppError::InvalidCredentials);
        }
        let user = user.ok_or(AppError::InvalidCredentials)?;

        let pair = self.tokens.issue_pair(user.id)?;
        users
            .set_session(user.id, Some(TokenHash::of(&pair.access_token)))
            .await?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(pair)
    }

    async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let claims = self.tokens.verify_refresh(refresh_token)?;
        let users = self.uow.users();

        let user = users
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let current = match user.session() {
            Session::Active(hash) => hash,
            Session::Inactive => {
                tracing::warn!(user_id = %user.id, "Refresh after logout rejected");
                return Err(AppError::TokenRevoked);
            }
        };

        let pair = self.tokens.issue_pair(user.id)?;
        let swapped = users
            .swap_session(user.id, current, TokenHash::of(&pair.access_token))
            .await?;
        if !swapped {
            tracing::warn!(user_id = %user.id, "Session changed during refresh");
            return Err(AppError::TokenRevoked);
        }

        Ok(pair)
    }

    async fn logout(&self, user_id: Uuid) -> AppResult<()> {
        self.uow.users().set_session(user_id, None).await?;
        tracing::info!(user_id = %user_id, "User logged out");
        Ok(())
    }

    async fn validate(&self, access_token: &str) -> AppResult<User> {
        let claims = self.tokens.verify_access(access_token)?;

        let user = self
            .uow
            .users()
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::Unauthorized)?;

        match user.session().check(&TokenHash::of(access_token)) {
            Ok(()) => Ok(user),
            Err(Revocation::LoggedOut) => {
                tracing::warn!(user_id = %user.id, "Token used after logout");
                Err(AppError::TokenRevoked)
            }
            Err(Revocation::Superseded) => {
                tracing::warn!(user_id = %user.id, "Superseded token presented");
                Err(AppError::TokenRevoked)
            }
        }
    }

    async fn authenticate(&self, access_token: &str) -> AppResult<Principal> {
        let user = self.validate(access_token).await?;
        Ok(Principal {
            id: user.id,
            permissions: user.effective_permissions(),
            username: user.username,
        })
    }

    async fn me(&self, user_id: Uuid) -> AppResult<User> {
        self.uow
            .users()
            .find_by_id(user_id)
            .await?
            .ok_or_not_found("User")
    }
}
