//! User aggregate, single-active-session state and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::access::{Permission, PermissionSet, Role};

/// SHA-256 digest (lowercase hex) of an issued access token.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenHash(String);

impl TokenHash {
    /// Hash a raw token.
    pub fn of(token: &str) -> Self {
        Self(hex::encode(Sha256::digest(token.as_bytes())))
    }

    /// Wrap a digest read back from storage.
    pub fn from_stored(digest: String) -> Self {
        Self(digest)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for TokenHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // First bytes are enough to correlate log lines.
        let prefix: String = self.0.chars().take(8).collect();
        write!(f, "TokenHash({}…)", prefix)
    }
}

/// Why a presented access token is no longer accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Revocation {
    /// The user logged out; no token is accepted.
    LoggedOut,
    /// A later login or refresh issued a newer token.
    Superseded,
}

/// Per-user session state backed by `users.current_token_hash`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    Inactive,
    Active(TokenHash),
}

impl Session {
    /// Build from the nullable column.
    pub fn from_column(current_token_hash: Option<String>) -> Self {
        match current_token_hash {
            Some(digest) => Session::Active(TokenHash::from_stored(digest)),
            None => Session::Inactive,
        }
    }

    /// Value to store in the nullable column.
    pub fn to_column(&self) -> Option<String> {
        match self {
            Session::Inactive => None,
            Session::Active(hash) => Some(hash.as_str().to_string()),
        }
    }

    /// Accept `presented` only if it is the one currently active token.
    pub fn check(&self, presented: &TokenHash) -> Result<(), Revocation> {
        match self {
            Session::Inactive => Err(Revocation::LoggedOut),
            Session::Active(current) if current == presented => Ok(()),
            Session::Active(_) => Err(Revocation::Superseded),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Session::Active(_))
    }
}

/// User aggregate with its full access graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    #[serde(skip)]
    pub current_token_hash: Option<String>,
    pub roles: Vec<Role>,
    pub permissions: Vec<Permission>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Current session state.
    pub fn session(&self) -> Session {
        Session::from_column(self.current_token_hash.clone())
    }

    /// Union of every role's permissions and the direct grants.
    pub fn effective_permissions(&self) -> PermissionSet {
        let mut set: PermissionSet = self
            .roles
            .iter()
            .flat_map(|role| role.permission_names())
            .collect();
        set.extend(self.permissions.iter().map(|p| p.name.as_str()));
        set
    }

    /// Direct grants are checked before role grants.
    pub fn has_permission(&self, name: &str) -> bool {
        self.permissions.iter().any(|p| p.name == name)
            || self.roles.iter().any(|role| role.grants(name))
    }

    pub fn role_names(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.name.clone()).collect()
    }
}

/// New account data; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
}

/// Profile update; `None` leaves the field untouched. `password` is plain
/// text and gets hashed by the service.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub password: Option<String>,
}

/// User response (safe to return to client)
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub roles: Vec<String>,
    pub permissions: PermissionSet,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            roles: user.role_names(),
            permissions: user.effective_permissions(),
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            created_at: user.created_at,
        }
    }
}
