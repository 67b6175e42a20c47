//! Roles, permissions and effective permission sets.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::permissions::Perm;

/// A named capability, e.g. `students.read`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A named bundle of permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Assigned automatically on self-registration; never deleted.
    pub is_default: bool,
    pub permissions: Vec<Permission>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Role {
    /// True if this role carries the named permission.
    pub fn grants(&self, name: &str) -> bool {
        self.permissions.iter().any(|p| p.name == name)
    }

    /// Names of the permissions carried by this role.
    pub fn permission_names(&self) -> impl Iterator<Item = &str> {
        self.permissions.iter().map(|p| p.name.as_str())
    }
}

/// Deduplicated set of permission names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<String>);

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.0.insert(name.into())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    /// Membership test against a registered permission.
    pub fn allows(&self, perm: Perm) -> bool {
        self.contains(perm.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>> Extend<S> for PermissionSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(Into::into));
    }
}

/// New role data.
#[derive(Debug, Clone)]
pub struct NewRole {
    pub name: String,
    pub description: Option<String>,
    pub is_default: bool,
    pub permission_names: Vec<String>,
}

/// Partial role update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct RolePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_default: Option<bool>,
}

/// Role response (safe to return to client)
#[derive(Debug, Clone, Serialize)]
pub struct RoleResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_default: bool,
    pub permissions: Vec<String>,
}

impl From<Role> for RoleResponse {
    fn from(role: Role) -> Self {
        Self {
            permissions: role.permission_names().map(str::to_string).collect(),
            id: role.id,
            name: role.name,
            description: role.description,
            is_default: role.is_default,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::role;
    use super::*;

    #[test]
    fn test_permission_set_deduplicates() {
        let set: PermissionSet = ["a.read", "b.read", "a.read"].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains("a.read"));
    }

    #[test]
    fn test_permission_set_allows_registered_perm() {
        let set: PermissionSet = [Perm::StudentsRead.as_str()].into_iter().collect();
        assert!(set.allows(Perm::StudentsRead));
        assert!(!set.allows(Perm::StudentsDelete));
    }

    #[test]
    fn test_role_grants() {
        let teacher = role("teacher", &["grades.write"]);
        assert!(teacher.grants("grades.write"));
        assert!(!teacher.grants("grades.delete"));
    }

    #[test]
    fn test_role_response_lists_permission_names() {
        let response = RoleResponse::from(role("clerk", &["students.read", "parents.read"]));
        assert_eq!(response.permissions, vec!["students.read", "parents.read"]);
    }
}
