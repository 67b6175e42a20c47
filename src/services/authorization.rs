//! Authorization gate.
//!
//! Every protected operation names exactly one permission; callers holding
//! it (directly or through any role) pass, everyone else gets `Forbidden`.

use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Perm, PermissionSet};
use crate::errors::{AppError, AppResult};

/// Check `required` against an effective permission set.
pub fn authorize(granted: &PermissionSet, required: Perm) -> AppResult<()> {
    if granted.allows(required) {
        Ok(())
    } else {
        tracing::debug!(permission = %required, "Permission denied");
        Err(AppError::Forbidden)
    }
}

/// Authenticated caller with the permissions loaded for this request.
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
    pub id: Uuid,
    pub username: String,
    pub permissions: PermissionSet,
}

impl Principal {
    pub fn require(&self, required: Perm) -> AppResult<()> {
        authorize(&self.permissions, required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_granted_permission_passes() {
        let granted: PermissionSet = ["students.read", "students.create"].into_iter().collect();
        assert!(authorize(&granted, Perm::StudentsRead).is_ok());
    }

    #[test]
    fn test_missing_permission_is_forbidden() {
        let granted: PermissionSet = ["students.read"].into_iter().collect();
        assert!(matches!(
            authorize(&granted, Perm::StudentsDelete),
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            authorize(&PermissionSet::new(), Perm::StudentsRead),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn test_principal_require() {
        let principal = Principal {
            id: Uuid::new_v4(),
            username: "admin".into(),
            permissions: ["roles.manage"].into_iter().collect(),
        };
        assert!(principal.require(Perm::RolesManage).is_ok());
        assert!(principal.require(Perm::UsersManage).is_err());
    }
}
