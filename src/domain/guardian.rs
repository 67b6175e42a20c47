//! Polymorphic guardian reference.
//!
//! A student's legal guardian lives either in the parents table or in the
//! guardians table. Storage keeps a `(guardian_id, guardian_type)` column
//! pair; inside the application it is always a `GuardianRef`, so the
//! half-set and unknown-tag states cannot be represented.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{GUARDIAN_TYPE_GUARDIAN, GUARDIAN_TYPE_PARENT};
use crate::errors::{AppError, AppResult};

/// Table a guardian reference points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardianKind {
    Parent,
    Guardian,
}

impl GuardianKind {
    pub const fn tag(self) -> &'static str {
        match self {
            GuardianKind::Parent => GUARDIAN_TYPE_PARENT,
            GuardianKind::Guardian => GUARDIAN_TYPE_GUARDIAN,
        }
    }
}

impl fmt::Display for GuardianKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for GuardianKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            GUARDIAN_TYPE_PARENT => Ok(GuardianKind::Parent),
            GUARDIAN_TYPE_GUARDIAN => Ok(GuardianKind::Guardian),
            other => Err(AppError::bad_request(format!(
                "guardian_type must be '{}' or '{}', got '{}'",
                GUARDIAN_TYPE_PARENT, GUARDIAN_TYPE_GUARDIAN, other
            ))),
        }
    }
}

/// A student's guardian pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GuardianRef {
    #[default]
    None,
    Parent(Uuid),
    Guardian(Uuid),
}

impl GuardianRef {
    pub fn new(kind: GuardianKind, id: Uuid) -> Self {
        match kind {
            GuardianKind::Parent => GuardianRef::Parent(id),
            GuardianKind::Guardian => GuardianRef::Guardian(id),
        }
    }

    /// Rebuild from the stored column pair.
    ///
    /// # Errors
    /// A half-set pair or an unknown tag is a data-integrity failure and
    /// yields `AppError::Internal`.
    pub fn from_columns(id: Option<Uuid>, tag: Option<&str>) -> AppResult<Self> {
        match (id, tag) {
            (None, None) => Ok(GuardianRef::None),
            (Some(id), Some(GUARDIAN_TYPE_PARENT)) => Ok(GuardianRef::Parent(id)),
            (Some(id), Some(GUARDIAN_TYPE_GUARDIAN)) => Ok(GuardianRef::Guardian(id)),
            (Some(id), Some(other)) => Err(AppError::internal(format!(
                "guardian {} carries unknown guardian_type '{}'",
                id, other
            ))),
            (id, tag) => Err(AppError::internal(format!(
                "half-set guardian pointer (guardian_id={:?}, guardian_type={:?})",
                id, tag
            ))),
        }
    }

    /// Column pair to store; both `None` when no guardian is set.
    pub fn to_columns(self) -> (Option<Uuid>, Option<String>) {
        match self.target() {
            Some((kind, id)) => (Some(id), Some(kind.tag().to_string())),
            None => (None, None),
        }
    }

    pub fn target(self) -> Option<(GuardianKind, Uuid)> {
        match self {
            GuardianRef::None => None,
            GuardianRef::Parent(id) => Some((GuardianKind::Parent, id)),
            GuardianRef::Guardian(id) => Some((GuardianKind::Guardian, id)),
        }
    }

    pub fn is_set(self) -> bool {
        !matches!(self, GuardianRef::None)
    }
}

/// Guardian details normalised across both target tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardianInfo {
    pub id: Uuid,
    pub full_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "type")]
    pub kind: GuardianKind,
    pub relationship: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parses_tags() {
        assert_eq!("parent".parse::<GuardianKind>().unwrap(), GuardianKind::Parent);
        assert_eq!(
            "guardian".parse::<GuardianKind>().unwrap(),
            GuardianKind::Guardian
        );
        assert!(matches!(
            "uncle".parse::<GuardianKind>(),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_columns_round_trip() {
        let id = Uuid::new_v4();
        for guardian in [GuardianRef::None, GuardianRef::Parent(id), GuardianRef::Guardian(id)] {
            let (col_id, col_tag) = guardian.to_columns();
            assert_eq!(
                GuardianRef::from_columns(col_id, col_tag.as_deref()).unwrap(),
                guardian
            );
        }
    }

    #[test]
    fn test_half_set_pair_is_integrity_error() {
        let id = Uuid::new_v4();
        assert!(matches!(
            GuardianRef::from_columns(Some(id), None),
            Err(AppError::Internal(_))
        ));
        assert!(matches!(
            GuardianRef::from_columns(None, Some("parent")),
            Err(AppError::Internal(_))
        ));
    }

    #[test]
    fn test_unknown_tag_is_integrity_error() {
        assert!(matches!(
            GuardianRef::from_columns(Some(Uuid::new_v4()), Some("teacher")),
            Err(AppError::Internal(_))
        ));
    }

    #[test]
    fn test_guardian_info_serializes_type_field() {
        let info = GuardianInfo {
            id: Uuid::nil(),
            full_name: "Budi".to_string(),
            phone: None,
            email: None,
            kind: GuardianKind::Guardian,
            relationship: "UNCLE".to_string(),
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["type"], "guardian");
        assert_eq!(json["relationship"], "UNCLE");
    }
}
