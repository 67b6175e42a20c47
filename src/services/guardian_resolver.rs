//! Resolves a student's guardian pointer into a uniform `GuardianInfo`.

use std::sync::Arc;

use crate::config::PARENT_RELATIONSHIP_LABEL;
use crate::domain::{GuardianInfo, GuardianKind, GuardianRef};
use crate::errors::{AppError, AppResult};
use crate::infra::UnitOfWork;

pub struct GuardianResolver<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> GuardianResolver<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }

    /// Load the record behind `guardian`.
    ///
    /// # Errors
    /// A pointer whose target row is gone is a data-integrity failure and
    /// yields `AppError::Internal`.
    pub async fn resolve(&self, guardian: GuardianRef) -> AppResult<Option<GuardianInfo>> {
        let Some((kind, id)) = guardian.target() else {
            return Ok(None);
        };

        let info = match kind {
            GuardianKind::Parent => self.uow.parents().find_by_id(id).await?.map(|p| GuardianInfo {
                id: p.id,
                full_name: p.full_name,
                phone: p.phone,
                email: p.email,
                kind,
                relationship: PARENT_RELATIONSHIP_LABEL.to_string(),
            }),
            GuardianKind::Guardian => {
                self.uow.guardians().find_by_id(id).await?.map(|g| GuardianInfo {
                    id: g.id,
                    full_name: g.full_name,
                    phone: g.phone,
                    email: g.email,
                    kind,
                    relationship: g.relationship_to_student,
                })
            }
        };

        match info {
            Some(info) => Ok(Some(info)),
            None => {
                tracing::error!(guardian_id = %id, kind = %kind, "Dangling guardian pointer");
                Err(AppError::internal(format!(
                    "guardian pointer references missing {} {}",
                    kind, id
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    use crate::domain::{Guardian, Parent};
    use crate::infra::{
        GuardianRepository, MockGuardianRepository, MockParentRepository, MockUnitOfWork,
        ParentRepository,
    };

    fn resolver(
        parents: MockParentRepository,
        guardians: MockGuardianRepository,
    ) -> GuardianResolver<MockUnitOfWork> {
        let parents: Arc<dyn ParentRepository> = Arc::new(parents);
        let guardians: Arc<dyn GuardianRepository> = Arc::new(guardians);
        let mut uow = MockUnitOfWork::new();
        uow.expect_parents().returning(move || parents.clone());
        uow.expect_guardians().returning(move || guardians.clone());
        GuardianResolver::new(Arc::new(uow))
    }

    fn guardian(id: Uuid) -> Guardian {
        Guardian {
            id,
            full_name: "Budi Santoso".into(),
            nik: "ciphertext".into(),
            nik_hash: "hash".into(),
            phone: Some("0812".into()),
            email: None,
            relationship_to_student: "UNCLE".into(),
            address: None,
            user_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn parent(id: Uuid) -> Parent {
        Parent {
            id,
            full_name: "Rina Wati".into(),
            nik: "ciphertext".into(),
            nik_hash: "hash".into(),
            phone: None,
            email: Some("rina@example.com".into()),
            occupation: None,
            address: None,
            user_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_none_resolves_to_none_without_lookups() {
        let info = resolver(MockParentRepository::new(), MockGuardianRepository::new())
            .resolve(GuardianRef::None)
            .await
            .unwrap();
        assert!(info.is_none());
    }

    #[tokio::test]
    async fn test_parent_uses_fixed_relationship_label() {
        let id = Uuid::new_v4();
        let mut parents = MockParentRepository::new();
        parents
            .expect_find_by_id()
            .returning(|id| Ok(Some(parent(id))));

        let info = resolver(parents, MockGuardianRepository::new())
            .resolve(GuardianRef::Parent(id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(info.id, id);
        assert_eq!(info.kind, GuardianKind::Parent);
        assert_eq!(info.relationship, "PARENT");
        assert_eq!(info.email.as_deref(), Some("rina@example.com"));
    }

    #[tokio::test]
    async fn test_guardian_uses_own_relationship() {
        let id = Uuid::new_v4();
        let mut guardians = MockGuardianRepository::new();
        guardians
            .expect_find_by_id()
            .returning(|id| Ok(Some(guardian(id))));

        let info = resolver(MockParentRepository::new(), guardians)
            .resolve(GuardianRef::Guardian(id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(info.kind, GuardianKind::Guardian);
        assert_eq!(info.relationship, "UNCLE");
    }

    #[tokio::test]
    async fn test_missing_target_is_internal() {
        let mut guardians = MockGuardianRepository::new();
        guardians.expect_find_by_id().returning(|_| Ok(None));

        let err = resolver(MockParentRepository::new(), guardians)
            .resolve(GuardianRef::Guardian(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
