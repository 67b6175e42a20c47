//! Non-parent guardians (uncles, grandparents, foster carers...).

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use super::records::{
    apply_person_patch, ensure_account_free, ensure_unclaimed, ensure_user_exists, guardian_view,
    seal_nik,
};
use crate::domain::identity::{normalize_relationship, require_text};
use crate::domain::{Guardian, GuardianPatch, GuardianView, NewGuardian};
use crate::errors::{AppResult, OptionExt};
use crate::infra::{FieldCipher, UnitOfWork};
use crate::types::PaginationParams;

#[async_trait]
pub trait GuardianService: Send + Sync {
    async fn list_guardians(&self, params: PaginationParams)
        -> AppResult<(Vec<GuardianView>, u64)>;

    async fn get_guardian(&self, id: Uuid) -> AppResult<GuardianView>;

    async fn create_guardian(&self, input: NewGuardian) -> AppResult<GuardianView>;

    async fn update_guardian(&self, id: Uuid, patch: GuardianPatch) -> AppResult<GuardianView>;

    /// Fails with `Conflict` while the guardian is some student's guardian.
    async fn delete_guardian(&self, id: Uuid) -> AppResult<()>;
}

pub struct GuardianManager<U: UnitOfWork> {
    uow: Arc<U>,
    cipher: Arc<FieldCipher>,
}

impl<U: UnitOfWork> GuardianManager<U> {
    pub fn new(uow: Arc<U>, cipher: Arc<FieldCipher>) -> Self {
        Self { uow, cipher }
    }

    async fn check_account(&self, user_id: Uuid, current: Option<Uuid>) -> AppResult<()> {
        ensure_user_exists(self.uow.users().as_ref(), user_id).await?;
        let linked = self.uow.guardians().find_by_user_id(user_id).await?;
        ensure_account_free(linked.map(|g| g.id), current, "guardian")
    }
}

#[async_trait]
impl<U: UnitOfWork> GuardianService for GuardianManager<U> {
    async fn list_guardians(
        &self,
        params: PaginationParams,
    ) -> AppResult<(Vec<GuardianView>, u64)> {
        let (guardians, total) = self.uow.guardians().list(params).await?;
        let views = guardians
            .into_iter()
            .map(|g| guardian_view(&self.cipher, g))
            .collect();
        Ok((views, total))
    }

    async fn get_guardian(&self, id: Uuid) -> AppResult<GuardianView> {
        let guardian = self
            .uow
            .guardians()
            .find_by_id(id)
            .await?
            .ok_or_not_found("Guardian")?;
        Ok(guardian_view(&self.cipher, guardian))
    }

    async fn create_guardian(&self, input: NewGuardian) -> AppResult<GuardianView> {
        let person = input.person;
        let full_name = require_text("full_name", &person.full_name)?;
        let relationship =
            normalize_relationship("relationship_to_student", &input.relationship_to_student)?;
        let nik = seal_nik(&self.cipher, "nik", &person.nik)?;

        let guardians = self.uow.guardians();
        let duplicate = guardians.find_by_nik_hash(&nik.blind_index).await?;
        ensure_unclaimed(duplicate.map(|g| g.id), None, "NIK")?;
        if let Some(user_id) = person.user_id {
            self.check_account(user_id, None).await?;
        }

        let now = Utc::now();
        let guardian = guardians
            .create(Guardian {
                id: Uuid::new_v4(),
                full_name,
                nik: nik.ciphertext,
                nik_hash: nik.blind_index,
                phone: person.phone,
                email: person.email,
                relationship_to_student: relationship,
                address: person.address,
                user_id: person.user_id,
                created_at: now,
                updated_at: now,
            })
            .await?;

        tracing::info!(guardian_id = %guardian.id, "Guardian created");
        Ok(guardian_view(&self.cipher, guardian))
    }

    async fn update_guardian(&self, id: Uuid, patch: GuardianPatch) -> AppResult<GuardianView> {
        let guardians = self.uow.guardians();
        let mut guardian = guardians.find_by_id(id).await?.ok_or_not_found("Guardian")?;

        if let Some(raw) = patch.person.nik.as_deref() {
            let nik = seal_nik(&self.cipher, "nik", raw)?;
            let duplicate = guardians.find_by_nik_hash(&nik.blind_index).await?;
            ensure_unclaimed(duplicate.map(|g| g.id), Some(id), "NIK")?;
            guardian.nik = nik.ciphertext;
            guardian.nik_hash = nik.blind_index;
        }
        apply_person_patch(
            &patch.person,
            &mut guardian.full_name,
            &mut guardian.phone,
            &mut guardian.email,
            &mut guardian.address,
        )?;
        if let Some(relationship) = patch.relationship_to_student.as_deref() {
            guardian.relationship_to_student =
                normalize_relationship("relationship_to_student", relationship)?;
        }

        let guardian = guardians.update(guardian).await?;
        Ok(guardian_view(&self.cipher, guardian))
    }

    async fn delete_guardian(&self, id: Uuid) -> AppResult<()> {
        self.uow.guardians().delete(id).await?;
        tracing::info!(guardian_id = %id, "Guardian deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PersonInput;
    use crate::errors::AppError;
    use crate::infra::{GuardianRepository, MockGuardianRepository, MockUnitOfWork};
    use crate::services::records::fixtures::cipher;

    fn manager(guardians: MockGuardianRepository) -> GuardianManager<MockUnitOfWork> {
        let guardians: Arc<dyn GuardianRepository> = Arc::new(guardians);
        let mut uow = MockUnitOfWork::new();
        uow.expect_guardians().returning(move || guardians.clone());
        GuardianManager::new(Arc::new(uow), Arc::new(cipher()))
    }

    fn input(relationship: &str) -> NewGuardian {
        NewGuardian {
            person: PersonInput {
                full_name: "Budi Santoso".into(),
                nik: "3201010101010003".into(),
                ..Default::default()
            },
            relationship_to_student: relationship.into(),
        }
    }

    #[tokio::test]
    async fn test_relationship_is_upper_cased_on_create() {
        let mut guardians = MockGuardianRepository::new();
        guardians.expect_find_by_nik_hash().returning(|_| Ok(None));
        guardians
            .expect_create()
            .withf(|g| g.relationship_to_student == "GRANDMOTHER")
            .returning(|g| Ok(g));

        let view = manager(guardians)
            .create_guardian(input("grandmother"))
            .await
            .unwrap();
        assert_eq!(view.relationship_to_student, "GRANDMOTHER");
    }

    #[tokio::test]
    async fn test_blank_relationship_is_rejected() {
        let mut guardians = MockGuardianRepository::new();
        guardians.expect_create().never();

        let err = manager(guardians).create_guardian(input("  ")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_missing_guardian_is_not_found() {
        let mut guardians = MockGuardianRepository::new();
        guardians.expect_find_by_id().returning(|_| Ok(None));

        let err = manager(guardians).get_guardian(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("Guardian")));
    }
}
