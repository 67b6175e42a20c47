use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use super::records::{
    apply_person_patch, ensure_account_free, ensure_unclaimed, ensure_user_exists, parent_view,
    seal_nik,
};
use crate::domain::identity::require_text;
use crate::domain::{NewParent, Parent, ParentPatch, ParentView};
use crate::errors::{AppResult, OptionExt};
use crate::infra::{FieldCipher, UnitOfWork};
use crate::types::PaginationParams;

#[async_trait]
pub trait ParentService: Send + Sync {
    async fn list_parents(&self, params: PaginationParams) -> AppResult<(Vec<ParentView>, u64)>;

    async fn get_parent(&self, id: Uuid) -> AppResult<ParentView>;

    async fn create_parent(&self, input: NewParent) -> AppResult<ParentView>;

    async fn update_parent(&self, id: Uuid, patch: ParentPatch) -> AppResult<ParentView>;

    /// Fails with `Conflict` while the parent is some student's guardian.
    async fn delete_parent(&self, id: Uuid) -> AppResult<()>;
}

pub struct ParentManager<U: UnitOfWork> {
    uow: Arc<U>,
    cipher: Arc<FieldCipher>,
}

impl<U: UnitOfWork> ParentManager<U> {
    pub fn new(uow: Arc<U>, cipher: Arc<FieldCipher>) -> Self {
        Self { uow, cipher }
    }

    async fn check_account(&self, user_id: Uuid, current: Option<Uuid>) -> AppResult<()> {
        ensure_user_exists(self.uow.users().as_ref(), user_id).await?;
        let linked = self.uow.parents().find_by_user_id(user_id).await?;
        ensure_account_free(linked.map(|p| p.id), current, "parent")
    }
}

#[async_trait]
impl<U: UnitOfWork> ParentService for ParentManager<U> {
    async fn list_parents(&self, params: PaginationParams) -> AppResult<(Vec<ParentView>, u64)> {
        let (parents, total) = self.uow.parents().list(params).await?;
        let views = parents
            .into_iter()
            .map(|p| parent_view(&self.cipher, p))
            .collect();
        Ok((views, total))
    }

    async fn get_parent(&self, id: Uuid) -> AppResult<ParentView> {
        let parent = self.uow.parents().find_by_id(id).await?.ok_or_not_found("Parent")?;
        Ok(parent_view(&self.cipher, parent))
    }

    async fn create_parent(&self, input: NewParent) -> AppResult<ParentView> {
        let person = input.person;
        let full_name = require_text("full_name", &person.full_name)?;
        let nik = seal_nik(&self.cipher, "nik", &person.nik)?;

        let parents = self.uow.parents();
        let duplicate = parents.find_by_nik_hash(&nik.blind_index).await?;
        ensure_unclaimed(duplicate.map(|p| p.id), None, "NIK")?;
        if let Some(user_id) = person.user_id {
            self.check_account(user_id, None).await?;
        }

        let now = Utc::now();
        let parent = parents
            .create(Parent {
                id: Uuid::new_v4(),
                full_name,
                nik: nik.ciphertext,
                nik_hash: nik.blind_index,
                phone: person.phone,
                email: person.email,
                occupation: input.occupation,
                address: person.address,
                user_id: person.user_id,
                created_at: now,
                updated_at: now,
            })
            .await?;

        tracing::info!(parent_id = %parent.id, "Parent created");
        Ok(parent_view(&self.cipher, parent))
    }

    async fn update_parent(&self, id: Uuid, patch: ParentPatch) -> AppResult<ParentView> {
        let parents = self.uow.parents();
        let mut parent = parents.find_by_id(id).await?.ok_or_not_found("Parent")?;

        if let Some(raw) = patch.person.nik.as_deref() {
            let nik = seal_nik(&self.cipher, "nik", raw)?;
            let duplicate = parents.find_by_nik_hash(&nik.blind_index).await?;
            ensure_unclaimed(duplicate.map(|p| p.id), Some(id), "NIK")?;
            parent.nik = nik.ciphertext;
            parent.nik_hash = nik.blind_index;
        }
        apply_person_patch(
            &patch.person,
            &mut parent.full_name,
            &mut parent.phone,
            &mut parent.email,
            &mut parent.address,
        )?;
        if let Some(occupation) = patch.occupation {
            parent.occupation = Some(occupation);
        }

        let parent = parents.update(parent).await?;
        Ok(parent_view(&self.cipher, parent))
    }

    async fn delete_parent(&self, id: Uuid) -> AppResult<()> {
        self.uow.parents().delete(id).await?;
        tracing::info!(parent_id = %id, "Parent deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PersonInput, PersonPatch};
    use crate::errors::AppError;
    use crate::infra::{MockParentRepository, MockUnitOfWork, MockUserRepository, ParentRepository, UserRepository};
    use crate::services::records::fixtures::cipher;

    const NIK: &str = "3201010101010002";

    fn manager(parents: MockParentRepository, users: MockUserRepository) -> ParentManager<MockUnitOfWork> {
        let parents: Arc<dyn ParentRepository> = Arc::new(parents);
        let users: Arc<dyn UserRepository> = Arc::new(users);
        let mut uow = MockUnitOfWork::new();
        uow.expect_parents().returning(move || parents.clone());
        uow.expect_users().returning(move || users.clone());
        ParentManager::new(Arc::new(uow), Arc::new(cipher()))
    }

    fn stored(id: Uuid, user_id: Option<Uuid>) -> Parent {
        let sealed = cipher().seal(NIK).unwrap();
        Parent {
            id,
            full_name: "Rina Wati".into(),
            nik: sealed.ciphertext,
            nik_hash: sealed.blind_index,
            phone: None,
            email: None,
            occupation: None,
            address: None,
            user_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn input(user_id: Option<Uuid>) -> NewParent {
        NewParent {
            person: PersonInput {
                full_name: "Rina Wati".into(),
                nik: NIK.into(),
                user_id,
                ..Default::default()
            },
            occupation: Some("Teacher".into()),
        }
    }

    #[tokio::test]
    async fn test_account_already_linked_conflicts() {
        let user_id = Uuid::new_v4();
        let mut parents = MockParentRepository::new();
        parents.expect_find_by_nik_hash().returning(|_| Ok(None));
        parents
            .expect_find_by_user_id()
            .returning(move |uid| Ok(Some(stored(Uuid::new_v4(), Some(uid)))));
        parents.expect_create().never();
        let mut users = MockUserRepository::new();
        users.expect_exists().returning(|_| Ok(true));

        let err = manager(parents, users)
            .create_parent(input(Some(user_id)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_create_returns_decrypted_view() {
        let mut parents = MockParentRepository::new();
        parents.expect_find_by_nik_hash().returning(|_| Ok(None));
        parents.expect_create().returning(|p| Ok(p));

        let view = manager(parents, MockUserRepository::new())
            .create_parent(input(None))
            .await
            .unwrap();
        assert_eq!(view.nik, NIK);
        assert_eq!(view.occupation.as_deref(), Some("Teacher"));
    }

    #[tokio::test]
    async fn test_update_to_anothers_nik_conflicts() {
        let id = Uuid::new_v4();
        let mut parents = MockParentRepository::new();
        parents
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored(id, None))));
        parents
            .expect_find_by_nik_hash()
            .returning(|_| Ok(Some(stored(Uuid::new_v4(), None))));
        parents.expect_update().never();

        let err = manager(parents, MockUserRepository::new())
            .update_parent(
                id,
                ParentPatch {
                    person: PersonPatch {
                        nik: Some(NIK.into()),
                        ..Default::default()
                    },
                    occupation: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
