//! Student records, their guardian pointer and their linked parents.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use super::guardian_resolver::GuardianResolver;
use super::records::{
    ensure_account_free, ensure_unclaimed, ensure_user_exists, parent_view, seal_nik,
};
use crate::domain::identity::{normalize_national_id, normalize_relationship, require_text};
use crate::domain::{
    GuardianInfo, GuardianKind, GuardianRef, LinkedParentView, NewStudent, ParentLink, Student,
    StudentPatch, StudentView,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{FieldCipher, UnitOfWork};
use crate::types::PaginationParams;

#[async_trait]
pub trait StudentService: Send + Sync {
    async fn list_students(&self, params: PaginationParams) -> AppResult<(Vec<StudentView>, u64)>;

    async fn get_student(&self, id: Uuid) -> AppResult<StudentView>;

    /// The student record linked to the given account.
    async fn student_for_user(&self, user_id: Uuid) -> AppResult<StudentView>;

    async fn create_student(&self, input: NewStudent) -> AppResult<StudentView>;

    async fn update_student(&self, id: Uuid, patch: StudentPatch) -> AppResult<StudentView>;

    async fn delete_student(&self, id: Uuid) -> AppResult<()>;

    /// Link the student record to a login account.
    async fn link_user(&self, id: Uuid, user_id: Uuid) -> AppResult<StudentView>;

    /// Point the student at a parent or guardian record.
    async fn set_guardian(
        &self,
        id: Uuid,
        guardian_id: Uuid,
        kind: GuardianKind,
    ) -> AppResult<StudentView>;

    /// Clear the guardian pointer. Succeeds when none is set.
    async fn remove_guardian(&self, id: Uuid) -> AppResult<StudentView>;

    async fn guardian_of(&self, id: Uuid) -> AppResult<Option<GuardianInfo>>;

    /// Replace the student's parent links with exactly `links`.
    async fn sync_parents(
        &self,
        id: Uuid,
        links: Vec<ParentLink>,
    ) -> AppResult<Vec<LinkedParentView>>;

    async fn parents_of(&self, id: Uuid) -> AppResult<Vec<LinkedParentView>>;
}

pub struct StudentManager<U: UnitOfWork> {
    uow: Arc<U>,
    cipher: Arc<FieldCipher>,
    resolver: GuardianResolver<U>,
}

impl<U: UnitOfWork> StudentManager<U> {
    pub fn new(uow: Arc<U>, cipher: Arc<FieldCipher>) -> Self {
        Self {
            resolver: GuardianResolver::new(uow.clone()),
            uow,
            cipher,
        }
    }

    async fn load(&self, id: Uuid) -> AppResult<Student> {
        self.uow
            .students()
            .find_by_id(id)
            .await?
            .ok_or_not_found("Student")
    }

    async fn view(&self, s: Student) -> AppResult<StudentView> {
        let guardian = self.resolver.resolve(s.guardian).await?;
        Ok(StudentView {
            id: s.id,
            nik: self.cipher.reveal(&s.nik),
            no_kk: self.cipher.reveal_opt(s.no_kk.as_deref()),
            nisn: s.nisn,
            full_name: s.full_name,
            gender: s.gender,
            birth_place: s.birth_place,
            birth_date: s.birth_date,
            address: s.address,
            guardian,
            user_id: s.user_id,
            created_at: s.created_at,
            updated_at: s.updated_at,
        })
    }

    async fn check_nisn(&self, nisn: &str, current: Option<Uuid>) -> AppResult<()> {
        let found = self.uow.students().find_by_nisn(nisn).await?;
        ensure_unclaimed(found.map(|s| s.id), current, "NISN")
    }

    async fn check_account(&self, user_id: Uuid, current: Option<Uuid>) -> AppResult<()> {
        ensure_user_exists(self.uow.users().as_ref(), user_id).await?;
        let linked = self.uow.students().find_by_user_id(user_id).await?;
        ensure_account_free(linked.map(|s| s.id), current, "student")
    }

    fn seal_family_card(&self, raw: &str) -> AppResult<String> {
        let no_kk = normalize_national_id("no_kk", raw)?;
        Ok(self.cipher.encrypt(&no_kk)?)
    }
}

#[async_trait]
impl<U: UnitOfWork> StudentService for StudentManager<U> {
    async fn list_students(&self, params: PaginationParams) -> AppResult<(Vec<StudentView>, u64)> {
        let (students, total) = self.uow.students().list(params).await?;
        let mut views = Vec::with_capacity(students.len());
        for student in students {
            views.push(self.view(student).await?);
        }
        Ok((views, total))
    }

    async fn get_student(&self, id: Uuid) -> AppResult<StudentView> {
        let student = self.load(id).await?;
        self.view(student).await
    }

    async fn student_for_user(&self, user_id: Uuid) -> AppResult<StudentView> {
        let student = self
            .uow
            .students()
            .find_by_user_id(user_id)
            .await?
            .ok_or_not_found("Student")?;
        self.view(student).await
    }

    async fn create_student(&self, input: NewStudent) -> AppResult<StudentView> {
        let nisn = require_text("nisn", &input.nisn)?;
        let full_name = require_text("full_name", &input.full_name)?;
        let nik = seal_nik(&self.cipher, "nik", &input.nik)?;
        let no_kk = input
            .no_kk
            .as_deref()
            .map(|raw| self.seal_family_card(raw))
            .transpose()?;

        self.check_nisn(&nisn, None).await?;
        let students = self.uow.students();
        let duplicate = students.find_by_nik_hash(&nik.blind_index).await?;
        ensure_unclaimed(duplicate.map(|s| s.id), None, "NIK")?;
        if let Some(user_id) = input.user_id {
            self.check_account(user_id, None).await?;
        }

        let now = Utc::now();
        let student = students
            .create(Student {
                id: Uuid::new_v4(),
                nisn,
                full_name,
                gender: input.gender,
                birth_place: input.birth_place,
                birth_date: input.birth_date,
                address: input.address,
                nik: nik.ciphertext,
                nik_hash: nik.blind_index,
                no_kk,
                guardian: GuardianRef::None,
                user_id: input.user_id,
                created_at: now,
                updated_at: now,
            })
            .await?;

        tracing::info!(student_id = %student.id, "Student created");
        self.view(student).await
    }

    async fn update_student(&self, id: Uuid, mut patch: StudentPatch) -> AppResult<StudentView> {
        let mut student = self.load(id).await?;

        if let Some(nisn) = patch.nisn.take() {
            let nisn = require_text("nisn", &nisn)?;
            self.check_nisn(&nisn, Some(id)).await?;
            patch.nisn = Some(nisn);
        }
        if let Some(full_name) = patch.full_name.take() {
            patch.full_name = Some(require_text("full_name", &full_name)?);
        }
        if let Some(raw) = patch.nik.as_deref() {
            let nik = seal_nik(&self.cipher, "nik", raw)?;
            let duplicate = self.uow.students().find_by_nik_hash(&nik.blind_index).await?;
            ensure_unclaimed(duplicate.map(|s| s.id), Some(id), "NIK")?;
            student.nik = nik.ciphertext;
            student.nik_hash = nik.blind_index;
        }
        if let Some(raw) = patch.no_kk.as_deref() {
            student.no_kk = Some(self.seal_family_card(raw)?);
        }

        student.apply(&patch);
        let student = self.uow.students().update(student).await?;
        self.view(student).await
    }

    async fn delete_student(&self, id: Uuid) -> AppResult<()> {
        self.uow.students().delete(id).await?;
        tracing::info!(student_id = %id, "Student deleted");
        Ok(())
    }

    async fn link_user(&self, id: Uuid, user_id: Uuid) -> AppResult<StudentView> {
        let mut student = self.load(id).await?;
        self.check_account(user_id, Some(id)).await?;

        student.user_id = Some(user_id);
        student.updated_at = Utc::now();
        let student = self.uow.students().update(student).await?;
        self.view(student).await
    }

    async fn set_guardian(
        &self,
        id: Uuid,
        guardian_id: Uuid,
        kind: GuardianKind,
    ) -> AppResult<StudentView> {
        let student = self
            .uow
            .students()
            .set_guardian(id, GuardianRef::new(kind, guardian_id))
            .await?;

        tracing::info!(student_id = %id, guardian_id = %guardian_id, kind = %kind, "Guardian set");
        self.view(student).await
    }

    async fn remove_guardian(&self, id: Uuid) -> AppResult<StudentView> {
        let student = self.load(id).await?;
        if !student.guardian.is_set() {
            return self.view(student).await;
        }

        let student = self
            .uow
            .students()
            .set_guardian(id, GuardianRef::None)
            .await?;
        tracing::info!(student_id = %id, "Guardian removed");
        self.view(student).await
    }

    async fn guardian_of(&self, id: Uuid) -> AppResult<Option<GuardianInfo>> {
        let student = self.load(id).await?;
        self.resolver.resolve(student.guardian).await
    }

    async fn sync_parents(
        &self,
        id: Uuid,
        links: Vec<ParentLink>,
    ) -> AppResult<Vec<LinkedParentView>> {
        let mut seen = HashSet::with_capacity(links.len());
        let mut normalized = Vec::with_capacity(links.len());
        for link in links {
            if !seen.insert(link.parent_id) {
                return Err(AppError::bad_request(format!(
                    "duplicate parent_id {}",
                    link.parent_id
                )));
            }
            normalized.push(ParentLink {
                parent_id: link.parent_id,
                relationship_type: normalize_relationship(
                    "relationship_type",
                    &link.relationship_type,
                )?,
            });
        }

        let count = normalized.len();
        self.uow.students().sync_parents(id, normalized).await?;
        tracing::info!(student_id = %id, parents = count, "Parent links replaced");

        self.parents_of(id).await
    }

    async fn parents_of(&self, id: Uuid) -> AppResult<Vec<LinkedParentView>> {
        self.load(id).await?;
        let linked = self.uow.students().parents_of(id).await?;
        Ok(linked
            .into_iter()
            .map(|(parent, relationship_type)| LinkedParentView {
                parent: parent_view(&self.cipher, parent),
                relationship_type,
            })
            .collect())
    }
}
