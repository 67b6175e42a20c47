use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use super::records::{
    apply_person_patch, employee_view, ensure_account_free, ensure_unclaimed, ensure_user_exists,
    seal_nik,
};
use crate::domain::identity::require_text;
use crate::domain::{Employee, EmployeePatch, EmployeeView, NewEmployee};
use crate::errors::{AppResult, OptionExt};
use crate::infra::{FieldCipher, UnitOfWork};
use crate::types::PaginationParams;

#[async_trait]
pub trait EmployeeService: Send + Sync {
    async fn list_employees(&self, params: PaginationParams)
        -> AppResult<(Vec<EmployeeView>, u64)>;

    async fn get_employee(&self, id: Uuid) -> AppResult<EmployeeView>;

    async fn create_employee(&self, input: NewEmployee) -> AppResult<EmployeeView>;

    async fn update_employee(&self, id: Uuid, patch: EmployeePatch) -> AppResult<EmployeeView>;

    async fn delete_employee(&self, id: Uuid) -> AppResult<()>;
}

pub struct EmployeeManager<U: UnitOfWork> {
    uow: Arc<U>,
    cipher: Arc<FieldCipher>,
}

impl<U: UnitOfWork> EmployeeManager<U> {
    pub fn new(uow: Arc<U>, cipher: Arc<FieldCipher>) -> Self {
        Self { uow, cipher }
    }

    /// NIP is optional but unique when given.
    async fn check_nip(&self, nip: &str, current: Option<Uuid>) -> AppResult<String> {
        let nip = require_text("nip", nip)?;
        let found = self.uow.employees().find_by_nip(&nip).await?;
        ensure_unclaimed(found.map(|e| e.id), current, "NIP")?;
        Ok(nip)
    }

    async fn check_account(&self, user_id: Uuid, current: Option<Uuid>) -> AppResult<()> {
        ensure_user_exists(self.uow.users().as_ref(), user_id).await?;
        let linked = self.uow.employees().find_by_user_id(user_id).await?;
        ensure_account_free(linked.map(|e| e.id), current, "employee")
    }
}

#[async_trait]
impl<U: UnitOfWork> EmployeeService for EmployeeManager<U> {
    async fn list_employees(
        &self,
        params: PaginationParams,
    ) -> AppResult<(Vec<EmployeeView>, u64)> {
        let (employees, total) = self.uow.employees().list(params).await?;
        let views = employees
            .into_iter()
            .map(|e| employee_view(&self.cipher, e))
            .collect();
        Ok((views, total))
    }

    async fn get_employee(&self, id: Uuid) -> AppResult<EmployeeView> {
        let employee = self
            .uow
            .employees()
            .find_by_id(id)
            .await?
            .ok_or_not_found("Employee")?;
        Ok(employee_view(&self.cipher, employee))
    }

    async fn create_employee(&self, input: NewEmployee) -> AppResult<EmployeeView> {
        let person = input.person;
        let full_name = require_text("full_name", &person.full_name)?;
        let nik = seal_nik(&self.cipher, "nik", &person.nik)?;

        let employees = self.uow.employees();
        let duplicate = employees.find_by_nik_hash(&nik.blind_index).await?;
        ensure_unclaimed(duplicate.map(|e| e.id), None, "NIK")?;
        let nip = match input.nip.as_deref() {
            Some(nip) => Some(self.check_nip(nip, None).await?),
            None => None,
        };
        if let Some(user_id) = person.user_id {
            self.check_account(user_id, None).await?;
        }

        let now = Utc::now();
        let employee = employees
            .create(Employee {
                id: Uuid::new_v4(),
                full_name,
                nik: nik.ciphertext,
                nik_hash: nik.blind_index,
                nip,
                position: input.position,
                phone: person.phone,
                email: person.email,
                address: person.address,
                user_id: person.user_id,
                created_at: now,
                updated_at: now,
            })
            .await?;

        tracing::info!(employee_id = %employee.id, "Employee created");
        Ok(employee_view(&self.cipher, employee))
    }

    async fn update_employee(&self, id: Uuid, patch: EmployeePatch) -> AppResult<EmployeeView> {
        let employees = self.uow.employees();
        let mut employee = employees.find_by_id(id).await?.ok_or_not_found("Employee")?;

        if let Some(raw) = patch.person.nik.as_deref() {
            let nik = seal_nik(&self.cipher, "nik", raw)?;
            let duplicate = employees.find_by_nik_hash(&nik.blind_index).await?;
            ensure_unclaimed(duplicate.map(|e| e.id), Some(id), "NIK")?;
            employee.nik = nik.ciphertext;
            employee.nik_hash = nik.blind_index;
        }
        if let Some(nip) = patch.nip.as_deref() {
            employee.nip = Some(self.check_nip(nip, Some(id)).await?);
        }
        apply_person_patch(
            &patch.person,
            &mut employee.full_name,
            &mut employee.phone,
            &mut employee.email,
            &mut employee.address,
        )?;
        if let Some(position) = patch.position {
            employee.position = Some(position);
        }

        let employee = employees.update(employee).await?;
        Ok(employee_view(&self.cipher, employee))
    }

    async fn delete_employee(&self, id: Uuid) -> AppResult<()> {
        self.uow.employees().delete(id).await?;
        tracing::info!(employee_id = %id, "Employee deleted");
        Ok(())
    }
}
