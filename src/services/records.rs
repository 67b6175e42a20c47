//! Helpers shared by the people-record services: NIK sealing, account
//! links and the decrypted views handed back to callers.

use uuid::Uuid;

use crate::domain::identity::{normalize_national_id, require_text};
use crate::domain::{
    Employee, EmployeeView, Guardian, GuardianView, Parent, ParentView, PersonPatch,
};
use crate::errors::{AppError, AppResult};
use crate::infra::{FieldCipher, SealedField, UserRepository};

/// Validate and seal a national identity number.
pub(crate) fn seal_nik(cipher: &FieldCipher, field: &str, raw: &str) -> AppResult<SealedField> {
    let nik = normalize_national_id(field, raw)?;
    Ok(cipher.seal(&nik)?)
}

/// Fail with `Conflict` when `found` is a record other than `current`.
///
/// `found` is the result of a unique lookup (blind index, NISN, NIP...).
pub(crate) fn ensure_unclaimed(
    found: Option<Uuid>,
    current: Option<Uuid>,
    what: &str,
) -> AppResult<()> {
    match found {
        Some(other) if Some(other) != current => Err(AppError::already_exists(what)),
        _ => Ok(()),
    }
}

/// The linked account must exist.
pub(crate) async fn ensure_user_exists(users: &dyn UserRepository, user_id: Uuid) -> AppResult<()> {
    if users.exists(user_id).await? {
        Ok(())
    } else {
        Err(AppError::NotFound("User"))
    }
}

/// One account links to at most one record per table.
pub(crate) fn ensure_account_free(
    linked: Option<Uuid>,
    current: Option<Uuid>,
    entity: &str,
) -> AppResult<()> {
    match linked {
        Some(other) if Some(other) != current => Err(AppError::conflict(format!(
            "user is already linked to another {}",
            entity
        ))),
        _ => Ok(()),
    }
}

/// Copy the plain fields of a person patch; NIK is handled by the caller.
pub(crate) fn apply_person_patch(
    patch: &PersonPatch,
    full_name: &mut String,
    phone: &mut Option<String>,
    email: &mut Option<String>,
    address: &mut Option<String>,
) -> AppResult<()> {
    if let Some(name) = &patch.full_name {
        *full_name = require_text("full_name", name)?;
    }
    if let Some(value) = &patch.phone {
        *phone = Some(value.clone());
    }
    if let Some(value) = &patch.email {
        *email = Some(value.clone());
    }
    if let Some(value) = &patch.address {
        *address = Some(value.clone());
    }
    Ok(())
}

pub(crate) fn parent_view(cipher: &FieldCipher, p: Parent) -> ParentView {
    ParentView {
        id: p.id,
        nik: cipher.reveal(&p.nik),
        full_name: p.full_name,
        phone: p.phone,
        email: p.email,
        occupation: p.occupation,
        address: p.address,
        user_id: p.user_id,
        created_at: p.created_at,
    }
}

pub(crate) fn guardian_view(cipher: &FieldCipher, g: Guardian) -> GuardianView {
    GuardianView {
        id: g.id,
        nik: cipher.reveal(&g.nik),
        full_name: g.full_name,
        phone: g.phone,
        email: g.email,
        relationship_to_student: g.relationship_to_student,
        address: g.address,
        user_id: g.user_id,
        created_at: g.created_at,
    }
}

pub(crate) fn employee_view(cipher: &FieldCipher, e: Employee) -> EmployeeView {
    EmployeeView {
        id: e.id,
        nik: cipher.reveal(&e.nik),
        full_name: e.full_name,
        nip: e.nip,
        position: e.position,
        phone: e.phone,
        email: e.email,
        address: e.address,
        user_id: e.user_id,
        created_at: e.created_at,
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_seal_nik_rejects_malformed_input() {
        let cipher = fixtures::cipher();
        assert!(matches!(
            seal_nik(&cipher, "nik", "12345"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_seal_nik_indexes_trimmed_value() {
        let cipher = fixtures::cipher();
        let sealed = seal_nik(&cipher, "nik", " 3201010101010001 ").unwrap();
        assert_eq!(sealed.blind_index, cipher.blind_index("3201010101010001"));
        assert_eq!(cipher.decrypt(&sealed.ciphertext).unwrap(), "3201010101010001");
    }

    #[test]
    fn test_ensure_unclaimed_ignores_self() {
        let me = Uuid::new_v4();
        assert!(ensure_unclaimed(Some(me), Some(me), "Parent").is_ok());
        assert!(ensure_unclaimed(None, Some(me), "Parent").is_ok());
        assert!(matches!(
            ensure_unclaimed(Some(Uuid::new_v4()), Some(me), "Parent"),
            Err(AppError::Conflict(_))
        ));
        assert!(ensure_unclaimed(Some(me), None, "Parent").is_err());
    }

    #[test]
    fn test_corrupt_nik_shows_sentinel() {
        let cipher = fixtures::cipher();
        let view = parent_view(
            &cipher,
            Parent {
                id: Uuid::new_v4(),
                full_name: "Rina".into(),
                nik: "not-base64!!".into(),
                nik_hash: "x".into(),
                phone: None,
                email: None,
                occupation: None,
                address: None,
                user_id: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        );
        assert_eq!(view.nik, crate::config::DECRYPTION_ERROR_SENTINEL);
    }
}
