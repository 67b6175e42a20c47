//! Student records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::guardian::{GuardianInfo, GuardianRef};

/// Gender as recorded on enrolment documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "MALE",
            Gender::Female => "FEMALE",
        }
    }

    pub fn from_column(value: &str) -> Option<Self> {
        match value {
            "MALE" => Some(Gender::Male),
            "FEMALE" => Some(Gender::Female),
            _ => None,
        }
    }
}

/// Student as stored: NIK and NoKK hold ciphertext, `nik_hash` the blind index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub id: Uuid,
    pub nisn: String,
    pub full_name: String,
    pub gender: Gender,
    pub birth_place: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub nik: String,
    pub nik_hash: String,
    pub no_kk: Option<String>,
    pub guardian: GuardianRef,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Plaintext input for a new student.
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub nisn: String,
    pub full_name: String,
    pub gender: Gender,
    pub birth_place: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub nik: String,
    pub no_kk: Option<String>,
    pub user_id: Option<Uuid>,
}

/// Partial student update; `None` leaves the field untouched.
///
/// `nik` and `no_kk` are plaintext and get sealed by the service.
#[derive(Debug, Clone, Default)]
pub struct StudentPatch {
    pub nisn: Option<String>,
    pub full_name: Option<String>,
    pub gender: Option<Gender>,
    pub birth_place: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub nik: Option<String>,
    pub no_kk: Option<String>,
}

impl Student {
    /// Apply the plaintext-free part of a patch.
    pub fn apply(&mut self, patch: &StudentPatch) {
        if let Some(nisn) = &patch.nisn {
            self.nisn = nisn.clone();
        }
        if let Some(full_name) = &patch.full_name {
            self.full_name = full_name.clone();
        }
        if let Some(gender) = patch.gender {
            self.gender = gender;
        }
        if let Some(birth_place) = &patch.birth_place {
            self.birth_place = Some(birth_place.clone());
        }
        if let Some(birth_date) = patch.birth_date {
            self.birth_date = Some(birth_date);
        }
        if let Some(address) = &patch.address {
            self.address = Some(address.clone());
        }
        self.updated_at = Utc::now();
    }
}

/// A parent linked to a student through the relationship pivot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentLink {
    pub parent_id: Uuid,
    pub relationship_type: String,
}

/// Student with decrypted identity fields (safe to return to client)
#[derive(Debug, Clone, Serialize)]
pub struct StudentView {
    pub id: Uuid,
    pub nisn: String,
    pub full_name: String,
    pub gender: Gender,
    pub birth_place: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub nik: String,
    pub no_kk: Option<String>,
    pub guardian: Option<GuardianInfo>,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student() -> Student {
        Student {
            id: Uuid::new_v4(),
            nisn: "0012345678".to_string(),
            full_name: "Andi Pratama".to_string(),
            gender: Gender::Male,
            birth_place: None,
            birth_date: None,
            address: Some("Jl. Merdeka 1".to_string()),
            nik: "ciphertext".to_string(),
            nik_hash: "hash".to_string(),
            no_kk: None,
            guardian: GuardianRef::None,
            user_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_apply_copies_only_present_fields() {
        let mut s = student();
        let before = s.clone();
        s.apply(&StudentPatch {
            full_name: Some("Andi P.".to_string()),
            ..Default::default()
        });

        assert_eq!(s.full_name, "Andi P.");
        assert_eq!(s.nisn, before.nisn);
        assert_eq!(s.address, before.address);
        assert_eq!(s.nik, before.nik);
    }

    #[test]
    fn test_gender_column_values() {
        assert_eq!(Gender::from_column(Gender::Female.as_str()), Some(Gender::Female));
        assert_eq!(Gender::from_column("X"), None);
    }
}
