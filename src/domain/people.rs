//! Parents, guardians and employees.
//!
//! All three carry an encrypted NIK with a blind index and an optional link
//! to a login account.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Parent as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parent {
    pub id: Uuid,
    pub full_name: String,
    pub nik: String,
    pub nik_hash: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub occupation: Option<String>,
    pub address: Option<String>,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Non-parent legal guardian (uncle, grandparent, ...) as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guardian {
    pub id: Uuid,
    pub full_name: String,
    pub nik: String,
    pub nik_hash: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub relationship_to_student: String,
    pub address: Option<String>,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Teacher or staff member as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Employee {
    pub id: Uuid,
    pub full_name: String,
    pub nik: String,
    pub nik_hash: String,
    pub nip: Option<String>,
    pub position: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Plaintext input shared by parent, guardian and employee creation.
#[derive(Debug, Clone, Default)]
pub struct PersonInput {
    pub full_name: String,
    pub nik: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub user_id: Option<Uuid>,
}

/// Partial update shared by parents, guardians and employees.
#[derive(Debug, Clone, Default)]
pub struct PersonPatch {
    pub full_name: Option<String>,
    pub nik: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewParent {
    pub person: PersonInput,
    pub occupation: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ParentPatch {
    pub person: PersonPatch,
    pub occupation: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewGuardian {
    pub person: PersonInput,
    pub relationship_to_student: String,
}

#[derive(Debug, Clone, Default)]
pub struct GuardianPatch {
    pub person: PersonPatch,
    pub relationship_to_student: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewEmployee {
    pub person: PersonInput,
    pub nip: Option<String>,
    pub position: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct EmployeePatch {
    pub person: PersonPatch,
    pub nip: Option<String>,
    pub position: Option<String>,
}

/// Decrypted parent (safe to return to client)
#[derive(Debug, Clone, Serialize)]
pub struct ParentView {
    pub id: Uuid,
    pub full_name: String,
    pub nik: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub occupation: Option<String>,
    pub address: Option<String>,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Decrypted guardian (safe to return to client)
#[derive(Debug, Clone, Serialize)]
pub struct GuardianView {
    pub id: Uuid,
    pub full_name: String,
    pub nik: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub relationship_to_student: String,
    pub address: Option<String>,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Decrypted employee (safe to return to client)
#[derive(Debug, Clone, Serialize)]
pub struct EmployeeView {
    pub id: Uuid,
    pub full_name: String,
    pub nik: String,
    pub nip: Option<String>,
    pub position: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A student's parent together with the pivot relationship.
#[derive(Debug, Clone, Serialize)]
pub struct LinkedParentView {
    #[serde(flatten)]
    pub parent: ParentView,
    pub relationship_type: String,
}
