//! Infrastructure layer - External systems integration
//!
//! This module handles all external system concerns:
//! - Field encryption and blind indexing
//! - Database connection, migrations and repositories
//! - Unit of Work handing repositories to services

pub mod crypto;
pub mod db;
pub mod repositories;
pub mod unit_of_work;

pub use crypto::{CryptoError, FieldCipher, SealedField};
pub use db::{Database, Migrator};
pub use repositories::{
    AcademicYearRepository, EmployeeRepository, GuardianRepository, ParentRepository,
    PermissionRepository, RoleRecord, RoleRepository, StudentRepository, UserRepository,
};
pub use unit_of_work::{Persistence, UnitOfWork};

#[cfg(any(test, feature = "test-utils"))]
pub use repositories::{
    MockAcademicYearRepository, MockEmployeeRepository, MockGuardianRepository,
    MockParentRepository, MockPermissionRepository, MockRoleRepository, MockStudentRepository,
    MockUserRepository,
};
#[cfg(any(test, feature = "test-utils"))]
pub use unit_of_work::MockUnitOfWork;
