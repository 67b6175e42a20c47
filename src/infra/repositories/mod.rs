//! Repository layer - Data access abstraction
//!
//! Repositories provide an abstraction over data persistence,
//! following the Repository pattern for clean separation of concerns.
//! Multi-row writes open their own transaction inside the store method.

mod academic_year_repository;
mod employee_repository;
pub(crate) mod entities;
mod grants;
mod guardian_repository;
mod parent_repository;
mod role_repository;
mod student_repository;
mod user_repository;

use sea_orm::{DbErr, SqlErr};

use crate::errors::AppError;

pub use academic_year_repository::{AcademicYearRepository, AcademicYearStore};
pub use employee_repository::{EmployeeRepository, EmployeeStore};
pub use guardian_repository::{GuardianRepository, GuardianStore};
pub use parent_repository::{ParentRepository, ParentStore};
pub use role_repository::{
    PermissionRepository, PermissionStore, RoleRecord, RoleRepository, RoleStore,
};
pub use student_repository::{StudentRepository, StudentStore};
pub use user_repository::{UserRepository, UserStore};

// Export mocks for tests (both unit and integration)
#[cfg(any(test, feature = "test-utils"))]
pub use academic_year_repository::MockAcademicYearRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use employee_repository::MockEmployeeRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use guardian_repository::MockGuardianRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use parent_repository::MockParentRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use role_repository::{MockPermissionRepository, MockRoleRepository};
#[cfg(any(test, feature = "test-utils"))]
pub use student_repository::MockStudentRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;

/// Map a unique-constraint violation to `Conflict`; other errors pass through.
pub(crate) fn unique_violation(err: DbErr, entity: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::already_exists(entity),
        _ => AppError::Database(err),
    }
}
