//! Application services layer - Use cases and business logic.
//!
//! Services orchestrate domain logic and infrastructure to fulfill
//! application use cases. They depend on abstractions (traits) for
//! dependency inversion.
//!
//! All services use the Unit of Work pattern for centralized repository
//! access; multi-row writes are transactional inside the repositories.

mod academic_year_service;
mod auth_service;
pub mod authorization;
pub mod container;
mod employee_service;
mod guardian_resolver;
mod guardian_service;
mod parent_service;
mod records;
mod role_service;
mod seeder;
mod student_service;
pub mod tokens;
mod user_service;

// Service Container
pub use container::{ServiceContainer, Services};

// Service traits and implementations
pub use academic_year_service::{AcademicYearManager, AcademicYearService};
pub use auth_service::{AuthService, Authenticator, Registration};
pub use authorization::{authorize, Principal};
pub use employee_service::{EmployeeManager, EmployeeService};
pub use guardian_resolver::GuardianResolver;
pub use guardian_service::{GuardianManager, GuardianService};
pub use parent_service::{ParentManager, ParentService};
pub use role_service::{RoleManager, RoleService};
pub use seeder::{AdminAccount, SeedReport, Seeder};
pub use student_service::{StudentManager, StudentService};
pub use tokens::{Claims, TokenIssuer, TokenPair};
pub use user_service::{UserManager, UserService};

#[cfg(any(test, feature = "test-utils"))]
pub use container::MockServiceContainer;
