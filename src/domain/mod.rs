//! Domain layer - Core business entities and logic
//!
//! Entities and value objects for identity, access control and the school's
//! people records, independent of storage and transport.

pub mod academic_year;
pub mod access;
pub mod guardian;
pub mod identity;
pub mod password;
pub mod people;
pub mod permissions;
pub mod student;
pub mod user;

pub use academic_year::AcademicYear;
pub use access::{NewRole, Permission, PermissionSet, Role, RolePatch, RoleResponse};
pub use guardian::{GuardianInfo, GuardianKind, GuardianRef};
pub use password::Password;
pub use people::{
    Employee, EmployeePatch, EmployeeView, Guardian, GuardianPatch, GuardianView,
    LinkedParentView, NewEmployee, NewGuardian, NewParent, Parent, ParentPatch, ParentView,
    PersonInput, PersonPatch,
};
pub use permissions::Perm;
pub use student::{Gender, NewStudent, ParentLink, Student, StudentPatch, StudentView};
pub use user::{NewUser, Revocation, Session, TokenHash, User, UserPatch, UserResponse};
