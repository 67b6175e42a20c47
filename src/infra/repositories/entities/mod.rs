//! SeaORM entity definitions
//!
//! These are database-specific entities separate from domain models.

pub mod academic_year;
pub mod employee;
pub mod guardian;
pub mod parent;
pub mod permission;
pub mod role;
pub mod role_permission;
pub mod student;
pub mod student_parent;
pub mod user;
pub mod user_permission;
pub mod user_role;
