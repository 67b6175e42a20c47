//! HTTP request handlers.

pub mod academic_year_handler;
pub mod auth_handler;
pub mod people_handler;
pub mod role_handler;
pub mod student_handler;
pub mod user_handler;

pub use academic_year_handler::academic_year_routes;
pub use auth_handler::auth_routes;
pub use people_handler::{employee_routes, guardian_routes, parent_routes};
pub use role_handler::{permission_routes, role_routes};
pub use student_handler::student_routes;
pub use user_handler::user_routes;
