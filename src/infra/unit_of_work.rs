//! Unit of Work: one place that hands out every repository.
//!
//! Services depend on `UnitOfWork` rather than on individual stores, so a
//! single connection is shared and tests can swap the whole data layer.
//! Writes that span several rows run in a transaction owned by the store
//! method performing them.

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use super::repositories::{
    AcademicYearRepository, AcademicYearStore, EmployeeRepository, EmployeeStore,
    GuardianRepository, GuardianStore, ParentRepository, ParentStore, PermissionRepository,
    PermissionStore, RoleRepository, RoleStore, StudentRepository, StudentStore, UserRepository,
    UserStore,
};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Unit of Work trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait UnitOfWork: Send + Sync {
    fn users(&self) -> Arc<dyn UserRepository>;

    fn roles(&self) -> Arc<dyn RoleRepository>;

    fn permissions(&self) -> Arc<dyn PermissionRepository>;

    fn students(&self) -> Arc<dyn StudentRepository>;

    fn parents(&self) -> Arc<dyn ParentRepository>;

    fn guardians(&self) -> Arc<dyn GuardianRepository>;

    fn employees(&self) -> Arc<dyn EmployeeRepository>;

    fn academic_years(&self) -> Arc<dyn AcademicYearRepository>;
}

/// Concrete implementation of UnitOfWork
pub struct Persistence {
    users: Arc<UserStore>,
    roles: Arc<RoleStore>,
    permissions: Arc<PermissionStore>,
    students: Arc<StudentStore>,
    parents: Arc<ParentStore>,
    guardians: Arc<GuardianStore>,
    employees: Arc<EmployeeStore>,
    academic_years: Arc<AcademicYearStore>,
}

impl Persistence {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            users: Arc::new(UserStore::new(db.clone())),
            roles: Arc::new(RoleStore::new(db.clone())),
            permissions: Arc::new(PermissionStore::new(db.clone())),
            students: Arc::new(StudentStore::new(db.clone())),
            parents: Arc::new(ParentStore::new(db.clone())),
            guardians: Arc::new(GuardianStore::new(db.clone())),
            employees: Arc::new(EmployeeStore::new(db.clone())),
            academic_years: Arc::new(AcademicYearStore::new(db)),
        }
    }
}

impl UnitOfWork for Persistence {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.users.clone()
    }

    fn roles(&self) -> Arc<dyn RoleRepository> {
        self.roles.clone()
    }

    fn permissions(&self) -> Arc<dyn PermissionRepository> {
        self.permissions.clone()
    }

    fn students(&self) -> Arc<dyn StudentRepository> {
        self.students.clone()
    }

    fn parents(&self) -> Arc<dyn ParentRepository> {
        self.parents.clone()
    }

    fn guardians(&self) -> Arc<dyn GuardianRepository> {
        self.guardians.clone()
    }

    fn employees(&self) -> Arc<dyn EmployeeRepository> {
        self.employees.clone()
    }

    fn academic_years(&self) -> Arc<dyn AcademicYearRepository> {
        self.academic_years.clone()
    }
}
