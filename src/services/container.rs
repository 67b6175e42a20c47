//! Service Container - one handle on every application service.
//!
//! Handlers depend on the `ServiceContainer` trait, never on concrete
//! managers, so the HTTP layer can be tested against mocks.

use std::sync::Arc;

use super::{
    AcademicYearManager, AcademicYearService, AuthService, Authenticator, EmployeeManager,
    EmployeeService, GuardianManager, GuardianService, ParentManager, ParentService, RoleManager,
    RoleService, StudentManager, StudentService, UserManager, UserService,
};
use crate::config::Config;
use crate::errors::AppResult;
use crate::infra::{FieldCipher, Persistence};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Service container trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    fn auth(&self) -> Arc<dyn AuthService>;

    fn users(&self) -> Arc<dyn UserService>;

    /// Roles and permissions
    fn roles(&self) -> Arc<dyn RoleService>;

    fn students(&self) -> Arc<dyn StudentService>;

    fn parents(&self) -> Arc<dyn ParentService>;

    fn guardians(&self) -> Arc<dyn GuardianService>;

    fn employees(&self) -> Arc<dyn EmployeeService>;

    fn academic_years(&self) -> Arc<dyn AcademicYearService>;
}

/// Concrete implementation of ServiceContainer
#[derive(Clone)]
pub struct Services {
    auth: Arc<dyn AuthService>,
    users: Arc<dyn UserService>,
    roles: Arc<dyn RoleService>,
    students: Arc<dyn StudentService>,
    parents: Arc<dyn ParentService>,
    guardians: Arc<dyn GuardianService>,
    employees: Arc<dyn EmployeeService>,
    academic_years: Arc<dyn AcademicYearService>,
}

impl Services {
    /// Wire every manager onto one database connection.
    ///
    /// # Errors
    /// Fails when the configured encryption key cannot build a cipher.
    pub fn from_connection(db: sea_orm::DatabaseConnection, config: &Config) -> AppResult<Self> {
        let cipher = Arc::new(FieldCipher::new(config.encryption_key_bytes())?);
        let uow = Arc::new(Persistence::new(db));

        Ok(Self {
            auth: Arc::new(Authenticator::new(uow.clone(), config)),
            users: Arc::new(UserManager::new(uow.clone())),
            roles: Arc::new(RoleManager::new(uow.clone())),
            students: Arc::new(StudentManager::new(uow.clone(), cipher.clone())),
            parents: Arc::new(ParentManager::new(uow.clone(), cipher.clone())),
            guardians: Arc::new(GuardianManager::new(uow.clone(), cipher.clone())),
            employees: Arc::new(EmployeeManager::new(uow.clone(), cipher)),
            academic_years: Arc::new(AcademicYearManager::new(uow)),
        })
    }
}

impl ServiceContainer for Services {
    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth.clone()
    }

    fn users(&self) -> Arc<dyn UserService> {
        self.users.clone()
    }

    fn roles(&self) -> Arc<dyn RoleService> {
        self.roles.clone()
    }

    fn students(&self) -> Arc<dyn StudentService> {
        self.students.clone()
    }

    fn parents(&self) -> Arc<dyn ParentService> {
        self.parents.clone()
    }

    fn guardians(&self) -> Arc<dyn GuardianService> {
        self.guardians.clone()
    }

    fn employees(&self) -> Arc<dyn EmployeeService> {
        self.employees.clone()
    }

    fn academic_years(&self) -> Arc<dyn AcademicYearService> {
        self.academic_years.clone()
    }
}
