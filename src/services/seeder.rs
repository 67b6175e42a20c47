//! Idempotent bootstrap of the permission registry, the built-in roles and
//! an optional administrator account.

use std::sync::Arc;
use uuid::Uuid;

use crate::config::{ROLE_ADMIN, ROLE_STUDENT};
use crate::domain::{NewUser, Password, Perm, Role, RolePatch};
use crate::errors::AppResult;
use crate::infra::{RoleRecord, UnitOfWork};

/// Credentials for the administrator created by `seed`.
#[derive(Debug, Clone)]
pub struct AdminAccount {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// What a seeding run actually created.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub permissions_created: usize,
    pub roles_created: Vec<String>,
    pub admin_created: bool,
}

pub struct Seeder<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> Seeder<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }

    /// Bring the database up to the built-in baseline. Safe to run repeatedly.
    pub async fn run(&self, admin: Option<AdminAccount>) -> AppResult<SeedReport> {
        let mut report = SeedReport::default();

        let permission_ids = self.ensure_permissions(&mut report).await?;
        let admin_role = self.ensure_admin_role(permission_ids, &mut report).await?;
        self.ensure_student_role(&mut report).await?;

        if let Some(account) = admin {
            report.admin_created = self.ensure_admin_user(account, admin_role.id).await?;
        }

        tracing::info!(
            permissions_created = report.permissions_created,
            roles_created = ?report.roles_created,
            admin_created = report.admin_created,
            "Seeding finished"
        );
        Ok(report)
    }

    async fn ensure_permissions(&self, report: &mut SeedReport) -> AppResult<Vec<Uuid>> {
        let permissions = self.uow.permissions();
        let mut ids = Vec::with_capacity(Perm::ALL.len());

        for perm in Perm::ALL {
            let permission = match permissions.find_by_name(perm.as_str()).await? {
                Some(existing) => existing,
                None => {
                    report.permissions_created += 1;
                    permissions
                        .create(perm.as_str().to_string(), Some(perm.description().to_string()))
                        .await?
                }
            };
            ids.push(permission.id);
        }
        Ok(ids)
    }

    async fn ensure_admin_role(
        &self,
        permission_ids: Vec<Uuid>,
        report: &mut SeedReport,
    ) -> AppResult<Role> {
        let roles = self.uow.roles();
        match roles.find_by_name(ROLE_ADMIN).await? {
            Some(role) if Perm::ALL.iter().all(|p| role.grants(p.as_str())) => Ok(role),
            // Newly registered permissions get folded into an existing admin role.
            Some(role) => roles.replace_permissions(role.id, permission_ids).await,
            None => {
                report.roles_created.push(ROLE_ADMIN.to_string());
                roles
                    .create(
                        RoleRecord {
                            name: ROLE_ADMIN.to_string(),
                            description: Some("Full access".to_string()),
                            is_default: false,
                        },
                        permission_ids,
                    )
                    .await
            }
        }
    }

    async fn ensure_student_role(&self, report: &mut SeedReport) -> AppResult<()> {
        let roles = self.uow.roles();
        if let Some(existing) = roles.find_by_name(ROLE_STUDENT).await? {
            if roles.find_default().await?.is_none() {
                roles
                    .update(
                        existing.id,
                        RolePatch {
                            is_default: Some(true),
                            ..Default::default()
                        },
                    )
                    .await?;
                tracing::warn!(role = ROLE_STUDENT, "No default role configured, restored");
            }
            return Ok(());
        }

        // Self-registered accounts only ever reach their own linked record.
        let read_own = self
            .uow
            .permissions()
            .find_by_name(Perm::StudentsReadOwn.as_str())
            .await?;
        let is_default = roles.find_default().await?.is_none();

        roles
            .create(
                RoleRecord {
                    name: ROLE_STUDENT.to_string(),
                    description: Some("Assigned on self-registration".to_string()),
                    is_default,
                },
                read_own.into_iter().map(|p| p.id).collect(),
            )
            .await?;
        report.roles_created.push(ROLE_STUDENT.to_string());
        Ok(())
    }

    async fn ensure_admin_user(&self, account: AdminAccount, admin_role: Uuid) -> AppResult<bool> {
        let users = self.uow.users();
        if users.find_by_username(&account.username).await?.is_some() {
            tracing::info!(username = %account.username, "Admin user already exists");
            return Ok(false);
        }

        let password = Password::new(&account.password)?;
        let user = users
            .create_with_role(
                NewUser {
                    username: account.username,
                    email: account.email,
                    password_hash: password.into_string(),
                    full_name: "Administrator".to_string(),
                },
                admin_role,
            )
            .await?;
        tracing::info!(user_id = %user.id, "Admin user created");
        Ok(true)
    }
}
