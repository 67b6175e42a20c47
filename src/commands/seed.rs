//! Seed command - Bootstraps permissions, built-in roles and the admin user.

use std::sync::Arc;

use crate::cli::args::SeedArgs;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::{Database, Persistence};
use crate::services::{AdminAccount, Seeder};

/// Execute the seed command
pub async fn execute(args: SeedArgs, config: Config) -> AppResult<()> {
    let db = Database::connect(&config.database_url)
        .await
        .map_err(|e| AppError::internal(format!("Database connection failed: {}", e)))?;

    let admin = match (args.admin_username, args.admin_email, args.admin_password) {
        (Some(username), Some(email), Some(password)) => Some(AdminAccount {
            username,
            email,
            password,
        }),
        _ => None,
    };

    let seeder = Seeder::new(Arc::new(Persistence::new(db.get_connection())));
    let report = seeder.run(admin).await?;

    println!(
        "Seeded {} permission(s), roles created: [{}], admin created: {}",
        report.permissions_created,
        report.roles_created.join(", "),
        report.admin_created
    );
    Ok(())
}
