//! Shared setup for integration tests: a migrated in-memory SQLite database
//! with the built-in permissions and roles seeded.

#![allow(dead_code)]

use std::sync::Arc;

use sea_orm::ConnectOptions;

use school_api::config::Config;
use school_api::domain::{Gender, NewParent, NewStudent, PersonInput};
use school_api::infra::{Database, FieldCipher, Persistence};
use school_api::services::Seeder;

pub const ACCESS: &str = "access-secret-for-tests-32-chars!!";
pub const REFRESH: &str = "refresh-secret-for-tests-32-chars!";
pub const KEY: &str = "0123456789abcdef0123456789abcdef";

pub struct TestApp {
    pub database: Arc<Database>,
    pub uow: Arc<Persistence>,
    pub cipher: Arc<FieldCipher>,
    pub config: Config,
}

pub fn config() -> Config {
    Config::new("sqlite::memory:", ACCESS, REFRESH, KEY).unwrap()
}

/// Migrated database without any seed data.
pub async fn empty() -> TestApp {
    // One connection, otherwise every pooled connection gets its own in-memory database.
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1).sqlx_logging(false);
    let database = Database::connect_with(options).await.unwrap();

    TestApp {
        uow: Arc::new(Persistence::new(database.get_connection())),
        database: Arc::new(database),
        cipher: Arc::new(FieldCipher::new(KEY.as_bytes()).unwrap()),
        config: config(),
    }
}

/// Migrated and seeded database.
pub async fn seeded() -> TestApp {
    let app = empty().await;
    Seeder::new(app.uow.clone()).run(None).await.unwrap();
    app
}

pub fn new_student(nisn: &str, nik: &str) -> NewStudent {
    NewStudent {
        nisn: nisn.to_string(),
        full_name: "Andi Pratama".to_string(),
        gender: Gender::Male,
        birth_place: Some("Bandung".to_string()),
        birth_date: None,
        address: None,
        nik: nik.to_string(),
        no_kk: Some("3273000000000001".to_string()),
        user_id: None,
    }
}

pub fn new_parent(name: &str, nik: &str) -> NewParent {
    NewParent {
        person: PersonInput {
            full_name: name.to_string(),
            nik: nik.to_string(),
            phone: Some("081234567890".to_string()),
            ..Default::default()
        },
        occupation: Some("Farmer".to_string()),
    }
}
