//! Application settings loaded from environment variables.

use std::env;

use super::constants::{
    DEFAULT_ACCESS_TOKEN_TTL_MINUTES, DEFAULT_DATABASE_URL, DEFAULT_REFRESH_TOKEN_TTL_HOURS,
    DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT, ENCRYPTION_KEY_LENGTH, MIN_JWT_SECRET_LENGTH,
};
use crate::errors::{AppError, AppResult};

const DEV_ACCESS_SECRET: &str = "dev-access-secret-minimum-32-chars!!";
const DEV_REFRESH_SECRET: &str = "dev-refresh-secret-minimum-32-chars!";
const DEV_ENCRYPTION_KEY: &str = "dev-encryption-key-32-bytes-long";

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    access_secret: String,
    refresh_secret: String,
    encryption_key: String,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_hours: i64,
    pub server_host: String,
    pub server_port: u16,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("access_secret", &"[REDACTED]")
            .field("refresh_secret", &"[REDACTED]")
            .field("encryption_key", &"[REDACTED]")
            .field("access_token_ttl_minutes", &self.access_token_ttl_minutes)
            .field("refresh_token_ttl_hours", &self.refresh_token_ttl_hours)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .finish()
    }
}

impl Config {
    /// Build a validated configuration with default lifetimes and bind address.
    ///
    /// # Errors
    /// Returns an internal error if a JWT secret is shorter than
    /// `MIN_JWT_SECRET_LENGTH`, if both secrets are equal, or if the
    /// encryption key is not exactly 32 bytes.
    pub fn new(
        database_url: impl Into<String>,
        access_secret: impl Into<String>,
        refresh_secret: impl Into<String>,
        encryption_key: impl Into<String>,
    ) -> AppResult<Self> {
        let config = Self {
            database_url: database_url.into(),
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            encryption_key: encryption_key.into(),
            access_token_ttl_minutes: DEFAULT_ACCESS_TOKEN_TTL_MINUTES,
            refresh_token_ttl_hours: DEFAULT_REFRESH_TOKEN_TTL_HOURS,
            server_host: DEFAULT_SERVER_HOST.to_string(),
            server_port: DEFAULT_SERVER_PORT,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables.
    ///
    /// In debug builds missing secrets fall back to development values.
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::new(
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            secret_from_env("JWT_ACCESS_SECRET", DEV_ACCESS_SECRET)?,
            secret_from_env("JWT_REFRESH_SECRET", DEV_REFRESH_SECRET)?,
            secret_from_env("ENCRYPTION_KEY", DEV_ENCRYPTION_KEY)?,
        )?;

        if let Some(minutes) = env::var("ACCESS_TOKEN_TTL_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.access_token_ttl_minutes = minutes;
        }
        if let Some(hours) = env::var("REFRESH_TOKEN_TTL_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.refresh_token_ttl_hours = hours;
        }
        if let Ok(host) = env::var("SERVER_HOST") {
            config.server_host = host;
        }
        if let Some(port) = env::var("SERVER_PORT").ok().and_then(|v| v.parse().ok()) {
            config.server_port = port;
        }

        Ok(config)
    }

    fn validate(&self) -> AppResult<()> {
        for (name, secret) in [
            ("JWT_ACCESS_SECRET", &self.access_secret),
            ("JWT_REFRESH_SECRET", &self.refresh_secret),
        ] {
            if secret.len() < MIN_JWT_SECRET_LENGTH {
                return Err(AppError::internal(format!(
                    "{} must be at least {} characters long",
                    name, MIN_JWT_SECRET_LENGTH
                )));
            }
        }

        if self.access_secret == self.refresh_secret {
            return Err(AppError::internal(
                "JWT_ACCESS_SECRET and JWT_REFRESH_SECRET must differ",
            ));
        }

        if self.encryption_key.len() != ENCRYPTION_KEY_LENGTH {
            return Err(AppError::internal(format!(
                "ENCRYPTION_KEY must be exactly {} bytes",
                ENCRYPTION_KEY_LENGTH
            )));
        }

        Ok(())
    }

    /// Secret used to sign and verify access tokens.
    pub fn access_secret_bytes(&self) -> &[u8] {
        self.access_secret.as_bytes()
    }

    /// Secret used to sign and verify refresh tokens.
    pub fn refresh_secret_bytes(&self) -> &[u8] {
        self.refresh_secret.as_bytes()
    }

    /// Raw AES-256 key for PII fields.
    pub fn encryption_key_bytes(&self) -> &[u8] {
        self.encryption_key.as_bytes()
    }

    /// Get the full server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn secret_from_env(name: &str, dev_default: &str) -> AppResult<String> {
    match env::var(name) {
        Ok(value) => Ok(value),
        Err(_) if cfg!(debug_assertions) => {
            tracing::warn!("{} not set, using insecure default for development", name);
            Ok(dev_default.to_string())
        }
        Err(_) => Err(AppError::internal(format!(
            "{} environment variable must be set in production",
            name
        ))),
    }
}
