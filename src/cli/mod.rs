//! CLI module - Command-line interface for the application.
//!
//! Provides commands for:
//! - `serve` - Start the HTTP server
//! - `seed` - Bootstrap permissions, roles and the admin account

pub mod args;

pub use args::{Cli, Commands};
