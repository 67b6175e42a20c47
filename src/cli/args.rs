//! CLI argument definitions.

use clap::{Parser, Subcommand};

/// School administration API server
#[derive(Parser, Debug)]
#[command(name = "school-api")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve(ServeArgs),

    /// Create the permission registry, built-in roles and an optional admin
    Seed(SeedArgs),
}

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Host to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0", env = "SERVER_HOST")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "3000", env = "SERVER_PORT")]
    pub port: u16,
}

/// Arguments for the seed command. The admin account is created only when
/// all three values are given.
#[derive(Parser, Debug)]
pub struct SeedArgs {
    #[arg(long, env = "ADMIN_USERNAME", requires_all = ["admin_email", "admin_password"])]
    pub admin_username: Option<String>,

    #[arg(long, env = "ADMIN_EMAIL")]
    pub admin_email: Option<String>,

    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_without_admin() {
        let cli = Cli::try_parse_from(["school-api", "seed"]).unwrap();
        match cli.command {
            Commands::Seed(args) => assert!(args.admin_username.is_none()),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_admin_username_requires_email_and_password() {
        let result = Cli::try_parse_from(["school-api", "seed", "--admin-username", "root"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_serve_port_flag() {
        let cli = Cli::try_parse_from(["school-api", "-v", "serve", "--port", "8080"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Serve(args) => assert_eq!(args.port, 8080),
            other => panic!("unexpected command {:?}", other),
        }
    }
}
