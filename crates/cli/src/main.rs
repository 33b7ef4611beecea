//! Sitekit CLI - Account provisioning and password tools for the web application.
//!
//! # Usage
//!
//! ```bash
//! # Create the superuser, or update it if it already exists
//! sitekit create-or-update-superuser --username admin --email admin@example.com --password s3cret
//!
//! # Same, with credentials from SUPERUSER_USERNAME / SUPERUSER_EMAIL / SUPERUSER_PASSWORD
//! sitekit create-or-update-superuser
//!
//! # Generate a password hash
//! sitekit hash-password --hash-type pbkdf2
//! ```
//!
//! # Commands
//!
//! - `create-or-update-superuser` - Idempotently provision the superuser account
//! - `hash-password` - Print an encoded password hash
//!
//! Command output goes to stdout; logs go to stderr.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sitekit_core::{ProcessEnvironment, ProvisionArgs};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LogFormat;
use crate::error::CliError;
use crate::prompt::TerminalPrompter;

mod commands;
mod config;
mod db;
mod error;
mod prompt;

#[derive(Parser)]
#[command(name = "sitekit")]
#[command(author, version, about = "Sitekit account management tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a superuser, or update it if the username exists
    CreateOrUpdateSuperuser {
        /// Superuser username (falls back to `SUPERUSER_USERNAME`)
        #[arg(long)]
        username: Option<String>,

        /// Superuser email (falls back to `SUPERUSER_EMAIL`)
        #[arg(long)]
        email: Option<String>,

        /// Superuser password (falls back to `SUPERUSER_PASSWORD`)
        #[arg(long)]
        password: Option<String>,
    },
    /// Generate a password hash
    HashPassword {
        /// Password to hash; prompted for without echo when omitted
        password: Option<String>,

        /// Hash algorithm (argon2, pbkdf2, pbkdf2_sha1, bcrypt)
        #[arg(long)]
        hash_type: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file if present (ignore errors if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "sitekit_cli=info,sitekit_core=info".into());

    // stdout is reserved for command output
    let is_json = LogFormat::from_source(&ProcessEnvironment) == LogFormat::Json;
    let json_layer = is_json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer =
        (!is_json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::CreateOrUpdateSuperuser {
            username,
            email,
            password,
        } => {
            let args = ProvisionArgs {
                username,
                email,
                password,
            };
            commands::superuser::create_or_update(args).await?;
        }
        Commands::HashPassword {
            password,
            hash_type,
        } => {
            commands::hash::hash_password(password, hash_type.as_deref(), &mut TerminalPrompter)?;
        }
    }
    Ok(())
}
