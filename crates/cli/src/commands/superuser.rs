//! Superuser provisioning command.
//!
//! # Usage
//!
//! ```bash
//! # Explicit credentials
//! sitekit create-or-update-superuser --username alice --email alice@x.com --password s3cret
//!
//! # From the environment
//! SUPERUSER_USERNAME=bob SUPERUSER_EMAIL=bob@x.com SUPERUSER_PASSWORD=pw \
//!     sitekit create-or-update-superuser
//! ```
//!
//! # Environment Variables
//!
//! - `SUPERUSER_USERNAME`, `SUPERUSER_EMAIL`, `SUPERUSER_PASSWORD` - credential fallbacks
//! - `DATABASE_URL` - `PostgreSQL` connection string for the application database
//! - `ACCOUNT_TABLE`, `ACCOUNT_BLANK_COLUMNS`, `PASSWORD_HASHER` - see [`crate::config`]

use sitekit_core::ProcessEnvironment;
use sitekit_core::provision::{self, Outcome, ProvisionArgs};

use crate::config::DatabaseConfig;
use crate::db::{self, PgAccountStore};
use crate::error::CliError;

/// Create the superuser, or update it if the username already exists.
///
/// Credentials are resolved before any connection is opened, so a bad
/// invocation never touches the database.
///
/// # Errors
///
/// Returns `CliError::Provision` for rejected credentials or store failures,
/// and `CliError::Config`/`CliError::Database` if the database is unreachable.
pub async fn create_or_update(args: ProvisionArgs) -> Result<Outcome, CliError> {
    let request = provision::resolve(&args, &ProcessEnvironment)?;

    let config = DatabaseConfig::from_env()?;

    tracing::info!(table = %config.account_table, "Connecting to application database...");
    let pool = db::create_pool(&config.database_url).await?;

    let store = PgAccountStore::new(
        &pool,
        &config.account_table,
        &config.blank_columns,
        config.password_hasher,
    );
    let result = provision::upsert(&store, &request).await;
    pool.close().await;

    let outcome = result?;
    report(&outcome);
    Ok(outcome)
}

#[allow(clippy::print_stdout)]
fn report(outcome: &Outcome) {
    println!("{}", outcome.message());
}
