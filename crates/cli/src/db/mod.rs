//! Database access for the application's `PostgreSQL`.
//!
//! # Tables
//!
//! - `users_user` (configurable via `ACCOUNT_TABLE`) - user accounts, owned
//!   and migrated by the web application
//!
//! The CLI never creates or alters tables.

pub mod accounts;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub use accounts::PgAccountStore;

/// Create a `PostgreSQL` connection pool sized for a one-shot command.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(2)
        .min_connections(0)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
