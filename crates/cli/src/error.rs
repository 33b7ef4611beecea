//! Unified error handling for the CLI.

use thiserror::Error;

use sitekit_core::{HashError, ProvisionError};

use crate::config::ConfigError;

/// Command-level error type.
///
/// Every variant renders as a one-line operator message; `main` logs it and
/// exits with status 1.
#[derive(Debug, Error)]
pub enum CliError {
    /// Credential resolution or account upsert was rejected.
    #[error(transparent)]
    Provision(#[from] ProvisionError),

    /// Password hashing input was rejected or hashing failed.
    #[error(transparent)]
    Hash(#[from] HashError),

    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Could not connect to the database.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Terminal input failed.
    #[error("Could not read input: {0}")]
    Io(#[from] std::io::Error),
}
