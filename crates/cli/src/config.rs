//! CLI configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required (`create-or-update-superuser`)
//! - `DATABASE_URL` - `PostgreSQL` connection string for the application database
//!
//! ## Optional
//! - `ACCOUNT_TABLE` - User table name (default: `users_user`)
//! - `ACCOUNT_BLANK_COLUMNS` - Comma-separated `NOT NULL` text columns set to
//!   `''` on insert (default: `name`; use `first_name,last_name` for `auth_user`)
//! - `PASSWORD_HASHER` - Hasher used when writing passwords (default: `argon2`)
//! - `LOG_FORMAT` - `text` or `json` (default: `text`)
//! - `RUST_LOG` - Log filter (default: `sitekit_cli=info,sitekit_core=info`)

use core::fmt;

use secrecy::SecretString;
use sitekit_core::{Environment, HashAlgorithm, ProcessEnvironment};
use thiserror::Error;

const DEFAULT_ACCOUNT_TABLE: &str = "users_user";
const DEFAULT_BLANK_COLUMNS: &str = "name";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Database settings for the account store.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// Table holding user accounts
    pub account_table: Identifier,
    /// Text columns without a database default, inserted as empty strings
    pub blank_columns: Vec<Identifier>,
    /// Algorithm for hashing passwords on write
    pub password_hasher: HashAlgorithm,
}

impl DatabaseConfig {
    /// Load configuration from the process environment.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `DATABASE_URL` is missing or an optional
    /// variable holds an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_source(&ProcessEnvironment)
    }

    /// Load configuration from any variable source.
    ///
    /// # Errors
    ///
    /// See [`DatabaseConfig::from_env`].
    pub fn from_source<E: Environment + ?Sized>(env: &E) -> Result<Self, ConfigError> {
        let database_url = env
            .non_empty_var("DATABASE_URL")
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?;

        let account_table = env
            .non_empty_var("ACCOUNT_TABLE")
            .unwrap_or_else(|| DEFAULT_ACCOUNT_TABLE.to_string());
        let account_table = Identifier::table(&account_table)
            .map_err(|e| ConfigError::InvalidEnvVar("ACCOUNT_TABLE".to_string(), e))?;

        let blank_columns = env
            .non_empty_var("ACCOUNT_BLANK_COLUMNS")
            .unwrap_or_else(|| DEFAULT_BLANK_COLUMNS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|column| !column.is_empty())
            .map(Identifier::column)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ConfigError::InvalidEnvVar("ACCOUNT_BLANK_COLUMNS".to_string(), e))?;

        let password_hasher = match env.non_empty_var("PASSWORD_HASHER") {
            Some(name) => name.parse().map_err(|e: sitekit_core::HashError| {
                ConfigError::InvalidEnvVar("PASSWORD_HASHER".to_string(), e.to_string())
            })?,
            None => HashAlgorithm::default(),
        };

        Ok(Self {
            database_url,
            account_table,
            blank_columns,
            password_hasher,
        })
    }
}

/// A validated SQL identifier.
///
/// Table and column names cannot be bound as query parameters, so they are
/// restricted to `[A-Za-z_][A-Za-z0-9_]*` before being interpolated. Table
/// names may carry one schema qualifier (`schema.table`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier(String);

impl Identifier {
    /// Parse a table name, optionally schema-qualified.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if the name is not a plain identifier.
    pub fn table(s: &str) -> Result<Self, String> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() > 2 {
            return Err(format!("'{s}' has more than one schema separator"));
        }
        if !parts.iter().all(|part| is_plain_identifier(part)) {
            return Err(format!("'{s}' is not a valid table identifier"));
        }
        Ok(Self(s.to_owned()))
    }

    /// Parse an unqualified column name.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if the name is not a plain identifier.
    pub fn column(s: &str) -> Result<Self, String> {
        if !is_plain_identifier(s) {
            return Err(format!("'{s}' is not a valid column identifier"));
        }
        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_plain_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// Read `LOG_FORMAT`; unknown values fall back to text.
    #[must_use]
    pub fn from_source<E: Environment + ?Sized>(env: &E) -> Self {
        match env.non_empty_var("LOG_FORMAT").as_deref() {
            Some(value) if value.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Text,
        }
    }
}
