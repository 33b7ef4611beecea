//! Account store abstraction.
//!
//! The upsert procedure needs three operations from the system of record:
//! find by username, create a superuser, and re-grant superuser rights to an
//! existing account. Implementations hash the plaintext password on write.
//!
//! - [`MemoryAccountStore`] - in-process store, used by tests
//! - `PgAccountStore` (in `sitekit-cli`) - the application's user table

pub mod memory;

use std::future::Future;

use thiserror::Error;

use crate::hashers::HashError;
use crate::types::{Account, AccountId, Email, Password, Username};

pub use memory::MemoryAccountStore;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[cfg(feature = "postgres")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Uniqueness constraint violation (e.g., duplicate username or email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Requested account was not found.
    #[error("not found")]
    NotFound,

    /// Data in the store is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Hashing the password for storage failed.
    #[error("password hashing failed: {0}")]
    Hashing(#[from] HashError),

    /// Any other backend failure.
    #[error("{0}")]
    Backend(String),
}

/// System of record for user accounts.
pub trait AccountStore {
    /// Find an account by exact username.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the lookup itself fails.
    fn find_by_username(
        &self,
        username: &Username,
    ) -> impl Future<Output = Result<Option<Account>, StoreError>> + Send;

    /// Create an active account with staff and superuser rights.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the username or email is already taken.
    fn create_superuser(
        &self,
        username: &Username,
        email: &Email,
        password: &Password,
    ) -> impl Future<Output = Result<Account, StoreError>> + Send;

    /// Set the email and password of an existing account and grant staff and
    /// superuser rights.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the account disappeared.
    fn update_superuser(
        &self,
        id: AccountId,
        email: &Email,
        password: &Password,
    ) -> impl Future<Output = Result<Account, StoreError>> + Send;
}
