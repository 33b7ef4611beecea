//! Integration tests for sitekit.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p sitekit-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `provisioning` - Credential resolution and superuser upsert end to end
//! - `hashing` - Every hasher against the shared verifier
//!
//! The scenarios run against [`MemoryAccountStore`] and `HashMap`
//! environments, so no database or process environment is needed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use sitekit_core::{
    Account, AccountId, AccountStore, Email, HashAlgorithm, HashParams, MemoryAccountStore,
    Password, StoreError, Username,
};

/// Hash costs low enough to keep the suite fast.
#[must_use]
pub const fn fast_params() -> HashParams {
    HashParams {
        argon2_memory_kib: 1024,
        argon2_time_cost: 1,
        argon2_parallelism: 1,
        pbkdf2_sha256_iterations: 1_000,
        pbkdf2_sha1_iterations: 1_000,
        bcrypt_cost: 4,
    }
}

/// An empty in-memory store using the default algorithm at test costs.
#[must_use]
pub fn memory_store() -> MemoryAccountStore {
    MemoryAccountStore::with_hasher(HashAlgorithm::default(), fast_params())
}

/// Build an environment from key/value pairs.
#[must_use]
pub fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
        .collect()
}

/// A store whose every call fails, counting the mutations attempted.
#[derive(Debug, Default)]
pub struct FailingStore {
    mutations: AtomicUsize,
}

impl FailingStore {
    /// Number of create or update calls received.
    #[must_use]
    pub fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    fn failure() -> StoreError {
        StoreError::Backend("connection refused".to_owned())
    }
}

impl AccountStore for FailingStore {
    async fn find_by_username(&self, _username: &Username) -> Result<Option<Account>, StoreError> {
        Err(Self::failure())
    }

    async fn create_superuser(
        &self,
        _username: &Username,
        _email: &Email,
        _password: &Password,
    ) -> Result<Account, StoreError> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        Err(Self::failure())
    }

    async fn update_superuser(
        &self,
        _id: AccountId,
        _email: &Email,
        _password: &Password,
    ) -> Result<Account, StoreError> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        Err(Self::failure())
    }
}
