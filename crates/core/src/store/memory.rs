//! In-memory account store.

use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use super::{AccountStore, StoreError};
use crate::hashers::{HashAlgorithm, HashParams};
use crate::types::{Account, AccountId, Email, Password, Username};

#[derive(Debug, Default)]
struct Inner {
    accounts: Vec<Account>,
    next_id: i32,
}

/// Account store held in process memory.
///
/// Uniqueness matches the database: usernames and emails collide when they
/// differ only in letter case. Username lookups are exact.
#[derive(Debug)]
pub struct MemoryAccountStore {
    inner: Mutex<Inner>,
    hasher: HashAlgorithm,
    params: HashParams,
}

impl Default for MemoryAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAccountStore {
    /// Create an empty store hashing with the default algorithm and costs.
    #[must_use]
    pub fn new() -> Self {
        Self::with_hasher(HashAlgorithm::default(), HashParams::default())
    }

    /// Create an empty store with the given hasher.
    #[must_use]
    pub fn with_hasher(hasher: HashAlgorithm, params: HashParams) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            hasher,
            params,
        }
    }

    /// Insert a regular (non-staff) account.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` on a duplicate username or email.
    pub fn insert_user(
        &self,
        username: &Username,
        email: Option<&Email>,
        password: &Password,
    ) -> Result<Account, StoreError> {
        self.insert(username, email.map(Email::normalized), password, false)
    }

    /// Snapshot of every account, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Backend` if the store lock is poisoned.
    pub fn accounts(&self) -> Result<Vec<Account>, StoreError> {
        Ok(self.lock()?.accounts.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Backend("account store lock poisoned".to_owned()))
    }

    fn insert(
        &self,
        username: &Username,
        email: Option<Email>,
        password: &Password,
        privileged: bool,
    ) -> Result<Account, StoreError> {
        let password = self.hasher.encode(password.expose(), &self.params)?;
        let mut inner = self.lock()?;

        if inner
            .accounts
            .iter()
            .any(|a| same_ignoring_case(a.username.as_str(), username.as_str()))
        {
            return Err(StoreError::Conflict(format!(
                "username already exists: {username}"
            )));
        }
        if let Some(email) = &email {
            ensure_email_free(&inner.accounts, email, None)?;
        }

        inner.next_id += 1;
        let account = Account {
            id: AccountId::new(inner.next_id),
            username: username.clone(),
            email,
            password,
            is_staff: privileged,
            is_superuser: privileged,
            is_active: true,
            date_joined: Utc::now(),
        };
        inner.accounts.push(account.clone());

        Ok(account)
    }
}

/// Case-insensitive comparison shared by the username and email checks.
fn same_ignoring_case(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn ensure_email_free(
    accounts: &[Account],
    email: &Email,
    except: Option<AccountId>,
) -> Result<(), StoreError> {
    let taken = accounts.iter().any(|a| {
        Some(a.id) != except
            && a.email
                .as_ref()
                .is_some_and(|existing| same_ignoring_case(existing.as_str(), email.as_str()))
    });

    if taken {
        return Err(StoreError::Conflict(format!("email already exists: {email}")));
    }
    Ok(())
}

impl AccountStore for MemoryAccountStore {
    async fn find_by_username(&self, username: &Username) -> Result<Option<Account>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .accounts
            .iter()
            .find(|a| a.username == *username)
            .cloned())
    }

    async fn create_superuser(
        &self,
        username: &Username,
        email: &Email,
        password: &Password,
    ) -> Result<Account, StoreError> {
        self.insert(username, Some(email.normalized()), password, true)
    }

    async fn update_superuser(
        &self,
        id: AccountId,
        email: &Email,
        password: &Password,
    ) -> Result<Account, StoreError> {
        let password = self.hasher.encode(password.expose(), &self.params)?;
        let mut inner = self.lock()?;

        ensure_email_free(&inner.accounts, email, Some(id))?;

        let account = inner
            .accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(StoreError::NotFound)?;
        account.email = Some(email.clone());
        account.password = password;
        account.is_staff = true;
        account.is_superuser = true;

        Ok(account.clone())
    }
}
