//! Sitekit Core - Superuser provisioning and password hashing.
//!
//! This crate holds the logic behind the `sitekit` management commands:
//! - `create-or-update-superuser` - resolve credentials and upsert a privileged account
//! - `hash-password` - encode a password with one of the supported hashers
//!
//! # Architecture
//!
//! The core crate performs no I/O of its own. Accounts are reached through the
//! [`AccountStore`] trait and environment variables through the [`Environment`]
//! trait, so every rule here can be exercised with [`MemoryAccountStore`] and a
//! plain `HashMap`.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for account IDs, usernames, emails, and passwords
//! - [`env`] - Environment variable source
//! - [`hashers`] - Password hash encoding and verification
//! - [`store`] - Account store trait and the in-memory implementation
//! - [`provision`] - Credential resolution and the upsert procedure

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod env;
pub mod hashers;
pub mod provision;
pub mod store;
pub mod types;

pub use env::{Environment, ProcessEnvironment};
pub use hashers::{HashAlgorithm, HashError, HashParams};
pub use provision::{Outcome, ProvisionArgs, ProvisionError, ProvisioningRequest};
pub use store::{AccountStore, MemoryAccountStore, StoreError};
pub use types::*;
