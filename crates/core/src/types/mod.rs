//! Core types for sitekit.
//!
//! This module provides type-safe wrappers for account data.

pub mod account;
pub mod email;
pub mod id;
pub mod password;
pub mod username;

pub use account::Account;
pub use email::{Email, EmailError};
pub use id::*;
pub use password::{Password, PasswordError};
pub use username::{Username, UsernameError};
