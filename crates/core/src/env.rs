//! Environment variable source.
//!
//! Credential resolution reads the process environment only through the
//! [`Environment`] trait, so tests can supply a `HashMap` instead of mutating
//! global state.

use std::collections::HashMap;
use std::hash::BuildHasher;

/// Username fallback for `create-or-update-superuser`.
pub const SUPERUSER_USERNAME: &str = "SUPERUSER_USERNAME";
/// Email fallback for `create-or-update-superuser`.
pub const SUPERUSER_EMAIL: &str = "SUPERUSER_EMAIL";
/// Password fallback for `create-or-update-superuser`.
pub const SUPERUSER_PASSWORD: &str = "SUPERUSER_PASSWORD";

/// A source of named variables.
pub trait Environment {
    /// Returns the value of `key`, or `None` if it is not set.
    fn var(&self, key: &str) -> Option<String>;

    /// Returns the value of `key`, treating an empty value as unset.
    fn non_empty_var(&self, key: &str) -> Option<String> {
        self.var(key).filter(|value| !value.is_empty())
    }
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl<S: BuildHasher> Environment for HashMap<String, String, S> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl<E: Environment + ?Sized> Environment for &E {
    fn var(&self, key: &str) -> Option<String> {
        (**self).var(key)
    }
}
