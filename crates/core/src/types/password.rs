//! Plaintext password wrapper.

use secrecy::{ExposeSecret, SecretString};

/// Errors that can occur when constructing a [`Password`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    /// The input string is empty.
    #[error("password cannot be empty")]
    Empty,
}

/// A non-empty plaintext password.
///
/// Backed by [`SecretString`] so it is zeroized on drop and redacted in
/// `Debug` output. Stores hash it on write; it is never persisted as-is.
#[derive(Debug, Clone)]
pub struct Password(SecretString);

impl Password {
    /// Wrap a plaintext password.
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::Empty` if the input is empty.
    pub fn new(plaintext: impl Into<String>) -> Result<Self, PasswordError> {
        let plaintext = plaintext.into();
        if plaintext.is_empty() {
            return Err(PasswordError::Empty);
        }
        Ok(Self(SecretString::from(plaintext)))
    }

    /// Returns the plaintext for hashing.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}
