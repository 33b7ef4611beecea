//! Password hash encoding and verification.
//!
//! Encoded hashes use the web framework's `<algorithm>$...` storage format so
//! accounts written here can be verified by the application and vice versa.
//!
//! | Name          | Prefix          | Construction                              |
//! |---------------|-----------------|-------------------------------------------|
//! | `argon2`      | `argon2`        | Argon2id v19, PHC string after the prefix |
//! | `pbkdf2`      | `pbkdf2_sha256` | PBKDF2-HMAC-SHA256, 32-byte key           |
//! | `pbkdf2_sha1` | `pbkdf2_sha1`   | PBKDF2-HMAC-SHA1, 20-byte key             |
//! | `bcrypt`      | `bcrypt_sha256` | bcrypt `$2b$` over hex(SHA-256(password)) |
//!
//! # Example
//!
//! ```
//! use sitekit_core::hashers::{self, HashAlgorithm, HashParams};
//!
//! let params = HashParams {
//!     pbkdf2_sha256_iterations: 1_000,
//!     ..HashParams::default()
//! };
//! let encoded = HashAlgorithm::Pbkdf2Sha256.encode("s3cret", &params).unwrap();
//! assert!(encoded.starts_with("pbkdf2_sha256$1000$"));
//! assert!(hashers::verify("s3cret", &encoded).unwrap());
//! ```

use core::fmt;
use std::str::FromStr;

use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::Rng;
use rand::distr::Alphanumeric;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Length of generated salts for argon2 and pbkdf2.
const SALT_LENGTH: usize = 22;
const ARGON2_HASH_LENGTH: usize = 32;
const PBKDF2_SHA256_KEY_LENGTH: usize = 32;
const PBKDF2_SHA1_KEY_LENGTH: usize = 20;

/// Errors from password hashing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HashError {
    /// Refused to hash an empty password.
    #[error("Password cannot be empty")]
    EmptyPassword,

    /// Algorithm name outside the supported set.
    #[error("Invalid hash type '{0}'. Choose from: {choices}", choices = HashAlgorithm::CHOICES)]
    InvalidHashType(String),

    /// Encoded hash does not start with a known algorithm prefix.
    #[error("Unrecognized password hash encoding")]
    UnknownEncoding,

    /// Encoded hash has a known prefix but cannot be parsed.
    #[error("Malformed password hash: {0}")]
    MalformedHash(String),

    /// The hashing backend rejected its parameters or input.
    #[error("Error hashing password: {0}")]
    Backend(String),
}

/// Supported password hashing algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HashAlgorithm {
    /// Argon2id. The recommended default.
    #[default]
    Argon2,
    /// PBKDF2 with HMAC-SHA256.
    Pbkdf2Sha256,
    /// PBKDF2 with HMAC-SHA1.
    Pbkdf2Sha1,
    /// bcrypt over a SHA-256 prehash, lifting bcrypt's 72-byte input limit.
    BcryptSha256,
}

impl HashAlgorithm {
    /// Every supported algorithm, recommended first.
    pub const ALL: [Self; 4] = [
        Self::Argon2,
        Self::Pbkdf2Sha256,
        Self::Pbkdf2Sha1,
        Self::BcryptSha256,
    ];

    /// Comma-separated names, in the order of [`HashAlgorithm::ALL`].
    pub const CHOICES: &'static str = "argon2, pbkdf2, pbkdf2_sha1, bcrypt";

    /// The name accepted on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Argon2 => "argon2",
            Self::Pbkdf2Sha256 => "pbkdf2",
            Self::Pbkdf2Sha1 => "pbkdf2_sha1",
            Self::BcryptSha256 => "bcrypt",
        }
    }

    /// The prefix written in front of encoded hashes.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Argon2 => "argon2",
            Self::Pbkdf2Sha256 => "pbkdf2_sha256",
            Self::Pbkdf2Sha1 => "pbkdf2_sha1",
            Self::BcryptSha256 => "bcrypt_sha256",
        }
    }

    /// Identify the algorithm that produced `encoded`.
    #[must_use]
    pub fn identify(encoded: &str) -> Option<Self> {
        let (prefix, _) = encoded.split_once('$')?;
        Self::ALL.into_iter().find(|algorithm| algorithm.prefix() == prefix)
    }

    /// Hash `password` and return the encoded string.
    ///
    /// # Errors
    ///
    /// Returns `HashError::EmptyPassword` before hashing if `password` is empty,
    /// and `HashError::Backend` if the parameters are rejected.
    pub fn encode(self, password: &str, params: &HashParams) -> Result<String, HashError> {
        if password.is_empty() {
            return Err(HashError::EmptyPassword);
        }

        match self {
            Self::Argon2 => encode_argon2(password, &generate_salt(), params),
            Self::Pbkdf2Sha256 => Ok(self.encode_pbkdf2(
                password,
                &generate_salt(),
                params.pbkdf2_sha256_iterations,
            )),
            Self::Pbkdf2Sha1 => Ok(self.encode_pbkdf2(
                password,
                &generate_salt(),
                params.pbkdf2_sha1_iterations,
            )),
            Self::BcryptSha256 => encode_bcrypt_sha256(password, params.bcrypt_cost),
        }
    }

    fn encode_pbkdf2(self, password: &str, salt: &str, iterations: u32) -> String {
        let mut key = vec![0_u8; self.pbkdf2_key_length()];
        self.derive_pbkdf2(password, salt, iterations, &mut key);
        format!("{}${iterations}${salt}${}", self.prefix(), STANDARD.encode(&key))
    }

    const fn pbkdf2_key_length(self) -> usize {
        match self {
            Self::Pbkdf2Sha1 => PBKDF2_SHA1_KEY_LENGTH,
            _ => PBKDF2_SHA256_KEY_LENGTH,
        }
    }

    fn derive_pbkdf2(self, password: &str, salt: &str, iterations: u32, out: &mut [u8]) {
        match self {
            Self::Pbkdf2Sha1 => {
                pbkdf2::pbkdf2_hmac::<Sha1>(password.as_bytes(), salt.as_bytes(), iterations, out);
            }
            _ => {
                pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, out);
            }
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|algorithm| algorithm.name() == s)
            .ok_or_else(|| HashError::InvalidHashType(s.to_owned()))
    }
}

/// Cost parameters for each algorithm.
///
/// `Default` gives production values. Tests construct cheaper parameters
/// explicitly; the parameters are embedded in the encoded hash, so
/// verification never needs them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashParams {
    /// Argon2 memory cost in KiB.
    pub argon2_memory_kib: u32,
    /// Argon2 iterations.
    pub argon2_time_cost: u32,
    /// Argon2 lanes.
    pub argon2_parallelism: u32,
    pub pbkdf2_sha256_iterations: u32,
    pub pbkdf2_sha1_iterations: u32,
    /// bcrypt log2 rounds (4-31).
    pub bcrypt_cost: u32,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            argon2_memory_kib: 102_400,
            argon2_time_cost: 2,
            argon2_parallelism: 8,
            pbkdf2_sha256_iterations: 1_000_000,
            pbkdf2_sha1_iterations: 1_000_000,
            bcrypt_cost: 12,
        }
    }
}

/// Check `password` against an encoded hash.
///
/// Returns `Ok(false)` for a well-formed hash that does not match.
///
/// # Errors
///
/// Returns `HashError::UnknownEncoding` if the prefix is not recognized and
/// `HashError::MalformedHash` if the remainder cannot be parsed.
pub fn verify(password: &str, encoded: &str) -> Result<bool, HashError> {
    let algorithm = HashAlgorithm::identify(encoded).ok_or(HashError::UnknownEncoding)?;

    match algorithm {
        HashAlgorithm::Argon2 => verify_argon2(password, encoded),
        HashAlgorithm::Pbkdf2Sha256 | HashAlgorithm::Pbkdf2Sha1 => {
            verify_pbkdf2(algorithm, password, encoded)
        }
        HashAlgorithm::BcryptSha256 => verify_bcrypt_sha256(password, encoded),
    }
}

// =============================================================================
// Algorithms
// =============================================================================

fn generate_salt() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SALT_LENGTH)
        .map(char::from)
        .collect()
}

fn encode_argon2(password: &str, salt: &str, params: &HashParams) -> Result<String, HashError> {
    let params = Params::new(
        params.argon2_memory_kib,
        params.argon2_time_cost,
        params.argon2_parallelism,
        Some(ARGON2_HASH_LENGTH),
    )
    .map_err(|e| HashError::Backend(e.to_string()))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let salt =
        SaltString::encode_b64(salt.as_bytes()).map_err(|e| HashError::Backend(e.to_string()))?;
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| HashError::Backend(e.to_string()))?;

    // The PHC string already starts with `$argon2id`
    Ok(format!("{}{hash}", HashAlgorithm::Argon2.prefix()))
}

fn verify_argon2(password: &str, encoded: &str) -> Result<bool, HashError> {
    let phc = encoded
        .strip_prefix(HashAlgorithm::Argon2.prefix())
        .ok_or(HashError::UnknownEncoding)?;
    let parsed = PasswordHash::new(phc).map_err(|e| HashError::MalformedHash(e.to_string()))?;
    if parsed.salt.is_none() || parsed.hash.is_none() {
        return Err(HashError::MalformedHash("missing salt or hash".to_owned()));
    }

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(HashError::MalformedHash(e.to_string())),
    }
}

fn verify_pbkdf2(
    algorithm: HashAlgorithm,
    password: &str,
    encoded: &str,
) -> Result<bool, HashError> {
    let mut parts = encoded.splitn(4, '$').skip(1);
    let (Some(iterations), Some(salt), Some(expected)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(HashError::MalformedHash(
            "expected <algorithm>$<iterations>$<salt>$<hash>".to_owned(),
        ));
    };

    let iterations: u32 = iterations
        .parse()
        .map_err(|_| HashError::MalformedHash(format!("invalid iteration count: {iterations}")))?;
    if iterations == 0 {
        return Err(HashError::MalformedHash(
            "iteration count must be positive".to_owned(),
        ));
    }

    let expected = STANDARD
        .decode(expected)
        .map_err(|e| HashError::MalformedHash(e.to_string()))?;
    if expected.is_empty() {
        return Err(HashError::MalformedHash("empty derived key".to_owned()));
    }

    let mut derived = vec![0_u8; expected.len()];
    algorithm.derive_pbkdf2(password, salt, iterations, &mut derived);

    Ok(derived.ct_eq(&expected).into())
}

/// Hex-encoded SHA-256 of the password, the input fed to bcrypt.
fn bcrypt_prehash(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

fn encode_bcrypt_sha256(password: &str, cost: u32) -> Result<String, HashError> {
    let hashed = bcrypt::hash(bcrypt_prehash(password), cost)
        .map_err(|e| HashError::Backend(e.to_string()))?;
    Ok(format!("{}${hashed}", HashAlgorithm::BcryptSha256.prefix()))
}

fn verify_bcrypt_sha256(password: &str, encoded: &str) -> Result<bool, HashError> {
    let hashed = encoded
        .strip_prefix(HashAlgorithm::BcryptSha256.prefix())
        .and_then(|rest| rest.strip_prefix('$'))
        .ok_or(HashError::UnknownEncoding)?;

    bcrypt::verify(bcrypt_prehash(password), hashed)
        .map_err(|e| HashError::MalformedHash(e.to_string()))
}
