//! Password hash generation command.
//!
//! # Usage
//!
//! ```bash
//! # Hash a password with the default algorithm (argon2)
//! sitekit hash-password s3cret
//!
//! # Choose the algorithm
//! sitekit hash-password s3cret --hash-type bcrypt
//!
//! # Prompt for the password (no echo) and the algorithm
//! sitekit hash-password
//! ```

use sitekit_core::{HashAlgorithm, HashError, HashParams};

use crate::error::CliError;
use crate::prompt::Prompter;

const PASSWORD_PROMPT: &str = "Password to generate the hash for: ";

/// Password and algorithm after argument parsing and prompting.
#[derive(Debug, PartialEq, Eq)]
pub struct HashInputs {
    pub password: String,
    pub algorithm: HashAlgorithm,
}

/// Collect the password and algorithm, prompting for what is missing.
///
/// An explicit `hash_type` is validated before anything is prompted. The
/// algorithm prompt only appears when the password itself was prompted for,
/// and there an empty answer keeps the default while an unknown name is
/// rejected.
///
/// # Errors
///
/// Returns `HashError::InvalidHashType` for an unknown algorithm name,
/// `HashError::EmptyPassword` if the prompted password is empty, and
/// `CliError::Io` if the terminal cannot be read.
pub fn resolve_inputs<P: Prompter + ?Sized>(
    password: Option<String>,
    hash_type: Option<&str>,
    prompter: &mut P,
) -> Result<HashInputs, CliError> {
    let explicit = hash_type.map(str::parse::<HashAlgorithm>).transpose()?;

    if let Some(password) = password.filter(|p| !p.is_empty()) {
        return Ok(HashInputs {
            password,
            algorithm: explicit.unwrap_or_default(),
        });
    }

    let password = prompter.secret(PASSWORD_PROMPT)?;
    if password.is_empty() {
        return Err(HashError::EmptyPassword.into());
    }

    let algorithm = match explicit {
        Some(algorithm) => algorithm,
        None => {
            let prompt = format!(
                "Hash type ({}) [default: {}]: ",
                HashAlgorithm::CHOICES,
                HashAlgorithm::default()
            );
            let answer = prompter.line(&prompt)?;
            if answer.is_empty() {
                HashAlgorithm::default()
            } else {
                answer.parse()?
            }
        }
    };

    Ok(HashInputs {
        password,
        algorithm,
    })
}

/// Hash a password and print the algorithm and encoded result.
///
/// # Errors
///
/// See [`resolve_inputs`]; hashing failures surface as `CliError::Hash`.
pub fn hash_password<P: Prompter + ?Sized>(
    password: Option<String>,
    hash_type: Option<&str>,
    prompter: &mut P,
) -> Result<(), CliError> {
    let inputs = resolve_inputs(password, hash_type, prompter)?;

    tracing::debug!(algorithm = %inputs.algorithm, "Hashing password");
    let encoded = inputs
        .algorithm
        .encode(&inputs.password, &HashParams::default())?;

    report(inputs.algorithm, &encoded);
    Ok(())
}

#[allow(clippy::print_stdout)]
fn report(algorithm: HashAlgorithm, encoded: &str) {
    println!("Hash type: {algorithm}");
    println!("Hashed password: {encoded}");
}
