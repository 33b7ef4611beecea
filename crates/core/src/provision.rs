//! Superuser provisioning: credential resolution and the upsert procedure.
//!
//! Credentials come from explicit arguments first and fall back to the
//! `SUPERUSER_USERNAME`, `SUPERUSER_EMAIL` and `SUPERUSER_PASSWORD`
//! environment variables. Empty values count as absent everywhere.
//!
//! # Rules
//!
//! 1. `username` and `email` arguments must be given together.
//! 2. When username and email come from the environment, the password must be
//!    in the environment too.
//! 3. All three must resolve to non-empty values.
//!
//! Resolution runs before the store is touched. The upsert then performs one
//! lookup and exactly one mutation.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//!
//! use sitekit_core::provision::{self, ProvisionArgs, ProvisionError};
//!
//! let env = HashMap::from([
//!     ("SUPERUSER_USERNAME".to_owned(), "bob".to_owned()),
//!     ("SUPERUSER_EMAIL".to_owned(), "bob@x.com".to_owned()),
//! ]);
//!
//! let err = provision::resolve(&ProvisionArgs::default(), &env).unwrap_err();
//! assert!(matches!(err, ProvisionError::MissingPasswordEnv));
//! ```

use core::fmt;

use thiserror::Error;
use tracing::{debug, info};

use crate::env::{Environment, SUPERUSER_EMAIL, SUPERUSER_PASSWORD, SUPERUSER_USERNAME};
use crate::store::{AccountStore, StoreError};
use crate::types::{Account, Email, EmailError, Password, Username, UsernameError};

/// Errors that reject a provisioning run.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Only one of the `username`/`email` arguments was supplied.
    #[error("The --username and --email arguments must be used together.")]
    PairedArguments,

    /// Username and email came from the environment without a password.
    #[error(
        "If SUPERUSER_USERNAME and SUPERUSER_EMAIL are set, SUPERUSER_PASSWORD must also be set as an environment variable."
    )]
    MissingPasswordEnv,

    /// A credential did not resolve from any source.
    #[error(
        "You must provide username, email, and password. This can be done via command-line arguments or SUPERUSER_* environment variables."
    )]
    IncompleteCredentials,

    /// A credential was supplied but does not fit the account table.
    #[error("Invalid superuser credentials: {0}")]
    InvalidCredentials(String),

    /// The store rejected the new account as a duplicate.
    #[error(
        "Could not create superuser '{username}'. A user with that username or email may already exist with a different case."
    )]
    Conflict {
        /// The username that was requested.
        username: String,
    },

    /// Any other store failure.
    #[error("An unexpected error occurred: {0}")]
    Internal(String),
}

/// Explicit command-line credentials. Any field may be absent.
#[derive(Clone, Default)]
pub struct ProvisionArgs {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for ProvisionArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvisionArgs")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// A fully resolved set of credentials.
#[derive(Debug, Clone)]
pub struct ProvisioningRequest {
    pub username: Username,
    pub email: Email,
    pub password: Password,
}

/// Result of a successful upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No account had the username; a new superuser was created.
    Created(Account),
    /// An existing account was updated and granted superuser rights.
    Updated(Account),
}

impl Outcome {
    /// The account as it is now stored.
    #[must_use]
    pub const fn account(&self) -> &Account {
        match self {
            Self::Created(account) | Self::Updated(account) => account,
        }
    }

    #[must_use]
    pub const fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }

    /// Operator-facing confirmation line.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Created(account) => {
                format!("Successfully created superuser \"{}\".", account.username)
            }
            Self::Updated(account) => format!(
                "Superuser \"{}\" already exists. Password, email, and admin rights have been updated/ensured.",
                account.username
            ),
        }
    }
}

/// Merge explicit arguments with environment fallbacks and validate.
///
/// Reads `env` and writes nothing. Rejections are logged at `debug`.
///
/// # Errors
///
/// Returns the first violated rule: `PairedArguments`, then
/// `MissingPasswordEnv`, then `IncompleteCredentials`. A value that is
/// present but too long for its column is `InvalidCredentials`.
pub fn resolve<E: Environment + ?Sized>(
    args: &ProvisionArgs,
    env: &E,
) -> Result<ProvisioningRequest, ProvisionError> {
    resolve_credentials(args, env)
        .inspect_err(|e| debug!(error = %e, "Rejected superuser credentials"))
}

fn resolve_credentials<E: Environment + ?Sized>(
    args: &ProvisionArgs,
    env: &E,
) -> Result<ProvisioningRequest, ProvisionError> {
    let arg_username = non_empty(args.username.as_deref());
    let arg_email = non_empty(args.email.as_deref());
    let arg_password = non_empty(args.password.as_deref());

    if arg_username.is_some() != arg_email.is_some() {
        return Err(ProvisionError::PairedArguments);
    }

    let env_username = env.non_empty_var(SUPERUSER_USERNAME);
    let env_email = env.non_empty_var(SUPERUSER_EMAIL);
    let env_password = env.non_empty_var(SUPERUSER_PASSWORD);

    if arg_username.is_none()
        && env_username.is_some()
        && env_email.is_some()
        && env_password.is_none()
    {
        return Err(ProvisionError::MissingPasswordEnv);
    }

    let username = arg_username.or(env_username);
    let email = arg_email.or(env_email);
    let password = arg_password.or(env_password);

    let (Some(username), Some(email), Some(password)) = (username, email, password) else {
        return Err(ProvisionError::IncompleteCredentials);
    };

    let request = ProvisioningRequest {
        username: Username::parse(&username).map_err(|e| match e {
            UsernameError::Empty => ProvisionError::IncompleteCredentials,
            UsernameError::TooLong { .. } => ProvisionError::InvalidCredentials(e.to_string()),
        })?,
        email: Email::parse(&email).map_err(|e| match e {
            EmailError::Empty => ProvisionError::IncompleteCredentials,
            EmailError::TooLong { .. } => ProvisionError::InvalidCredentials(e.to_string()),
        })?,
        password: Password::new(password).map_err(|_| ProvisionError::IncompleteCredentials)?,
    };

    debug!(username = %request.username, "Resolved superuser credentials");
    Ok(request)
}

/// Make the store hold a superuser matching `request`.
///
/// # Errors
///
/// Returns `ProvisionError::Conflict` if creation hits a uniqueness violation
/// and `ProvisionError::Internal` for every other store failure.
pub async fn upsert<S: AccountStore>(
    store: &S,
    request: &ProvisioningRequest,
) -> Result<Outcome, ProvisionError> {
    let existing = store
        .find_by_username(&request.username)
        .await
        .map_err(internal)?;

    if let Some(account) = existing {
        let account = store
            .update_superuser(account.id, &request.email, &request.password)
            .await
            .map_err(internal)?;

        info!(username = %account.username, id = %account.id, "Superuser updated");
        return Ok(Outcome::Updated(account));
    }

    info!(username = %request.username, "Superuser not found. Creating a new one.");
    let account = store
        .create_superuser(&request.username, &request.email, &request.password)
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => ProvisionError::Conflict {
                username: request.username.to_string(),
            },
            other => internal(other),
        })?;

    info!(username = %account.username, id = %account.id, "Superuser created");
    Ok(Outcome::Created(account))
}

/// Resolve credentials, then upsert.
///
/// # Errors
///
/// See [`resolve`] and [`upsert`].
pub async fn run<E, S>(
    args: &ProvisionArgs,
    env: &E,
    store: &S,
) -> Result<Outcome, ProvisionError>
where
    E: Environment + ?Sized,
    S: AccountStore,
{
    let request = resolve(args, env)?;
    upsert(store, &request).await
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_owned)
}

#[allow(clippy::needless_pass_by_value)]
fn internal(error: StoreError) -> ProvisionError {
    ProvisionError::Internal(error.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use tracing_subscriber::layer::SubscriberExt;

    use super::*;
    use crate::hashers::{self, HashAlgorithm, HashParams};
    use crate::store::MemoryAccountStore;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn args(username: Option<&str>, email: Option<&str>, password: Option<&str>) -> ProvisionArgs {
        ProvisionArgs {
            username: username.map(str::to_owned),
            email: email.map(str::to_owned),
            password: password.map(str::to_owned),
        }
    }

    /// Records the level and formatted fields of every event.
    struct CapturingLayer {
        events: Arc<Mutex<Vec<(tracing::Level, String)>>>,
    }

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for CapturingLayer {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            struct FieldVisitor(String);

            impl tracing::field::Visit for FieldVisitor {
                fn record_debug(
                    &mut self,
                    field: &tracing::field::Field,
                    value: &dyn std::fmt::Debug,
                ) {
                    self.0.push_str(&format!("{}={value:?} ", field.name()));
                }
            }

            let mut visitor = FieldVisitor(String::new());
            event.record(&mut visitor);
            self.events
                .lock()
                .unwrap()
                .push((*event.metadata().level(), visitor.0));
        }
    }

    fn with_captured_events<F, R>(f: F) -> (R, Vec<(tracing::Level, String)>)
    where
        F: FnOnce() -> R,
    {
        let events = Arc::new(Mutex::new(Vec::new()));
        let layer = CapturingLayer {
            events: Arc::clone(&events),
        };
        let subscriber = tracing_subscriber::registry().with(layer);
        let result = tracing::subscriber::with_default(subscriber, f);
        let captured = events.lock().unwrap().clone();
        (result, captured)
    }

    fn store() -> MemoryAccountStore {
        MemoryAccountStore::with_hasher(
            HashAlgorithm::Pbkdf2Sha256,
            HashParams {
                pbkdf2_sha256_iterations: 1_000,
                ..HashParams::default()
            },
        )
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    #[test]
    fn test_all_arguments() {
        let request = resolve(
            &args(Some("alice"), Some("alice@x.com"), Some("secret")),
            &env(&[]),
        )
        .unwrap();

        assert_eq!(request.username.as_str(), "alice");
        assert_eq!(request.email.as_str(), "alice@x.com");
        assert_eq!(request.password.expose(), "secret");
    }

    #[test]
    fn test_username_without_email_is_rejected() {
        let err = resolve(&args(Some("alice"), None, Some("pw")), &env(&[])).unwrap_err();
        assert!(matches!(err, ProvisionError::PairedArguments));
    }

    #[test]
    fn test_email_without_username_is_rejected() {
        // The environment cannot complete a half-given pair
        let err = resolve(
            &args(None, Some("alice@x.com"), Some("pw")),
            &env(&[(SUPERUSER_USERNAME, "alice")]),
        )
        .unwrap_err();
        assert!(matches!(err, ProvisionError::PairedArguments));
    }

    #[test]
    fn test_paired_check_runs_before_env_check() {
        let err = resolve(
            &args(Some("alice"), None, None),
            &env(&[(SUPERUSER_USERNAME, "bob"), (SUPERUSER_EMAIL, "bob@x.com")]),
        )
        .unwrap_err();
        assert!(matches!(err, ProvisionError::PairedArguments));
    }

    #[test]
    fn test_env_username_and_email_without_password() {
        let err = resolve(
            &ProvisionArgs::default(),
            &env(&[(SUPERUSER_USERNAME, "bob"), (SUPERUSER_EMAIL, "bob@x.com")]),
        )
        .unwrap_err();
        assert!(matches!(err, ProvisionError::MissingPasswordEnv));
    }

    #[test]
    fn test_env_pair_requires_env_password_even_with_password_argument() {
        let err = resolve(
            &args(None, None, Some("secret")),
            &env(&[(SUPERUSER_USERNAME, "bob"), (SUPERUSER_EMAIL, "bob@x.com")]),
        )
        .unwrap_err();
        assert!(matches!(err, ProvisionError::MissingPasswordEnv));
    }

    #[test]
    fn test_all_from_env() {
        let request = resolve(
            &ProvisionArgs::default(),
            &env(&[
                (SUPERUSER_USERNAME, "bob"),
                (SUPERUSER_EMAIL, "bob@x.com"),
                (SUPERUSER_PASSWORD, "hunter2"),
            ]),
        )
        .unwrap();

        assert_eq!(request.username.as_str(), "bob");
        assert_eq!(request.password.expose(), "hunter2");
    }

    #[test]
    fn test_arguments_override_env() {
        let request = resolve(
            &args(Some("alice"), Some("alice@x.com"), Some("argpw")),
            &env(&[
                (SUPERUSER_USERNAME, "bob"),
                (SUPERUSER_EMAIL, "bob@x.com"),
                (SUPERUSER_PASSWORD, "envpw"),
            ]),
        )
        .unwrap();

        assert_eq!(request.username.as_str(), "alice");
        assert_eq!(request.email.as_str(), "alice@x.com");
        assert_eq!(request.password.expose(), "argpw");
    }

    #[test]
    fn test_argument_pair_with_env_password() {
        let request = resolve(
            &args(Some("alice"), Some("alice@x.com"), None),
            &env(&[(SUPERUSER_PASSWORD, "envpw")]),
        )
        .unwrap();
        assert_eq!(request.password.expose(), "envpw");
    }

    #[test]
    fn test_argument_pair_without_any_password() {
        let err = resolve(&args(Some("alice"), Some("alice@x.com"), None), &env(&[]))
            .unwrap_err();
        assert!(matches!(err, ProvisionError::IncompleteCredentials));
    }

    #[test]
    fn test_nothing_supplied() {
        let err = resolve(&ProvisionArgs::default(), &env(&[])).unwrap_err();
        assert!(matches!(err, ProvisionError::IncompleteCredentials));
    }

    #[test]
    fn test_only_env_username() {
        let err = resolve(
            &ProvisionArgs::default(),
            &env(&[(SUPERUSER_USERNAME, "bob"), (SUPERUSER_PASSWORD, "pw")]),
        )
        .unwrap_err();
        assert!(matches!(err, ProvisionError::IncompleteCredentials));
    }

    #[test]
    fn test_empty_values_count_as_absent() {
        // An empty --username behaves as if it was not passed
        let err = resolve(&args(Some(""), Some("alice@x.com"), Some("pw")), &env(&[]))
            .unwrap_err();
        assert!(matches!(err, ProvisionError::PairedArguments));

        let err = resolve(
            &args(Some("alice"), Some("alice@x.com"), Some("")),
            &env(&[(SUPERUSER_PASSWORD, "")]),
        )
        .unwrap_err();
        assert!(matches!(err, ProvisionError::IncompleteCredentials));

        let err = resolve(
            &ProvisionArgs::default(),
            &env(&[
                (SUPERUSER_USERNAME, "bob"),
                (SUPERUSER_EMAIL, "bob@x.com"),
                (SUPERUSER_PASSWORD, ""),
            ]),
        )
        .unwrap_err();
        assert!(matches!(err, ProvisionError::MissingPasswordEnv));
    }

    #[test]
    fn test_overlong_username_is_invalid() {
        let long = "u".repeat(151);
        let err = resolve(&args(Some(&long), Some("u@x.com"), Some("pw")), &env(&[]))
            .unwrap_err();

        assert!(matches!(err, ProvisionError::InvalidCredentials(_)));
        assert_eq!(
            err.to_string(),
            "Invalid superuser credentials: username must be at most 150 characters"
        );
    }

    #[test]
    fn test_overlong_env_email_is_invalid() {
        let long = format!("{}@x.com", "e".repeat(250));
        let vars = env(&[
            ("SUPERUSER_USERNAME", "bob"),
            ("SUPERUSER_EMAIL", &long),
            ("SUPERUSER_PASSWORD", "pw"),
        ]);
        let err = resolve(&ProvisionArgs::default(), &vars).unwrap_err();

        assert_eq!(
            err.to_string(),
            "Invalid superuser credentials: email must be at most 254 characters"
        );
    }

    #[test]
    fn test_rejection_logged_at_debug_without_password() {
        let (result, events) = with_captured_events(|| {
            resolve(&args(Some("alice"), None, Some("topsecret")), &env(&[]))
        });

        assert!(matches!(result, Err(ProvisionError::PairedArguments)));
        assert_eq!(events.len(), 1);
        let (level, fields) = events.first().unwrap();
        assert_eq!(*level, tracing::Level::DEBUG);
        assert!(fields.contains("Rejected superuser credentials"));
        assert!(fields.contains("--username and --email"));
        assert!(!fields.contains("topsecret"));
    }

    #[test]
    fn test_args_debug_redacts_password() {
        let debug = format!("{:?}", args(Some("alice"), None, Some("topsecret")));
        assert!(debug.contains("alice"));
        assert!(!debug.contains("topsecret"));
    }

    // =========================================================================
    // Upsert
    // =========================================================================

    #[tokio::test]
    async fn test_upsert_creates_then_updates() {
        let store = store();
        let request = resolve(
            &args(Some("alice"), Some("alice@x.com"), Some("secret")),
            &env(&[]),
        )
        .unwrap();

        let first = upsert(&store, &request).await.unwrap();
        assert!(first.is_created());
        assert!(first.account().is_privileged());

        let second = upsert(&store, &request).await.unwrap();
        assert!(!second.is_created());
        assert_eq!(second.account().id, first.account().id);
        assert_eq!(store.accounts().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_update_changes_password_hash() {
        let store = store();
        let user = store
            .insert_user(
                &Username::parse("carol").unwrap(),
                None,
                &Password::new("old").unwrap(),
            )
            .unwrap();

        let request = resolve(
            &args(Some("carol"), Some("carol@x.com"), Some("new")),
            &env(&[]),
        )
        .unwrap();
        let outcome = upsert(&store, &request).await.unwrap();

        let account = outcome.account();
        assert!(matches!(outcome, Outcome::Updated(_)));
        assert!(account.is_privileged());
        assert_ne!(account.password, user.password);
        assert!(hashers::verify("new", &account.password).unwrap());
    }

    #[tokio::test]
    async fn test_upsert_conflict_names_username() {
        let store = store();
        store
            .insert_user(
                &Username::parse("Alice").unwrap(),
                None,
                &Password::new("pw").unwrap(),
            )
            .unwrap();

        let request = resolve(
            &args(Some("alice"), Some("alice@x.com"), Some("pw")),
            &env(&[]),
        )
        .unwrap();
        let err = upsert(&store, &request).await.unwrap_err();

        match err {
            ProvisionError::Conflict { username } => assert_eq!(username, "alice"),
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_rejects_before_touching_store() {
        let store = store();
        let err = run(&args(Some("alice"), None, None), &env(&[]), &store)
            .await
            .unwrap_err();

        assert!(matches!(err, ProvisionError::PairedArguments));
        assert!(store.accounts().unwrap().is_empty());
    }

    #[test]
    fn test_outcome_messages() {
        let account = Account {
            id: crate::types::AccountId::new(1),
            username: Username::parse("alice").unwrap(),
            email: None,
            password: String::new(),
            is_staff: true,
            is_superuser: true,
            is_active: true,
            date_joined: chrono::Utc::now(),
        };

        assert_eq!(
            Outcome::Created(account.clone()).message(),
            "Successfully created superuser \"alice\"."
        );
        assert!(
            Outcome::Updated(account)
                .message()
                .starts_with("Superuser \"alice\" already exists.")
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ProvisionError::MissingPasswordEnv.to_string(),
            "If SUPERUSER_USERNAME and SUPERUSER_EMAIL are set, SUPERUSER_PASSWORD must also be set as an environment variable."
        );
        assert_eq!(
            ProvisionError::IncompleteCredentials.to_string(),
            "You must provide username, email, and password. This can be done via command-line arguments or SUPERUSER_* environment variables."
        );
        assert_eq!(
            ProvisionError::Internal("boom".to_owned()).to_string(),
            "An unexpected error occurred: boom"
        );
    }
}
