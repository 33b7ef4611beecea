//! Account record as held by an account store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AccountId, Email, Username};

/// A user account.
///
/// `password` is the encoded hash (`<algorithm>$...`), never plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub username: Username,
    /// `None` when the stored address is blank.
    pub email: Option<Email>,
    pub password: String,
    /// Staff accounts may log into the admin panel.
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
}

impl Account {
    /// Whether the account carries both elevated privilege flags.
    #[must_use]
    pub const fn is_privileged(&self) -> bool {
        self.is_staff && self.is_superuser
    }
}
