//! Account store over the application's user table.
//!
//! Table and column names come from validated [`Identifier`]s, so queries
//! are built at runtime and bound with `sqlx::query_as`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use sitekit_core::{
    Account, AccountId, AccountStore, Email, HashAlgorithm, HashParams, Password, StoreError,
    Username,
};

use crate::config::Identifier;

const RETURNING_COLUMNS: &str =
    "id, username, email, password, is_staff, is_superuser, is_active, date_joined";

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` account queries.
#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: AccountId,
    username: String,
    email: String,
    password: String,
    is_staff: bool,
    is_superuser: bool,
    is_active: bool,
    date_joined: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let username = Username::parse(&row.username).map_err(|e| {
            StoreError::DataCorruption(format!("invalid username in database: {e}"))
        })?;

        let email = if row.email.is_empty() {
            None
        } else {
            Some(Email::parse(&row.email).map_err(|e| {
                StoreError::DataCorruption(format!("invalid email in database: {e}"))
            })?)
        };

        Ok(Self {
            id: row.id,
            username,
            email,
            password: row.password,
            is_staff: row.is_staff,
            is_superuser: row.is_superuser,
            is_active: row.is_active,
            date_joined: row.date_joined,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// `PostgreSQL` account store.
pub struct PgAccountStore<'a> {
    pool: &'a PgPool,
    table: &'a Identifier,
    blank_columns: &'a [Identifier],
    hasher: HashAlgorithm,
    params: HashParams,
}

impl<'a> PgAccountStore<'a> {
    /// Create a new account store hashing with production costs.
    #[must_use]
    pub fn new(
        pool: &'a PgPool,
        table: &'a Identifier,
        blank_columns: &'a [Identifier],
        hasher: HashAlgorithm,
    ) -> Self {
        Self {
            pool,
            table,
            blank_columns,
            hasher,
            params: HashParams::default(),
        }
    }

    fn hash(&self, password: &Password) -> Result<String, StoreError> {
        Ok(self.hasher.encode(password.expose(), &self.params)?)
    }
}

fn select_by_username_sql(table: &Identifier) -> String {
    format!("SELECT {RETURNING_COLUMNS} FROM {table} WHERE username = $1")
}

fn insert_sql(table: &Identifier, blank_columns: &[Identifier]) -> String {
    let mut columns =
        String::from("password, is_superuser, username, email, is_staff, is_active, date_joined");
    let mut values = String::from("$1, TRUE, $2, $3, TRUE, TRUE, NOW()");
    for column in blank_columns {
        columns.push_str(", ");
        columns.push_str(column.as_str());
        values.push_str(", ''");
    }

    format!("INSERT INTO {table} ({columns}) VALUES ({values}) RETURNING {RETURNING_COLUMNS}")
}

fn update_sql(table: &Identifier) -> String {
    format!(
        "UPDATE {table} SET email = $2, password = $3, is_staff = TRUE, is_superuser = TRUE \
         WHERE id = $1 RETURNING {RETURNING_COLUMNS}"
    )
}

impl AccountStore for PgAccountStore<'_> {
    async fn find_by_username(&self, username: &Username) -> Result<Option<Account>, StoreError> {
        let sql = select_by_username_sql(self.table);
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(username.as_str())
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn create_superuser(
        &self,
        username: &Username,
        email: &Email,
        password: &Password,
    ) -> Result<Account, StoreError> {
        let password_hash = self.hash(password)?;
        let sql = insert_sql(self.table, self.blank_columns);

        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(password_hash)
            .bind(username.as_str())
            .bind(email.normalized().into_inner())
            .fetch_one(self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return StoreError::Conflict("username or email already exists".to_owned());
                }
                StoreError::Database(e)
            })?;

        row.try_into()
    }

    async fn update_superuser(
        &self,
        id: AccountId,
        email: &Email,
        password: &Password,
    ) -> Result<Account, StoreError> {
        let password_hash = self.hash(password)?;
        let sql = update_sql(self.table);

        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(id)
            .bind(email.as_str())
            .bind(password_hash)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return StoreError::Conflict("email already exists".to_owned());
                }
                StoreError::Database(e)
            })?
            .ok_or(StoreError::NotFound)?;

        row.try_into()
    }
}
