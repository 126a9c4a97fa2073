//! Persistence for accounts and confirmation tokens.
//!
//! # Database: `enlist`
//!
//! ## Tables
//!
//! - `user_account` - Registered accounts (unique `email`)
//! - `confirmation_token` - Issued confirmation tokens, keyed by token string
//!
//! The registration service talks to the [`UserStore`] and [`TokenStore`]
//! traits; [`PgUserStore`] and [`PgTokenStore`] are the `PostgreSQL` adapters.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p enlist-cli -- migrate
//! ```

pub mod tokens;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use enlist_core::{Email, TokenId};

use crate::models::{ConfirmationToken, NewUser, User};

pub use tokens::PgTokenStore;
pub use users::PgUserStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Account persistence.
///
/// Implementations must enforce uniqueness of `email` themselves: `save`
/// is insert-or-reject and reports a duplicate as
/// [`RepositoryError::Conflict`].
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up an account by email.
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// Insert a new, not yet enabled, account.
    async fn save(&self, user: &NewUser) -> Result<User, RepositoryError>;

    /// Mark the account as enabled. Returns the number of rows matched (0 or 1).
    ///
    /// Idempotent: an account that is already enabled still counts as matched.
    async fn enable(&self, email: &Email) -> Result<u64, RepositoryError>;
}

/// Confirmation token persistence.
///
/// A saved token stays retrievable by id until the store's own retention
/// removes it.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Insert a newly issued token.
    async fn save(&self, token: &ConfirmationToken) -> Result<(), RepositoryError>;

    /// Look up a token by its id.
    async fn find_by_id(&self, token: &TokenId)
    -> Result<Option<ConfirmationToken>, RepositoryError>;

    /// Record the redemption time of a token that has not been redeemed yet.
    ///
    /// Returns the number of rows updated; 0 means the token is unknown or was
    /// confirmed concurrently.
    async fn set_confirmed_at(
        &self,
        token: &TokenId,
        confirmed_at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a unique-constraint violation to [`RepositoryError::Conflict`].
fn conflict_or_database(err: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(err)
}
