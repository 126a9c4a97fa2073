//! Confirmation token maintenance.
//!
//! Expired tokens are never deleted by the server; confirming one is simply
//! refused. This command removes the ones nobody redeemed.

use chrono::Utc;
use thiserror::Error;

use enlist_server::db::{PgTokenStore, RepositoryError};

use super::{ConnectError, connect};

/// Errors that can occur during token maintenance.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Delete unconfirmed tokens whose expiry has passed.
pub async fn purge() -> Result<(), TokenError> {
    let pool = connect().await?;
    let store = PgTokenStore::new(pool);

    let deleted = store.delete_expired(Utc::now()).await?;

    tracing::info!(deleted, "Expired confirmation tokens purged");

    #[allow(clippy::print_stdout)]
    {
        println!("Deleted {deleted} expired confirmation token(s)");
    }

    Ok(())
}
