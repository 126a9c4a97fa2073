//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! enlist migrate
//! ```
//!
//! # Migration Files
//!
//! Migrations live in `crates/server/migrations/`:
//! ```text
//! migrations/
//! ├── 20260301000001_create_user_account.sql
//! └── 20260301000002_create_confirmation_token.sql
//! ```

use thiserror::Error;

use super::{ConnectError, connect};

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run all pending migrations.
pub async fn run() -> Result<(), MigrationError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
