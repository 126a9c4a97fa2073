//! CLI command implementations.
//!
//! Every command reads `ENLIST_DATABASE_URL` (falling back to
//! `DATABASE_URL`), loading `.env` first if present.

pub mod migrate;
pub mod tokens;
pub mod user;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

/// Errors that can occur while connecting to the database.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Connect to the Enlist database.
pub async fn connect() -> Result<PgPool, ConnectError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("ENLIST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| ConnectError::MissingEnvVar("ENLIST_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = enlist_server::db::create_pool(&SecretString::from(database_url)).await?;
    Ok(pool)
}
