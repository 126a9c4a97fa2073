//! `PostgreSQL` confirmation token store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use enlist_core::{Email, TokenId};

use super::{RepositoryError, TokenStore, conflict_or_database};
use crate::models::ConfirmationToken;

/// Internal row type for database queries.
#[derive(Debug, sqlx::FromRow)]
struct TokenRow {
    token: TokenId,
    owner_email: Email,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    confirmed_at: Option<DateTime<Utc>>,
}

impl From<TokenRow> for ConfirmationToken {
    fn from(row: TokenRow) -> Self {
        Self {
            token: row.token,
            owner_email: row.owner_email,
            created_at: row.created_at,
            expires_at: row.expires_at,
            confirmed_at: row.confirmed_at,
        }
    }
}

/// Token store backed by `enlist.confirmation_token`.
#[derive(Debug, Clone)]
pub struct PgTokenStore {
    pool: PgPool,
}

impl PgTokenStore {
    /// Create a new token store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Delete unconfirmed tokens whose expiry is before `now` (cleanup).
    ///
    /// Confirmed tokens are kept as the record of when an account was
    /// confirmed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM enlist.confirmation_token
            WHERE confirmed_at IS NULL AND expires_at < $1
            ",
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl TokenStore for PgTokenStore {
    async fn save(&self, token: &ConfirmationToken) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO enlist.confirmation_token
                (token, owner_email, created_at, expires_at, confirmed_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(&token.token)
        .bind(&token.owner_email)
        .bind(token.created_at)
        .bind(token.expires_at)
        .bind(token.confirmed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_or_database(e, "token"))?;

        Ok(())
    }

    async fn find_by_id(
        &self,
        token: &TokenId,
    ) -> Result<Option<ConfirmationToken>, RepositoryError> {
        let row = sqlx::query_as::<_, TokenRow>(
            r"
            SELECT token, owner_email, created_at, expires_at, confirmed_at
            FROM enlist.confirmation_token
            WHERE token = $1
            ",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ConfirmationToken::from))
    }

    async fn set_confirmed_at(
        &self,
        token: &TokenId,
        confirmed_at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE enlist.confirmation_token
            SET confirmed_at = $2
            WHERE token = $1 AND confirmed_at IS NULL
            ",
        )
        .bind(token)
        .bind(confirmed_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
