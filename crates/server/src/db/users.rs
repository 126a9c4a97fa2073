//! `PostgreSQL` account store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use enlist_core::{Email, UserId};

use super::{RepositoryError, UserStore, conflict_or_database};
use crate::models::{NewUser, User};

/// Internal row type for database queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: UserId,
    email: Email,
    first_name: String,
    last_name: String,
    password_hash: String,
    enabled: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            password_hash: row.password_hash,
            enabled: row.enabled,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Account store backed by `enlist.user_account`.
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Create a new account store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, first_name, last_name, password_hash, enabled,
                   created_at, updated_at
            FROM enlist.user_account
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn save(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO enlist.user_account (email, first_name, last_name, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, first_name, last_name, password_hash, enabled,
                      created_at, updated_at
            ",
        )
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or_database(e, "email"))?;

        Ok(row.into())
    }

    async fn enable(&self, email: &Email) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE enlist.user_account
            SET enabled = TRUE, updated_at = NOW()
            WHERE email = $1
            ",
        )
        .bind(email)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
