//! User domain types.

use chrono::{DateTime, Utc};

use enlist_core::{AccountStatus, Email, UserId};

/// A registered account (domain type).
///
/// Implements `Debug` manually to redact the password hash.
#[derive(Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address (natural key).
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    /// PHC-format password hash.
    pub password_hash: String,
    /// Whether the email has been confirmed.
    pub enabled: bool,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Lifecycle status derived from the `enabled` flag.
    #[must_use]
    pub const fn status(&self) -> AccountStatus {
        AccountStatus::from_enabled(self.enabled)
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("password_hash", &"[REDACTED]")
            .field("enabled", &self.enabled)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// A user that has not been persisted yet.
///
/// Always inserted with `enabled = false`.
#[derive(Clone)]
pub struct NewUser {
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample(enabled: bool) -> User {
        let now = Utc::now();
        User {
            id: UserId::new(7),
            email: Email::parse("ann@x.com").unwrap(),
            first_name: "Ann".to_string(),
            last_name: "Lee".to_string(),
            password_hash: "$argon2id$v=19$secret-material".to_string(),
            enabled,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_status_follows_enabled_flag() {
        assert_eq!(sample(false).status(), AccountStatus::Pending);
        assert_eq!(sample(true).status(), AccountStatus::Enabled);
    }

    #[test]
    fn test_debug_redacts_password_hash() {
        let output = format!("{:?}", sample(false));
        assert!(output.contains("ann@x.com"));
        assert!(output.contains("[REDACTED]"));
        assert!(!output.contains("secret-material"));
    }
}
