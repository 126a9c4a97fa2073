//! Confirmation token domain type.

use chrono::{DateTime, Duration, Utc};

use enlist_core::{Email, TokenId, TokenState};

/// A time-limited credential proving control of an email address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationToken {
    pub token: TokenId,
    /// Email of the account this token confirms.
    pub owner_email: Email,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Set exactly once, when the token is redeemed.
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl ConfirmationToken {
    /// Issue a fresh random token for `owner_email`, valid for `ttl` from `now`.
    ///
    /// An expiry past the representable range saturates at the latest instant.
    #[must_use]
    pub fn issue(owner_email: Email, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            token: TokenId::generate(),
            owner_email,
            created_at: now,
            expires_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
            confirmed_at: None,
        }
    }

    /// State of this token at `now`.
    #[must_use]
    pub fn state_at(&self, now: DateTime<Utc>) -> TokenState {
        TokenState::at(self.confirmed_at, self.expires_at, now)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_sets_expiry_from_ttl() {
        let now = Utc::now();
        let token = ConfirmationToken::issue(
            Email::parse("ann@x.com").unwrap(),
            now,
            Duration::minutes(15),
        );

        assert_eq!(token.created_at, now);
        assert_eq!(token.expires_at, now + Duration::minutes(15));
        assert!(token.confirmed_at.is_none());
        assert_eq!(token.state_at(now), TokenState::Active);
        assert_eq!(
            token.state_at(now + Duration::minutes(16)),
            TokenState::Expired
        );
    }

    #[test]
    fn test_issue_with_huge_ttl_saturates() {
        let now = Utc::now();
        let token =
            ConfirmationToken::issue(Email::parse("ann@x.com").unwrap(), now, Duration::MAX);

        assert_eq!(token.expires_at, DateTime::<Utc>::MAX_UTC);
        assert_eq!(token.state_at(now), TokenState::Active);
    }

    #[test]
    fn test_issue_generates_distinct_tokens() {
        let now = Utc::now();
        let email = Email::parse("ann@x.com").unwrap();
        let first = ConfirmationToken::issue(email.clone(), now, Duration::minutes(15));
        let second = ConfirmationToken::issue(email, now, Duration::minutes(15));
        assert_ne!(first.token, second.token);
    }
}
