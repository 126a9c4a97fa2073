//! Lifecycle states for accounts and confirmation tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account lifecycle status.
///
/// An account starts `Pending` and becomes `Enabled` once a confirmation
/// token is redeemed. There is no transition back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    #[default]
    Pending,
    Enabled,
}

impl AccountStatus {
    /// Map the persisted `enabled` flag to a status.
    #[must_use]
    pub const fn from_enabled(enabled: bool) -> Self {
        if enabled { Self::Enabled } else { Self::Pending }
    }

    #[must_use]
    pub const fn is_enabled(self) -> bool {
        matches!(self, Self::Enabled)
    }
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Enabled => write!(f, "enabled"),
        }
    }
}

/// State of a confirmation token at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenState {
    /// Unconfirmed and not yet past its expiry.
    Active,
    /// Already redeemed. Takes precedence over expiry.
    Confirmed,
    /// Unconfirmed and past its expiry.
    Expired,
}

impl TokenState {
    /// Classify a token from its timestamps.
    ///
    /// A token is expired only when `now` is strictly after `expires_at`.
    #[must_use]
    pub fn at(
        confirmed_at: Option<DateTime<Utc>>,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        if confirmed_at.is_some() {
            Self::Confirmed
        } else if now > expires_at {
            Self::Expired
        } else {
            Self::Active
        }
    }
}

impl std::fmt::Display for TokenState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Confirmed => write!(f, "confirmed"),
            Self::Expired => write!(f, "expired"),
        }
    }
}
