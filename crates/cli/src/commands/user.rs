//! Account lookup.
//!
//! # Usage
//!
//! ```bash
//! enlist user show -e ann@example.com
//! ```
//!
//! The address is checked against `ENLIST_EMAIL_PATTERN` when set, the same
//! pattern the server validates signups with.

use thiserror::Error;

use enlist_core::{Email, EmailError, EmailValidator};
use enlist_server::db::{PgUserStore, RepositoryError, UserStore};

use super::{ConnectError, connect};

/// Errors that can occur during account lookup.
#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// `ENLIST_EMAIL_PATTERN` does not compile.
    #[error("Invalid ENLIST_EMAIL_PATTERN: {0}")]
    InvalidPattern(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// No account with this email.
    #[error("No account with email: {0}")]
    NotFound(String),
}

/// Print an account's details and status.
pub async fn show(email: &str) -> Result<(), UserError> {
    dotenvy::dotenv().ok();
    let pattern = std::env::var("ENLIST_EMAIL_PATTERN").ok();
    let email = parse_email(email, pattern.as_deref())?;

    let pool = connect().await?;
    let store = PgUserStore::new(pool);

    let user = store
        .find_by_email(&email)
        .await?
        .ok_or_else(|| UserError::NotFound(email.to_string()))?;

    #[allow(clippy::print_stdout)]
    {
        println!("id:         {}", user.id);
        println!("email:      {}", user.email);
        println!("name:       {} {}", user.first_name, user.last_name);
        println!("status:     {}", user.status());
        println!("created at: {}", user.created_at.to_rfc3339());
        println!("updated at: {}", user.updated_at.to_rfc3339());
    }

    Ok(())
}

fn parse_email(raw: &str, pattern: Option<&str>) -> Result<Email, UserError> {
    let validator = match pattern {
        Some(pattern) => {
            EmailValidator::new(pattern).map_err(|e| UserError::InvalidPattern(e.to_string()))?
        }
        None => EmailValidator::default(),
    };
    Ok(Email::parse_with(raw.trim(), &validator)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const INTERNAL_DOMAINS: &str = r"^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.internal$";

    #[test]
    fn test_default_pattern_without_override() {
        let email = parse_email(" ann@x.com ", None).unwrap();
        assert_eq!(email.as_str(), "ann@x.com");
        assert!(matches!(
            parse_email("ann@corp.internal", None),
            Err(UserError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_configured_pattern_is_honoured() {
        let email = parse_email("ann@corp.internal", Some(INTERNAL_DOMAINS)).unwrap();
        assert_eq!(email.as_str(), "ann@corp.internal");
        assert!(matches!(
            parse_email("ann@x.com", Some(INTERNAL_DOMAINS)),
            Err(UserError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_broken_pattern_is_reported() {
        assert!(matches!(
            parse_email("ann@x.com", Some("([unclosed")),
            Err(UserError::InvalidPattern(_))
        ));
    }
}
