//! Registration error types.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::hashing::HashError;

/// Errors that can occur during signup and confirmation.
///
/// Each failure the caller must react to differently is its own variant.
/// A matching signup for a pending account is not an error: it is reported
/// as [`SignUpOutcome::ConfirmationResent`](super::SignUpOutcome).
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] enlist_core::EmailError),

    /// A required field is missing or blank.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The email belongs to a confirmed account, or to an account whose
    /// details differ from the request.
    #[error("email already taken")]
    EmailTaken,

    /// No account with this email.
    #[error("user not found")]
    UserNotFound,

    /// No token with this id.
    #[error("confirmation token not found")]
    TokenNotFound,

    /// The token has already been redeemed.
    #[error("email already confirmed")]
    TokenAlreadyConfirmed,

    /// The token is past its expiry.
    #[error("confirmation token expired")]
    TokenExpired,

    /// Password hashing error.
    #[error(transparent)]
    PasswordHash(#[from] HashError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
