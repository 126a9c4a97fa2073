//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::RegistrationError;

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Registration operation failed.
    #[error("Registration error: {0}")]
    Registration(#[from] RegistrationError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl AppError {
    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Registration(
                RegistrationError::Repository(_) | RegistrationError::PasswordHash(_)
            )
        )
    }

    /// HTTP status and stable machine-readable code.
    const fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            Self::Registration(err) => match err {
                RegistrationError::InvalidEmail(_) => (StatusCode::BAD_REQUEST, "invalid_email"),
                RegistrationError::InvalidRequest(_) => {
                    (StatusCode::BAD_REQUEST, "invalid_request")
                }
                RegistrationError::EmailTaken => (StatusCode::CONFLICT, "email_taken"),
                RegistrationError::UserNotFound => (StatusCode::NOT_FOUND, "user_not_found"),
                RegistrationError::TokenNotFound => (StatusCode::NOT_FOUND, "token_not_found"),
                RegistrationError::TokenAlreadyConfirmed => {
                    (StatusCode::CONFLICT, "already_confirmed")
                }
                RegistrationError::TokenExpired => (StatusCode::GONE, "token_expired"),
                RegistrationError::PasswordHash(_) | RegistrationError::Repository(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal")
                }
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let (status, code) = self.status_and_code();

        // Don't expose internal error details to clients
        let message = match &self {
            _ if self.is_server_error() => "Internal server error".to_string(),
            Self::Registration(RegistrationError::InvalidEmail(_)) => {
                "Invalid email address".to_string()
            }
            Self::Registration(RegistrationError::InvalidRequest(msg)) | Self::BadRequest(msg) => {
                msg.clone()
            }
            Self::Registration(RegistrationError::EmailTaken) => {
                "An account with this email already exists".to_string()
            }
            Self::Registration(err) => err.to_string(),
        };

        (status, Json(ErrorBody { error: code, message })).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
