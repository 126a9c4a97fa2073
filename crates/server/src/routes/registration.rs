//! Registration route handlers.
//!
//! Signup is a JSON API; confirmation is reached from the emailed link and
//! answers with an HTML page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use enlist_core::TokenId;

use crate::error::{AppError, Result};
use crate::services::{SignUpOutcome, SignUpRequest};
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Body returned by a successful signup.
#[derive(Debug, Serialize)]
pub struct SignUpResponse {
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

/// Query parameters of the confirmation link.
#[derive(Debug, Deserialize)]
pub struct ConfirmParams {
    pub token: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Page shown after a successful confirmation.
#[derive(Template, WebTemplate)]
#[template(path = "registration/confirmed.html")]
pub struct ConfirmedTemplate {
    pub email: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Create a pending account, or resend the confirmation email.
///
/// `201 Created` for a new account, `202 Accepted` when the confirmation was
/// resent to a matching pending account.
#[instrument(skip(state, payload))]
pub async fn sign_up(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SignUpResponse>)> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let outcome = state.registration().sign_up(&request).await?;

    let response = match outcome {
        SignUpOutcome::Registered { token } => (
            StatusCode::CREATED,
            Json(SignUpResponse {
                token: token.to_string(),
                message: None,
            }),
        ),
        SignUpOutcome::ConfirmationResent { token } => (
            StatusCode::ACCEPTED,
            Json(SignUpResponse {
                token: token.to_string(),
                message: Some("Your account is awaiting confirmation. We sent you a new link."),
            }),
        ),
    };

    Ok(response)
}

/// Redeem a confirmation token.
#[instrument(skip(state, params))]
pub async fn confirm(
    State(state): State<AppState>,
    Query(params): Query<ConfirmParams>,
) -> Result<ConfirmedTemplate> {
    let raw = params
        .token
        .ok_or_else(|| AppError::BadRequest("missing token".to_string()))?;
    let token =
        TokenId::parse(&raw).map_err(|e| AppError::BadRequest(format!("invalid token: {e}")))?;

    let confirmation = state.registration().confirm_token(&token).await?;

    Ok(ConfirmedTemplate {
        email: confirmation.email.into_inner(),
    })
}
