//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                         - Liveness check
//!
//! # Registration
//! POST /registration                   - Sign up (JSON)
//! GET  /registration/confirm?token=... - Redeem a confirmation link (HTML)
//! ```

pub mod registration;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the registration routes router.
pub fn registration_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(registration::sign_up))
        .route("/confirm", get(registration::confirm))
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/registration", registration_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}
