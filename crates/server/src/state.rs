//! Application state shared across handlers.

use std::sync::Arc;

use crate::services::RegistrationService;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Holds the registration service, which owns
/// every store and adapter the handlers reach.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    registration: RegistrationService,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(registration: RegistrationService) -> Self {
        Self {
            inner: Arc::new(AppStateInner { registration }),
        }
    }

    /// Get a reference to the registration service.
    #[must_use]
    pub fn registration(&self) -> &RegistrationService {
        &self.inner.registration
    }
}
