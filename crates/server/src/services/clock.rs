//! Time source for token issuance and expiry checks.

use chrono::{DateTime, Utc};

/// Supplies the current instant.
///
/// The registration service never calls `Utc::now()` directly so that expiry
/// can be tested against a fixed clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
