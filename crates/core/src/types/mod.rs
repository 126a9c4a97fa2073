//! Core types for Enlist.
//!
//! This module provides type-safe wrappers for the registration domain.

pub mod email;
pub mod id;
pub mod status;
pub mod token;

pub use email::{DEFAULT_EMAIL_PATTERN, Email, EmailError, EmailValidator};
pub use id::*;
pub use status::{AccountStatus, TokenState};
pub use token::{TokenId, TokenIdError};
