//! Domain models for registration.
//!
//! These types represent validated domain objects separate from database row types.

pub mod token;
pub mod user;

pub use token::ConfirmationToken;
pub use user::{NewUser, User};
