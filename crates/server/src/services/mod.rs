//! Business logic services.
//!
//! # Services
//!
//! - `registration` - Signup, token issuance/reissuance, and confirmation
//! - `email` - Confirmation email rendering and delivery
//! - `hashing` - One-way password hashing
//! - `clock` - Injectable time source

pub mod clock;
pub mod email;
pub mod hashing;
pub mod registration;

pub use clock::{Clock, SystemClock};
pub use email::{LogMailer, MailError, MailSender, SmtpMailer};
pub use hashing::{Argon2Hasher, CredentialHasher, HashError};
pub use registration::{
    Confirmation, RegistrationError, RegistrationService, RegistrationSettings, SignUpOutcome,
    SignUpRequest,
};
