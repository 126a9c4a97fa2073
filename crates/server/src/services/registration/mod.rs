//! Registration service.
//!
//! Owns the account lifecycle: signup creates a pending account and emails a
//! confirmation link, and redeeming the link's token enables the account.
//!
//! ```text
//! signup ──► (no account) ──────────────► create pending user + token, send ──► Registered
//!        ──► (pending, same details) ───► new token, send ─────────────────────► ConfirmationResent
//!        ──► (enabled, or different) ───► EmailTaken
//!
//! confirm ─► unknown ─► TokenNotFound
//!         ─► redeemed ─► TokenAlreadyConfirmed
//!         ─► expired ──► TokenExpired
//!         ─► active ───► enable user, set confirmed_at
//! ```

mod error;

pub use error::RegistrationError;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use url::Url;

use enlist_core::{Email, EmailValidator, TokenId, TokenState};

use crate::db::{RepositoryError, TokenStore, UserStore};
use crate::models::{ConfirmationToken, NewUser, User};
use crate::services::clock::Clock;
use crate::services::email::{MailSender, render_confirmation_email};
use crate::services::hashing::CredentialHasher;

/// Path of the confirmation endpoint, relative to the base URL.
const CONFIRM_PATH: [&str; 2] = ["registration", "confirm"];

/// Values the service needs from configuration.
#[derive(Debug, Clone)]
pub struct RegistrationSettings {
    base_url: Url,
    token_ttl: Duration,
    validator: EmailValidator,
}

impl RegistrationSettings {
    /// Default lifetime of a confirmation token.
    pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 15;

    #[must_use]
    pub const fn new(base_url: Url, token_ttl: Duration, validator: EmailValidator) -> Self {
        Self {
            base_url,
            token_ttl,
            validator,
        }
    }

    /// Settings with the default token lifetime and email pattern.
    #[must_use]
    pub fn with_defaults(base_url: Url) -> Self {
        Self::new(
            base_url,
            Duration::minutes(Self::DEFAULT_TOKEN_TTL_MINUTES),
            EmailValidator::default(),
        )
    }

    #[must_use]
    pub const fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    /// Build `<base-url>/registration/confirm?token=<token>`.
    #[must_use]
    pub fn confirmation_link(&self, token: &TokenId) -> String {
        let mut url = self.base_url.clone();
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(CONFIRM_PATH);
        }
        url.query_pairs_mut().append_pair("token", token.as_str());
        url.into()
    }
}

/// Signup form data.
///
/// Missing fields deserialize as empty strings and are rejected by
/// validation. Implements `Debug` manually to redact the password.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct SignUpRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl SignUpRequest {
    #[must_use]
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for SignUpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignUpRequest")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Successful result of a signup attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// A new pending account was created and a confirmation email sent.
    Registered { token: TokenId },
    /// The account already existed, pending, with the same details. A fresh
    /// token was issued and the confirmation email sent again.
    ConfirmationResent { token: TokenId },
}

impl SignUpOutcome {
    /// The token issued by this attempt.
    #[must_use]
    pub const fn token(&self) -> &TokenId {
        match self {
            Self::Registered { token } | Self::ConfirmationResent { token } => token,
        }
    }
}

/// Result of redeeming a confirmation token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    /// The account that is now enabled.
    pub email: Email,
    pub confirmed_at: DateTime<Utc>,
}

/// A signup request that passed field validation.
struct ValidSignUp<'a> {
    first_name: &'a str,
    last_name: &'a str,
    email: Email,
    password: &'a str,
}

/// Orchestrates signup, duplicate detection, token issuance and confirmation.
///
/// Holds no mutable state of its own; every decision is made from what the
/// stores return.
pub struct RegistrationService {
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn TokenStore>,
    mailer: Arc<dyn MailSender>,
    hasher: Arc<dyn CredentialHasher>,
    clock: Arc<dyn Clock>,
    settings: RegistrationSettings,
}

impl RegistrationService {
    /// Create a new registration service.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserStore>,
        tokens: Arc<dyn TokenStore>,
        mailer: Arc<dyn MailSender>,
        hasher: Arc<dyn CredentialHasher>,
        clock: Arc<dyn Clock>,
        settings: RegistrationSettings,
    ) -> Self {
        Self {
            users,
            tokens,
            mailer,
            hasher,
            clock,
            settings,
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &RegistrationSettings {
        &self.settings
    }

    // =========================================================================
    // Signup
    // =========================================================================

    /// Register a new account, or resend confirmation for a pending one.
    ///
    /// # Errors
    ///
    /// Returns `RegistrationError::InvalidEmail` or `InvalidRequest` for bad input.
    /// Returns `RegistrationError::EmailTaken` if the email belongs to an enabled
    /// account or to an account with different details.
    /// Returns `RegistrationError::Repository` or `PasswordHash` on infrastructure failure.
    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpOutcome, RegistrationError> {
        let request = self.validate(request)?;

        if let Some(existing) = self.users.find_by_email(&request.email).await? {
            return self.sign_up_existing(&existing, &request).await;
        }

        let password_hash = self.hasher.hash(request.password)?;

        let new_user = NewUser {
            email: request.email,
            first_name: request.first_name.to_owned(),
            last_name: request.last_name.to_owned(),
            password_hash,
        };

        let user = match self.users.save(&new_user).await {
            Ok(user) => user,
            Err(RepositoryError::Conflict(reason)) => {
                tracing::warn!(
                    email = %new_user.email,
                    reason = %reason,
                    "Concurrent signup lost the insert race"
                );
                return Err(RegistrationError::EmailTaken);
            }
            Err(e) => return Err(e.into()),
        };

        let token = self.issue_token(&user).await?;

        tracing::info!(email = %user.email, user_id = %user.id, "User registered, pending confirmation");
        Ok(SignUpOutcome::Registered { token })
    }

    /// Decide what a signup for an already-registered email means.
    async fn sign_up_existing(
        &self,
        existing: &User,
        request: &ValidSignUp<'_>,
    ) -> Result<SignUpOutcome, RegistrationError> {
        let same_details = existing.first_name == request.first_name
            && existing.last_name == request.last_name
            && self.hasher.verify(request.password, &existing.password_hash);

        if !same_details || existing.enabled {
            tracing::warn!(
                email = %existing.email,
                status = %existing.status(),
                "Signup rejected, email already taken"
            );
            return Err(RegistrationError::EmailTaken);
        }

        let token = self.issue_token(existing).await?;

        tracing::info!(email = %existing.email, "Confirmation email resent");
        Ok(SignUpOutcome::ConfirmationResent { token })
    }

    fn validate<'a>(&self, request: &'a SignUpRequest) -> Result<ValidSignUp<'a>, RegistrationError> {
        let first_name = request.first_name.trim();
        if first_name.is_empty() {
            return Err(RegistrationError::InvalidRequest(
                "first name is required".to_owned(),
            ));
        }

        let last_name = request.last_name.trim();
        if last_name.is_empty() {
            return Err(RegistrationError::InvalidRequest(
                "last name is required".to_owned(),
            ));
        }

        if request.password.is_empty() {
            return Err(RegistrationError::InvalidRequest(
                "password is required".to_owned(),
            ));
        }

        let email = Email::parse_with(request.email.trim(), &self.settings.validator)?;

        Ok(ValidSignUp {
            first_name,
            last_name,
            email,
            password: &request.password,
        })
    }

    /// Persist a fresh token for `user` and email the confirmation link.
    ///
    /// Mail failures are logged and swallowed; the token stays valid.
    async fn issue_token(&self, user: &User) -> Result<TokenId, RegistrationError> {
        let token =
            ConfirmationToken::issue(user.email.clone(), self.clock.now(), self.settings.token_ttl);
        self.tokens.save(&token).await?;

        self.send_confirmation(user, &token.token).await;

        Ok(token.token)
    }

    async fn send_confirmation(&self, user: &User, token: &TokenId) {
        let link = self.settings.confirmation_link(token);

        let body = match render_confirmation_email(
            &user.first_name,
            &link,
            self.settings.token_ttl.num_minutes(),
        ) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(email = %user.email, error = %e, "Failed to render confirmation email");
                return;
            }
        };

        if let Err(e) = self.mailer.send(&user.email, &body).await {
            tracing::error!(email = %user.email, error = %e, "Failed to send confirmation email");
        }
    }

    // =========================================================================
    // Confirmation
    // =========================================================================

    /// Redeem a confirmation token and enable its account.
    ///
    /// # Errors
    ///
    /// Returns `RegistrationError::TokenNotFound` if the token doesn't exist.
    /// Returns `RegistrationError::TokenAlreadyConfirmed` if it was already redeemed.
    /// Returns `RegistrationError::TokenExpired` if it is past its expiry.
    /// Returns `RegistrationError::UserNotFound` if the owning account is gone.
    pub async fn confirm_token(&self, token: &TokenId) -> Result<Confirmation, RegistrationError> {
        let record = self
            .tokens
            .find_by_id(token)
            .await?
            .ok_or(RegistrationError::TokenNotFound)?;

        let now = self.clock.now();
        match record.state_at(now) {
            TokenState::Confirmed => return Err(RegistrationError::TokenAlreadyConfirmed),
            TokenState::Expired => {
                tracing::warn!(email = %record.owner_email, expired_at = %record.expires_at, "Expired confirmation token used");
                return Err(RegistrationError::TokenExpired);
            }
            TokenState::Active => {}
        }

        // Enabling is idempotent, so it goes first: if either write fails the
        // token stays unredeemed and the same link can finish the job.
        if self.users.enable(&record.owner_email).await? == 0 {
            tracing::error!(email = %record.owner_email, "Confirmation token has no matching user");
            return Err(RegistrationError::UserNotFound);
        }

        // A concurrent redemption may have landed between the read and here.
        if self.tokens.set_confirmed_at(token, now).await? == 0 {
            return Err(RegistrationError::TokenAlreadyConfirmed);
        }

        tracing::info!(email = %record.owner_email, "Email confirmed, user enabled");
        Ok(Confirmation {
            email: record.owner_email,
            confirmed_at: now,
        })
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Get an account by email, for an external authentication layer.
    ///
    /// # Errors
    ///
    /// Returns `RegistrationError::InvalidEmail` if the email format is invalid.
    /// Returns `RegistrationError::UserNotFound` if no account has this email.
    pub async fn find_user(&self, email: &str) -> Result<User, RegistrationError> {
        let email = Email::parse_with(email.trim(), &self.settings.validator)?;

        self.users
            .find_by_email(&email)
            .await?
            .ok_or(RegistrationError::UserNotFound)
    }
}
