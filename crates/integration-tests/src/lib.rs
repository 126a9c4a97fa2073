//! Integration tests for Enlist.
//!
//! Provides in-memory stand-ins for every collaborator of the registration
//! service so the service and the HTTP router can be exercised without a
//! database or an SMTP server.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p enlist-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `signup` - Account creation, resend and duplicate handling
//! - `confirm` - Token redemption and expiry
//! - `http` - Router status codes and bodies
//! - `postgres` - `PostgreSQL` stores (needs `ENLIST_TEST_DATABASE_URL`)

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use axum::Router;
use chrono::{DateTime, Duration, TimeZone, Utc};
use url::Url;

use enlist_core::{Email, EmailValidator, TokenId, UserId};
use enlist_server::db::{RepositoryError, TokenStore, UserStore};
use enlist_server::models::{ConfirmationToken, NewUser, User};
use enlist_server::routes;
use enlist_server::services::{
    Clock, CredentialHasher, HashError, MailError, MailSender, RegistrationService,
    RegistrationSettings,
};
use enlist_server::state::AppState;

/// Base URL used for confirmation links in tests.
pub const BASE_URL: &str = "http://localhost:8080";

/// The error a store returns when its database cannot be reached.
fn unavailable() -> RepositoryError {
    RepositoryError::Database(sqlx::Error::PoolTimedOut)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Stores
// =============================================================================

/// Account store keyed by email, enforcing uniqueness like the database does.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<String, User>>,
    next_id: AtomicI64,
    hide_next_lookup: AtomicBool,
    fail_next_enable: AtomicBool,
}

impl InMemoryUserStore {
    /// All stored accounts.
    pub fn all(&self) -> Vec<User> {
        lock(&self.users).values().cloned().collect()
    }

    /// The account with this email, if any.
    pub fn get(&self, email: &str) -> Option<User> {
        lock(&self.users).get(email).cloned()
    }

    /// Make the next `find_by_email` miss, as if another request inserted the
    /// account between this request's lookup and its insert.
    pub fn hide_next_lookup(&self) {
        self.hide_next_lookup.store(true, Ordering::SeqCst);
    }

    /// Make the next `enable` fail as if the database were unreachable.
    pub fn fail_next_enable(&self) {
        self.fail_next_enable.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        if self.hide_next_lookup.swap(false, Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(self.get(email.as_str()))
    }

    async fn save(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let mut users = lock(&self.users);
        if users.contains_key(user.email.as_str()) {
            return Err(RepositoryError::Conflict("email already exists".to_string()));
        }

        let now = Utc::now();
        let saved = User {
            id: UserId::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            password_hash: user.password_hash.clone(),
            enabled: false,
            created_at: now,
            updated_at: now,
        };
        users.insert(saved.email.to_string(), saved.clone());
        Ok(saved)
    }

    async fn enable(&self, email: &Email) -> Result<u64, RepositoryError> {
        if self.fail_next_enable.swap(false, Ordering::SeqCst) {
            return Err(unavailable());
        }
        let mut users = lock(&self.users);
        Ok(users.get_mut(email.as_str()).map_or(0, |user| {
            user.enabled = true;
            user.updated_at = Utc::now();
            1
        }))
    }
}

/// Token store keyed by token id.
#[derive(Default)]
pub struct InMemoryTokenStore {
    tokens: Mutex<HashMap<String, ConfirmationToken>>,
    fail_next_confirm: AtomicBool,
}

impl InMemoryTokenStore {
    /// All stored tokens.
    pub fn all(&self) -> Vec<ConfirmationToken> {
        lock(&self.tokens).values().cloned().collect()
    }

    /// The token with this id, if any.
    pub fn get(&self, token: &TokenId) -> Option<ConfirmationToken> {
        lock(&self.tokens).get(token.as_str()).cloned()
    }

    /// Tokens issued to `email`.
    pub fn for_email(&self, email: &str) -> Vec<ConfirmationToken> {
        lock(&self.tokens)
            .values()
            .filter(|t| t.owner_email.as_str() == email)
            .cloned()
            .collect()
    }

    /// Make the next `set_confirmed_at` fail as if the database were unreachable.
    pub fn fail_next_confirm(&self) {
        self.fail_next_confirm.store(true, Ordering::SeqCst);
    }

    /// Store a token directly, bypassing the service.
    pub fn insert(&self, token: ConfirmationToken) {
        lock(&self.tokens).insert(token.token.to_string(), token);
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn save(&self, token: &ConfirmationToken) -> Result<(), RepositoryError> {
        let mut tokens = lock(&self.tokens);
        if tokens.contains_key(token.token.as_str()) {
            return Err(RepositoryError::Conflict("token already exists".to_string()));
        }
        tokens.insert(token.token.to_string(), token.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        token: &TokenId,
    ) -> Result<Option<ConfirmationToken>, RepositoryError> {
        Ok(self.get(token))
    }

    async fn set_confirmed_at(
        &self,
        token: &TokenId,
        confirmed_at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        if self.fail_next_confirm.swap(false, Ordering::SeqCst) {
            return Err(unavailable());
        }
        let mut tokens = lock(&self.tokens);
        Ok(match tokens.get_mut(token.as_str()) {
            Some(record) if record.confirmed_at.is_none() => {
                record.confirmed_at = Some(confirmed_at);
                1
            }
            _ => 0,
        })
    }
}

// =============================================================================
// Mail, Clock, Hashing
// =============================================================================

/// A message handed to the [`RecordingMailer`].
#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: Email,
    pub html: String,
}

impl SentMail {
    /// The `token` query parameter of the confirmation link in the body.
    pub fn token(&self) -> Option<String> {
        let (_, rest) = self.html.split_once("token=")?;
        let end = rest.find('"').unwrap_or(rest.len());
        rest.get(..end).map(str::to_string)
    }
}

/// Mailer that records every message instead of delivering it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
    failing: AtomicBool,
}

impl RecordingMailer {
    /// Messages accepted so far, oldest first.
    pub fn sent(&self) -> Vec<SentMail> {
        lock(&self.sent).clone()
    }

    /// Make every following send fail after being recorded.
    pub fn fail_sends(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl MailSender for RecordingMailer {
    async fn send(&self, to: &Email, html_body: &str) -> Result<(), MailError> {
        lock(&self.sent).push(SentMail {
            to: to.clone(),
            html: html_body.to_string(),
        });

        if self.failing.load(Ordering::SeqCst) {
            return Err(MailError::InvalidAddress(to.to_string()));
        }
        Ok(())
    }
}

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Move the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        *lock(&self.now) += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *lock(&self.now)
    }
}

/// Reversible stand-in for a password hasher.
#[derive(Debug, Default)]
pub struct PlainHasher;

impl CredentialHasher for PlainHasher {
    fn hash(&self, password: &str) -> Result<String, HashError> {
        Ok(format!("plain${password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        hash.strip_prefix("plain$") == Some(password)
    }
}

// =============================================================================
// Test Context
// =============================================================================

/// A registration service wired to in-memory collaborators.
pub struct TestContext {
    pub users: Arc<InMemoryUserStore>,
    pub tokens: Arc<InMemoryTokenStore>,
    pub mailer: Arc<RecordingMailer>,
    pub clock: Arc<ManualClock>,
    state: AppState,
}

impl TestContext {
    /// Default settings: 15 minute tokens, built-in email pattern.
    pub fn new() -> Self {
        Self::with_hasher(Arc::new(PlainHasher))
    }

    /// Same as [`TestContext::new`] with a specific password hasher.
    pub fn with_hasher(hasher: Arc<dyn CredentialHasher>) -> Self {
        Self::build(hasher, EmailValidator::default())
    }

    /// Same as [`TestContext::new`] with a custom email pattern.
    pub fn with_validator(validator: EmailValidator) -> Self {
        Self::build(Arc::new(PlainHasher), validator)
    }

    fn build(hasher: Arc<dyn CredentialHasher>, validator: EmailValidator) -> Self {
        let users = Arc::new(InMemoryUserStore::default());
        let tokens = Arc::new(InMemoryTokenStore::default());
        let mailer = Arc::new(RecordingMailer::default());
        let clock = Arc::new(ManualClock::new(start_time()));

        let base_url = Url::parse(BASE_URL).unwrap_or_else(|e| panic!("bad base url: {e}"));
        let settings = RegistrationSettings::new(
            base_url,
            Duration::minutes(RegistrationSettings::DEFAULT_TOKEN_TTL_MINUTES),
            validator,
        );

        let service = RegistrationService::new(
            users.clone(),
            tokens.clone(),
            mailer.clone(),
            hasher,
            clock.clone(),
            settings,
        );

        Self {
            users,
            tokens,
            mailer,
            clock,
            state: AppState::new(service),
        }
    }

    /// The service under test.
    pub fn service(&self) -> &RegistrationService {
        self.state.registration()
    }

    /// The full HTTP router backed by this context.
    pub fn router(&self) -> Router {
        routes::router(self.state.clone())
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed instant every [`ManualClock`] in a [`TestContext`] starts at.
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}
