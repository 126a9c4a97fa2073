//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ENLIST_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `ENLIST_BASE_URL` - Public URL confirmation links are built from
//!
//! ## Optional
//! - `ENLIST_HOST` - Bind address (default: 127.0.0.1)
//! - `ENLIST_PORT` - Listen port (default: 8080)
//! - `ENLIST_TOKEN_TTL_MINUTES` - Confirmation token lifetime, 1 to 43200 (default: 15)
//! - `ENLIST_EMAIL_PATTERN` - Case-insensitive email regex (default: built-in pattern)
//! - `SMTP_HOST`, `SMTP_USERNAME`, `SMTP_PASSWORD`, `EMAIL_FROM` - SMTP delivery;
//!   set all of them or none. Without them mail is written to the log.
//! - `SMTP_PORT` - SMTP port (default: 587)
//! - `EMAIL_SUBJECT` - Confirmation email subject (default: "Confirm your email")
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Trace sample rate (default: 1.0)

use std::net::{IpAddr, SocketAddr};

use chrono::Duration;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use enlist_core::EmailValidator;

use crate::services::RegistrationSettings;

const DEFAULT_EMAIL_SUBJECT: &str = "Confirm your email";

/// Longest accepted token lifetime: 30 days.
const MAX_TOKEN_TTL_MINUTES: i64 = 30 * 24 * 60;

/// Variables that switch SMTP delivery on. All or none must be set.
const SMTP_VARS: [&str; 4] = ["SMTP_HOST", "SMTP_USERNAME", "SMTP_PASSWORD", "EMAIL_FROM"];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Server configuration.
///
/// Implements `Debug` manually to redact the database URL.
#[derive(Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for confirmation links
    pub base_url: Url,
    /// Confirmation token lifetime
    pub token_ttl: Duration,
    /// Email format check applied to signups
    pub email_validator: EmailValidator,
    /// SMTP configuration, `None` when mail goes to the log
    pub email: Option<EmailConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 - 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 - 1.0)
    pub sentry_traces_sample_rate: f32,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("database_url", &"[REDACTED]")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("base_url", &self.base_url.as_str())
            .field("token_ttl_minutes", &self.token_ttl.num_minutes())
            .field("email_pattern", &self.email_validator.pattern())
            .field("email", &self.email)
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "[REDACTED]"))
            .field("sentry_environment", &self.sentry_environment)
            .field("sentry_sample_rate", &self.sentry_sample_rate)
            .field("sentry_traces_sample_rate", &self.sentry_traces_sample_rate)
            .finish()
    }
}

/// Email (SMTP) configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct EmailConfig {
    /// SMTP server hostname
    pub smtp_host: String,
    /// SMTP server port
    pub smtp_port: u16,
    /// SMTP username
    pub smtp_username: String,
    /// SMTP password
    pub smtp_password: SecretString,
    /// Email sender address (From header)
    pub from_address: String,
    /// Subject line of the confirmation email
    pub subject: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .field("subject", &self.subject)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(env: Lookup<'_>) -> Result<Self, ConfigError> {
        let database_url = get_database_url(env, "ENLIST_DATABASE_URL")?;
        let host = parse_env(env, "ENLIST_HOST", "127.0.0.1")?;
        let port = parse_env(env, "ENLIST_PORT", "8080")?;
        let base_url = parse_base_url(env, "ENLIST_BASE_URL")?;

        let token_ttl = parse_token_ttl(env, "ENLIST_TOKEN_TTL_MINUTES")?;

        let email_validator = match get_optional_env(env, "ENLIST_EMAIL_PATTERN") {
            Some(pattern) => EmailValidator::new(&pattern).map_err(|e| {
                ConfigError::InvalidEnvVar("ENLIST_EMAIL_PATTERN".to_string(), e.to_string())
            })?,
            None => EmailValidator::default(),
        };

        let email = EmailConfig::from_lookup(env)?;

        let sentry_dsn = get_optional_env(env, "SENTRY_DSN");
        let sentry_environment = get_optional_env(env, "SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env(env, "SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env(env, "SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            token_ttl,
            email_validator,
            email,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Settings handed to the registration service.
    #[must_use]
    pub fn registration_settings(&self) -> RegistrationSettings {
        RegistrationSettings::new(
            self.base_url.clone(),
            self.token_ttl,
            self.email_validator.clone(),
        )
    }
}

impl EmailConfig {
    fn from_lookup(env: Lookup<'_>) -> Result<Option<Self>, ConfigError> {
        if SMTP_VARS
            .iter()
            .all(|key| get_optional_env(env, key).is_none())
        {
            return Ok(None);
        }

        Ok(Some(Self {
            smtp_host: get_required_env(env, "SMTP_HOST")?,
            smtp_port: parse_env(env, "SMTP_PORT", "587")?,
            smtp_username: get_required_env(env, "SMTP_USERNAME")?,
            smtp_password: SecretString::from(get_required_env(env, "SMTP_PASSWORD")?),
            from_address: get_required_env(env, "EMAIL_FROM")?,
            subject: get_optional_env(env, "EMAIL_SUBJECT")
                .unwrap_or_else(|| DEFAULT_EMAIL_SUBJECT.to_string()),
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Source of configuration variables.
pub type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Get an optional variable. Blank values count as unset.
fn get_optional_env(env: Lookup<'_>, key: &str) -> Option<String> {
    env(key).filter(|value| !value.trim().is_empty())
}

/// Get a required variable.
fn get_required_env(env: Lookup<'_>, key: &str) -> Result<String, ConfigError> {
    get_optional_env(env, key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Parse a variable, falling back to `default` when unset.
fn parse_env<T>(env: Lookup<'_>, key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(env, key)
        .as_deref()
        .unwrap_or(default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(env: Lookup<'_>, primary_key: &str) -> Result<SecretString, ConfigError> {
    get_optional_env(env, primary_key)
        .or_else(|| get_optional_env(env, "DATABASE_URL"))
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Parse the public base URL. Links are appended to its path, so it must be
/// a hierarchical URL.
fn parse_base_url(env: Lookup<'_>, key: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(&get_required_env(env, key)?)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be an absolute http(s) URL".to_string(),
        ));
    }

    Ok(url)
}

fn parse_token_ttl(env: Lookup<'_>, key: &str) -> Result<Duration, ConfigError> {
    let minutes: i64 = parse_env(env, key, "15")?;

    if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&minutes) {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between 1 and {MAX_TOKEN_TTL_MINUTES} minutes"),
        ));
    }

    Duration::try_minutes(minutes).ok_or_else(|| {
        ConfigError::InvalidEnvVar(key.to_string(), "out of range".to_string())
    })
}
