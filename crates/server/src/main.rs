//! Enlist registration server.
//!
//! Serves signup and email confirmation on port 8080.
//!
//! # Architecture
//!
//! - Axum web framework, JSON signup API
//! - Askama templates for the confirmation email and page
//! - `PostgreSQL` for accounts and confirmation tokens
//! - SMTP via lettre, or the log when SMTP is not configured

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use enlist_server::config::ServerConfig;
use enlist_server::db::{self, PgTokenStore, PgUserStore};
use enlist_server::routes;
use enlist_server::services::{
    Argon2Hasher, LogMailer, MailSender, RegistrationService, SmtpMailer, SystemClock,
};
use enlist_server::state::AppState;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ServerConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Pick the SMTP mailer when configured, the log mailer otherwise.
fn build_mailer(config: &ServerConfig) -> Arc<dyn MailSender> {
    match &config.email {
        Some(email) => {
            let mailer = SmtpMailer::new(email).expect("Failed to configure SMTP mailer");
            tracing::info!(host = %email.smtp_host, "SMTP mail delivery enabled");
            Arc::new(mailer)
        }
        None => {
            tracing::warn!("SMTP not configured, confirmation emails will only be logged");
            Arc::new(LogMailer)
        }
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = ServerConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "enlist_server=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    // Initialize database connection pool
    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    // NOTE: Migrations are NOT run automatically on startup.
    // Run them explicitly via: cargo run -p enlist-cli -- migrate

    let registration = RegistrationService::new(
        Arc::new(PgUserStore::new(pool.clone())),
        Arc::new(PgTokenStore::new(pool)),
        build_mailer(&config),
        Arc::new(Argon2Hasher::new()),
        Arc::new(SystemClock),
        config.registration_settings(),
    );

    let app = routes::router(AppState::new(registration))
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    // Start server
    let addr = config.socket_addr();
    tracing::info!(
        base_url = %config.base_url,
        token_ttl_minutes = config.token_ttl.num_minutes(),
        "enlist-server listening on {}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
