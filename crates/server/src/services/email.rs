//! Confirmation email rendering and delivery.
//!
//! Uses SMTP via lettre for delivery with an Askama HTML template. When SMTP
//! is not configured the [`LogMailer`] writes messages to the log instead.

use askama::Template;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use enlist_core::Email;

use crate::config::EmailConfig;

/// HTML template for the confirmation email.
#[derive(Template)]
#[template(path = "email/confirm_account.html")]
struct ConfirmAccountEmailHtml<'a> {
    first_name: &'a str,
    link: &'a str,
    ttl_minutes: i64,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum MailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Delivers a rendered HTML body to an address.
///
/// Callers treat delivery as fire-and-forget: an error is logged, never
/// retried, and never undoes work already persisted.
#[async_trait]
pub trait MailSender: Send + Sync {
    /// Send `html_body` to `to`.
    async fn send(&self, to: &Email, html_body: &str) -> Result<(), MailError>;
}

/// Render the confirmation email greeting `first_name` and linking to `link`.
///
/// # Errors
///
/// Returns `MailError::Template` if rendering fails.
pub fn render_confirmation_email(
    first_name: &str,
    link: &str,
    ttl_minutes: i64,
) -> Result<String, MailError> {
    let html = ConfirmAccountEmailHtml {
        first_name,
        link,
        ttl_minutes,
    }
    .render()?;
    Ok(html)
}

/// SMTP mail sender.
#[derive(Clone)]
pub struct SmtpMailer {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    subject: String,
}

impl SmtpMailer {
    /// Create a new SMTP sender from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the relay cannot be configured or the sender address
    /// is invalid.
    pub fn new(config: &EmailConfig) -> Result<Self, MailError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        let from = config
            .from_address
            .parse()
            .map_err(|_| MailError::InvalidAddress(config.from_address.clone()))?;

        Ok(Self {
            mailer,
            from,
            subject: config.subject.clone(),
        })
    }
}

#[async_trait]
impl MailSender for SmtpMailer {
    async fn send(&self, to: &Email, html_body: &str) -> Result<(), MailError> {
        let recipient: Mailbox = to
            .as_str()
            .parse()
            .map_err(|_| MailError::InvalidAddress(to.to_string()))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(self.subject.as_str())
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %self.subject, "Email sent successfully");
        Ok(())
    }
}

/// Writes outgoing mail to the log instead of delivering it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl MailSender for LogMailer {
    async fn send(&self, to: &Email, html_body: &str) -> Result<(), MailError> {
        tracing::info!(to = %to, body = %html_body, "SMTP not configured, email logged only");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation_email_greets_and_links() {
        let link = "http://localhost:8080/registration/confirm?token=abc-123";
        let html = render_confirmation_email("Ann", link, 15).unwrap();

        assert!(html.contains("Hello Ann,"));
        assert!(html.contains("<a href="));
        assert!(html.contains("abc-123"));
        assert!(html.contains("15 minutes"));
    }

    #[test]
    fn test_confirmation_email_escapes_name() {
        let html =
            render_confirmation_email("<script>", "http://localhost/confirm?token=t", 15).unwrap();
        assert!(!html.contains("<script>"));
    }

    #[tokio::test]
    async fn test_log_mailer_always_succeeds() {
        let to = Email::parse("ann@x.com").unwrap();
        assert!(LogMailer.send(&to, "<p>hi</p>").await.is_ok());
    }
}
