//! SMTP mail transport using the `lettre` crate.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use encore_application::{MailBody, MailTransport, OutgoingEmail};
use encore_core::{AppError, AppResult};

/// SMTP transport configuration.
#[derive(Clone)]
pub struct SmtpMailConfig {
    /// SMTP server hostname.
    pub host: String,
    /// SMTP server port.
    pub port: u16,
    /// SMTP username.
    pub username: String,
    /// SMTP password.
    pub password: String,
    /// Sender email address.
    pub from_address: String,
}

/// Production mail transport over SMTP.
#[derive(Clone)]
pub struct SmtpMailTransport {
    config: SmtpMailConfig,
}

impl SmtpMailTransport {
    /// Creates a transport from SMTP configuration.
    #[must_use]
    pub fn new(config: SmtpMailConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, email: OutgoingEmail) -> AppResult<()> {
        let from = self
            .config
            .from_address
            .parse()
            .map_err(|error| AppError::Internal(format!("invalid from address: {error}")))?;

        let to = email
            .to
            .parse()
            .map_err(|error| AppError::Internal(format!("invalid recipient address: {error}")))?;

        let (content_type, body) = match email.body {
            MailBody::Text(text) => (ContentType::TEXT_PLAIN, text),
            MailBody::Html(html) => (ContentType::TEXT_HTML, html),
        };

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(email.subject)
            .header(content_type)
            .body(body)
            .map_err(|error| AppError::Internal(format!("failed to build email: {error}")))?;

        let credentials =
            Credentials::new(self.config.username.clone(), self.config.password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.host)
            .map_err(|error| {
                AppError::Internal(format!("failed to create SMTP transport: {error}"))
            })?
            .port(self.config.port)
            .credentials(credentials)
            .build();

        mailer
            .send(message)
            .await
            .map_err(|error| AppError::Internal(format!("failed to send email: {error}")))?;

        Ok(())
    }
}
