//! Console mail transport for development. Logs emails to tracing output.

use async_trait::async_trait;
use tracing::info;

use encore_application::{MailBody, MailTransport, OutgoingEmail};
use encore_core::AppResult;

/// Development mail transport that logs emails instead of sending them.
#[derive(Clone, Default)]
pub struct ConsoleMailTransport;

impl ConsoleMailTransport {
    /// Creates a new console transport.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MailTransport for ConsoleMailTransport {
    async fn send(&self, email: OutgoingEmail) -> AppResult<()> {
        let body = match &email.body {
            MailBody::Text(text) => text.as_str(),
            MailBody::Html(html) => html.as_str(),
        };

        info!(
            to = %email.to,
            subject = %email.subject,
            "--- EMAIL (console) ---\nTo: {}\nSubject: {}\n\n{}\n--- END EMAIL ---",
            email.to,
            email.subject,
            body
        );

        Ok(())
    }
}
