//! Transactional email dispatcher with fixed HTML templates.
//!
//! Delivery is fire-and-forget single-attempt: every sender catches
//! transport failure and reports it through [`DeliveryStatus`] instead of
//! propagating an error.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use encore_core::AppResult;


/// Body of an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailBody {
    /// Plain text body.
    Text(String),
    /// HTML body.
    Html(String),
}

/// One message handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Message body.
    pub body: MailBody,
}

/// Port for the mail transport. The sender address belongs to the adapter.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Submits one message for delivery.
    async fn send(&self, email: OutgoingEmail) -> AppResult<()>;
}

/// Whether a message reached the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// The transport accepted the message.
    Sent,
    /// The transport failed; the reason was logged and the send dropped.
    Degraded(String),
}

impl DeliveryStatus {
    /// Reports whether the transport accepted the message.
    #[must_use]
    pub fn sent(&self) -> bool {
        matches!(self, Self::Sent)
    }
}

/// Rendering configuration for the fixed templates.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Display name used inside template copy.
    pub from_name: String,
    /// Public base URL for links (password reset).
    pub base_url: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            from_name: "Encore".to_owned(),
            base_url: "https://encore.app".to_owned(),
        }
    }
}

/// Application service for transactional email.
#[derive(Clone)]
pub struct EmailService {
    transport: Arc<dyn MailTransport>,
    config: EmailConfig,
}

impl EmailService {
    /// Creates a service from a transport implementation.
    #[must_use]
    pub fn new(transport: Arc<dyn MailTransport>, config: EmailConfig) -> Self {
        Self { transport, config }
    }

    /// Sends a plain-text email.
    pub async fn send_plain(&self, to: &str, subject: &str, body: &str) -> DeliveryStatus {
        self.submit(OutgoingEmail {
            to: to.to_owned(),
            subject: subject.to_owned(),
            body: MailBody::Text(body.to_owned()),
        })
        .await
    }

    /// Sends a booking confirmation with the reference and event date.
    pub async fn send_booking_confirmation(
        &self,
        to: &str,
        event_title: &str,
        booking_reference: &str,
        event_date: DateTime<Utc>,
    ) -> DeliveryStatus {
        let subject = format!("Booking Confirmed - {event_title}");
        let body = wrap_html(&format!(
            "<h2>Booking Confirmed!</h2>\
             <p>Your booking for <strong>{event_title}</strong> has been confirmed.</p>\
             <p><strong>Booking Reference:</strong> {booking_reference}</p>\
             <p><strong>Event Date:</strong> {}</p>\
             <p>Please save your booking reference for check-in.</p>\
             <p>Thank you for booking with {}!</p>",
            format_event_date(event_date),
            self.config.from_name,
        ));
        self.submit_html(to, subject, body).await
    }

    /// Sends a reminder for an upcoming event.
    pub async fn send_event_reminder(
        &self,
        to: &str,
        event_title: &str,
        event_date: DateTime<Utc>,
    ) -> DeliveryStatus {
        let subject = format!("Reminder: {event_title} is coming up!");
        let body = wrap_html(&format!(
            "<h2>Event Reminder!</h2>\
             <p>Your event <strong>{event_title}</strong> is coming up!</p>\
             <p><strong>Date:</strong> {}</p>\
             <p>Don't forget to attend!</p>\
             <p>See you there!</p>",
            format_event_date(event_date),
        ));
        self.submit_html(to, subject, body).await
    }

    /// Sends a password reset link built from the configured base URL.
    pub async fn send_password_reset(&self, to: &str, reset_token: &str) -> DeliveryStatus {
        let reset_link = format!("{}/reset-password?token={reset_token}", self.config.base_url);
        let body = wrap_html(&format!(
            "<h2>Password Reset Request</h2>\
             <p>We received a request to reset your password.</p>\
             <p><a href=\"{reset_link}\">Click here to reset your password</a></p>\
             <p>This link will expire in 24 hours.</p>\
             <p>If you didn't request this, please ignore this email.</p>",
        ));
        self.submit_html(to, "Password Reset Request".to_owned(), body)
            .await
    }

    /// Sends the welcome email for a new account.
    pub async fn send_welcome(&self, to: &str, user_name: &str) -> DeliveryStatus {
        let from_name = self.config.from_name.as_str();
        let subject = format!("Welcome to {from_name}!");
        let body = wrap_html(&format!(
            "<h2>Welcome to {from_name}!</h2>\
             <p>Hi {user_name},</p>\
             <p>Thank you for joining {from_name}. We're excited to have you on board!</p>\
             <p>Start exploring events and book your first concert today.</p>\
             <p>Happy booking!</p>",
        ));
        self.submit_html(to, subject, body).await
    }

    /// Sends a cancellation confirmation with the refund amount.
    pub async fn send_cancellation_confirmation(
        &self,
        to: &str,
        event_title: &str,
        refund_amount: f64,
    ) -> DeliveryStatus {
        let subject = format!("Booking Cancelled - {event_title}");
        let body = wrap_html(&format!(
            "<h2>Booking Cancelled</h2>\
             <p>Your booking for <strong>{event_title}</strong> has been cancelled.</p>\
             <p><strong>Refund Amount:</strong> ${refund_amount:.2}</p>\
             <p>The refund will be processed within 5-7 business days.</p>\
             <p>Thank you for using {}.</p>",
            self.config.from_name,
        ));
        self.submit_html(to, subject, body).await
    }

    async fn submit_html(&self, to: &str, subject: String, html: String) -> DeliveryStatus {
        self.submit(OutgoingEmail {
            to: to.to_owned(),
            subject,
            body: MailBody::Html(html),
        })
        .await
    }

    async fn submit(&self, email: OutgoingEmail) -> DeliveryStatus {
        let to = email.to.clone();
        let subject = email.subject.clone();
        match self.transport.send(email).await {
            Ok(()) => {
                info!(to = %to, subject = %subject, "email submitted to transport");
                DeliveryStatus::Sent
            }
            Err(error) => {
                let reason = error.to_string();
                warn!(to = %to, subject = %subject, error = %reason, "email delivery dropped");
                DeliveryStatus::Degraded(reason)
            }
        }
    }
}

fn wrap_html(content: &str) -> String {
    format!(
        "<!DOCTYPE html>\
         <html>\
         <head><style>body {{ font-family: Arial, sans-serif; }}</style></head>\
         <body>{content}</body>\
         </html>"
    )
}

fn format_event_date(date: DateTime<Utc>) -> String {
    date.format("%B %d, %Y @ %H:%M").to_string()
}
