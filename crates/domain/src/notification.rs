//! In-app notification records and per-user delivery preferences.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{NotificationId, UserId};

/// Category tag for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// An event the user booked is starting soon.
    EventReminder,
    /// A booking was confirmed.
    BookingConfirmation,
    /// An event the user booked was cancelled.
    EventCancellation,
    /// Anything that does not fit a dedicated category.
    General,
}

impl NotificationKind {
    /// Returns the stable tag stored in the database.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EventReminder => "event_reminder",
            Self::BookingConfirmation => "booking_confirmation",
            Self::EventCancellation => "event_cancellation",
            Self::General => "general",
        }
    }

    /// Parses a stored tag, falling back to [`NotificationKind::General`].
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "event_reminder" => Self::EventReminder,
            "booking_confirmation" => Self::BookingConfirmation,
            "event_cancellation" => Self::EventCancellation,
            _ => Self::General,
        }
    }
}

/// Input for creating one notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    /// Short title shown in the notification list.
    pub title: String,
    /// Full message body.
    pub message: String,
    /// Category tag.
    pub kind: NotificationKind,
}

/// One persisted notification. The read flag only ever moves unread to read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Notification identifier.
    pub id: NotificationId,
    /// Recipient of the notification.
    pub recipient: UserId,
    /// Short title shown in the notification list.
    pub title: String,
    /// Full message body.
    pub message: String,
    /// Category tag.
    pub kind: NotificationKind,
    /// Whether the recipient has read the notification.
    pub read: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Per-user delivery preferences.
///
/// Reads always produce a fully-populated value: when no row exists yet the
/// canonical defaults below apply, so callers never branch on absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    /// Deliver notifications by email.
    pub email_notifications: bool,
    /// Deliver push notifications.
    pub push_notifications: bool,
    /// Deliver SMS notifications.
    pub sms_notifications: bool,
    /// Send reminders before booked events.
    pub event_reminders: bool,
    /// Send marketing emails.
    pub marketing_emails: bool,
}

impl Default for NotificationPreferences {
    /// Canonical defaults: transactional channels on, promotional and
    /// paid channels off.
    fn default() -> Self {
        Self {
            email_notifications: true,
            push_notifications: false,
            sms_notifications: false,
            event_reminders: true,
            marketing_emails: false,
        }
    }
}
