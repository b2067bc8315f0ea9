//! Notification dispatcher: per-user notification records, read state,
//! retention, and delivery preferences.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use encore_core::{AppError, AppResult, NonEmptyString};
use encore_domain::{
    Notification, NotificationId, NotificationKind, NotificationPreferences, NotificationRequest,
    UserId,
};

#[cfg(test)]
mod tests;

/// Notifications older than this are eligible for the retention sweep.
const RETENTION_DAYS: i64 = 30;

/// Port for notification row persistence.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Inserts one notification row.
    async fn insert(&self, notification: Notification) -> AppResult<()>;

    /// Point lookup by id.
    async fn find_by_id(&self, id: NotificationId) -> AppResult<Option<Notification>>;

    /// Lists a user's notifications, newest first.
    async fn list_for_user(&self, user: UserId) -> AppResult<Vec<Notification>>;

    /// Lists a user's unread notifications, newest first.
    async fn list_unread_for_user(&self, user: UserId) -> AppResult<Vec<Notification>>;

    /// Flips the given rows to read in one batch write, stamping
    /// `updated_at` on each row it touches.
    async fn mark_read(&self, ids: &[NotificationId], updated_at: DateTime<Utc>) -> AppResult<()>;

    /// Deletes one notification row.
    async fn delete(&self, id: NotificationId) -> AppResult<()>;

    /// Deletes rows created strictly before `cutoff`; returns the count.
    async fn delete_created_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;
}

/// Port for per-user delivery preference rows.
#[async_trait]
pub trait NotificationPreferenceRepository: Send + Sync {
    /// Point lookup by user. `None` when the user never saved preferences.
    async fn find_for_user(&self, user: UserId) -> AppResult<Option<NotificationPreferences>>;

    /// Inserts or replaces the user's preference row.
    async fn upsert(&self, user: UserId, preferences: NotificationPreferences) -> AppResult<()>;
}

/// Read/unread counts for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationStats {
    /// All notifications for the user.
    pub total: u64,
    /// Unread notifications.
    pub unread: u64,
    /// Read notifications.
    pub read: u64,
}

/// Application service for notification delivery and housekeeping.
#[derive(Clone)]
pub struct NotificationService {
    notifications: Arc<dyn NotificationRepository>,
    preferences: Arc<dyn NotificationPreferenceRepository>,
}

impl NotificationService {
    /// Creates a service from repository implementations.
    #[must_use]
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        preferences: Arc<dyn NotificationPreferenceRepository>,
    ) -> Self {
        Self {
            notifications,
            preferences,
        }
    }

    /// Creates one unread notification for `recipient`.
    ///
    /// After the row is stored the recipient's preferences decide whether an
    /// email should also go out. The send itself is owned by the surrounding
    /// application; this service only records the intent in the log.
    pub async fn notify_user(
        &self,
        recipient: UserId,
        request: NotificationRequest,
    ) -> AppResult<Notification> {
        let title = NonEmptyString::new(request.title)?;

        let now = Utc::now();
        let notification = Notification {
            id: NotificationId::new(),
            recipient,
            title: title.into(),
            message: request.message,
            kind: request.kind,
            read: false,
            created_at: now,
            updated_at: now,
        };

        self.notifications.insert(notification.clone()).await?;
        info!(recipient = %recipient, id = %notification.id, "notification created");

        // Preference lookup failures must not undo the stored notification.
        match self.preferences(recipient).await {
            Ok(preferences) if preferences.email_notifications => {
                debug!(recipient = %recipient, "email delivery enabled for recipient");
            }
            Ok(_) => {}
            Err(error) => {
                warn!(recipient = %recipient, error = %error, "preference lookup failed");
            }
        }

        Ok(notification)
    }

    /// Fans `request` out to every recipient.
    ///
    /// One failed recipient is logged and does not abort the rest; the batch
    /// is not atomic. Returns the notifications that were created.
    pub async fn notify_many(
        &self,
        recipients: &[UserId],
        request: &NotificationRequest,
    ) -> Vec<Notification> {
        info!(count = recipients.len(), "sending bulk notification");

        let mut created = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            match self.notify_user(*recipient, request.clone()).await {
                Ok(notification) => created.push(notification),
                Err(error) => {
                    warn!(recipient = %recipient, error = %error, "failed to notify recipient");
                }
            }
        }
        created
    }

    /// Lists a user's notifications, newest first.
    pub async fn user_notifications(&self, user: UserId) -> AppResult<Vec<Notification>> {
        self.notifications.list_for_user(user).await
    }

    /// Lists a user's unread notifications, newest first.
    pub async fn unread_notifications(&self, user: UserId) -> AppResult<Vec<Notification>> {
        self.notifications.list_unread_for_user(user).await
    }

    /// Marks one notification as read.
    ///
    /// The only user-visible error in this workspace: an absent id is
    /// reported as [`AppError::NotFound`].
    pub async fn mark_as_read(&self, id: NotificationId) -> AppResult<Notification> {
        let Some(mut notification) = self.notifications.find_by_id(id).await? else {
            return Err(AppError::NotFound(format!("notification '{id}' not found")));
        };

        if notification.read {
            return Ok(notification);
        }

        let now = Utc::now();
        self.notifications.mark_read(&[id], now).await?;
        notification.read = true;
        notification.updated_at = now;
        Ok(notification)
    }

    /// Marks every unread notification of `user` as read in one batch write.
    ///
    /// Returns the number of rows flipped.
    pub async fn mark_all_as_read(&self, user: UserId) -> AppResult<usize> {
        let unread = self.notifications.list_unread_for_user(user).await?;
        if unread.is_empty() {
            return Ok(0);
        }

        let ids: Vec<NotificationId> = unread.iter().map(|notification| notification.id).collect();
        self.notifications.mark_read(&ids, Utc::now()).await?;
        Ok(ids.len())
    }

    /// Deletes one notification.
    pub async fn delete_notification(&self, id: NotificationId) -> AppResult<()> {
        self.notifications.delete(id).await
    }

    /// Deletes notifications created strictly more than 30 days ago.
    ///
    /// Rows exactly at the boundary are preserved. Returns the deleted count.
    pub async fn delete_old_notifications(&self) -> AppResult<u64> {
        let cutoff = Utc::now() - Duration::days(RETENTION_DAYS);
        let deleted = self.notifications.delete_created_before(cutoff).await?;
        info!(deleted = deleted, "retention sweep removed old notifications");
        Ok(deleted)
    }

    /// Replaces the user's delivery preferences. Last write wins.
    pub async fn update_preferences(
        &self,
        user: UserId,
        preferences: NotificationPreferences,
    ) -> AppResult<NotificationPreferences> {
        self.preferences.upsert(user, preferences).await?;
        Ok(preferences)
    }

    /// Returns the user's delivery preferences.
    ///
    /// Always fully populated: the canonical defaults apply when no row
    /// exists yet, so callers never branch on absence.
    pub async fn preferences(&self, user: UserId) -> AppResult<NotificationPreferences> {
        Ok(self
            .preferences
            .find_for_user(user)
            .await?
            .unwrap_or_default())
    }

    /// Sends a fixed-shape reminder for an upcoming event.
    pub async fn send_event_reminder(
        &self,
        user: UserId,
        event_title: &str,
    ) -> AppResult<Notification> {
        self.notify_user(
            user,
            NotificationRequest {
                title: "Event Reminder".to_owned(),
                message: format!("Your event '{event_title}' starts in 1 hour"),
                kind: NotificationKind::EventReminder,
            },
        )
        .await
    }

    /// Sends a fixed-shape booking confirmation.
    pub async fn send_booking_confirmation(
        &self,
        user: UserId,
        event_title: &str,
        booking_reference: &str,
    ) -> AppResult<Notification> {
        self.notify_user(
            user,
            NotificationRequest {
                title: "Booking Confirmed".to_owned(),
                message: format!(
                    "Your booking for '{event_title}' is confirmed. Reference: {booking_reference}"
                ),
                kind: NotificationKind::BookingConfirmation,
            },
        )
        .await
    }

    /// Sends a fixed-shape event cancellation notice.
    pub async fn send_cancellation_notification(
        &self,
        user: UserId,
        event_title: &str,
    ) -> AppResult<Notification> {
        self.notify_user(
            user,
            NotificationRequest {
                title: "Event Cancelled".to_owned(),
                message: format!("The event '{event_title}' has been cancelled"),
                kind: NotificationKind::EventCancellation,
            },
        )
        .await
    }

    /// Returns total/unread/read counts for one user.
    pub async fn notification_stats(&self, user: UserId) -> AppResult<NotificationStats> {
        let all = self.notifications.list_for_user(user).await?;
        let unread = self.notifications.list_unread_for_user(user).await?;

        let total = all.len() as u64;
        let unread = unread.len() as u64;
        Ok(NotificationStats {
            total,
            unread,
            read: total.saturating_sub(unread),
        })
    }
}
