use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use encore_core::{AppError, AppResult};
use encore_domain::{
    Notification, NotificationId, NotificationKind, NotificationPreferences, NotificationRequest,
    UserId,
};

use super::{NotificationPreferenceRepository, NotificationRepository, NotificationService};

struct FakeNotificationRepository {
    rows: Mutex<Vec<Notification>>,
    reject_inserts: AtomicBool,
}

impl FakeNotificationRepository {
    fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            reject_inserts: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl NotificationRepository for FakeNotificationRepository {
    async fn insert(&self, notification: Notification) -> AppResult<()> {
        if self.reject_inserts.load(Ordering::SeqCst) {
            return Err(AppError::Internal("insert rejected".to_owned()));
        }
        self.rows.lock().await.push(notification);
        Ok(())
    }

    async fn find_by_id(&self, id: NotificationId) -> AppResult<Option<Notification>> {
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .find(|row| row.id == id)
            .cloned())
    }

    async fn list_for_user(&self, user: UserId) -> AppResult<Vec<Notification>> {
        let mut rows: Vec<Notification> = self
            .rows
            .lock()
            .await
            .iter()
            .filter(|row| row.recipient == user)
            .cloned()
            .collect();
        rows.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(rows)
    }

    async fn list_unread_for_user(&self, user: UserId) -> AppResult<Vec<Notification>> {
        let mut rows: Vec<Notification> = self
            .rows
            .lock()
            .await
            .iter()
            .filter(|row| row.recipient == user && !row.read)
            .cloned()
            .collect();
        rows.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(rows)
    }

    async fn mark_read(&self, ids: &[NotificationId], updated_at: DateTime<Utc>) -> AppResult<()> {
        let mut rows = self.rows.lock().await;
        for row in rows.iter_mut() {
            if ids.contains(&row.id) {
                row.read = true;
                row.updated_at = updated_at;
            }
        }
        Ok(())
    }

    async fn delete(&self, id: NotificationId) -> AppResult<()> {
        self.rows.lock().await.retain(|row| row.id != id);
        Ok(())
    }

    async fn delete_created_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let mut rows = self.rows.lock().await;
        let before = rows.len();
        rows.retain(|row| row.created_at >= cutoff);
        Ok((before - rows.len()) as u64)
    }
}

struct FakePreferenceRepository {
    rows: Mutex<HashMap<UserId, NotificationPreferences>>,
}

impl FakePreferenceRepository {
    fn new() -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl NotificationPreferenceRepository for FakePreferenceRepository {
    async fn find_for_user(&self, user: UserId) -> AppResult<Option<NotificationPreferences>> {
        Ok(self.rows.lock().await.get(&user).copied())
    }

    async fn upsert(&self, user: UserId, preferences: NotificationPreferences) -> AppResult<()> {
        self.rows.lock().await.insert(user, preferences);
        Ok(())
    }
}

fn request() -> NotificationRequest {
    NotificationRequest {
        title: "Booking Confirmed".to_owned(),
        message: "Your booking is confirmed".to_owned(),
        kind: NotificationKind::BookingConfirmation,
    }
}

fn service() -> (NotificationService, Arc<FakeNotificationRepository>) {
    let notifications = Arc::new(FakeNotificationRepository::new());
    let preferences = Arc::new(FakePreferenceRepository::new());
    (
        NotificationService::new(notifications.clone(), preferences),
        notifications,
    )
}

#[tokio::test]
async fn notify_user_creates_an_unread_row() {
    let (service, _repository) = service();
    let user = UserId::new();

    let Ok(notification) = service.notify_user(user, request()).await else {
        panic!("expected notification");
    };

    assert_eq!(notification.recipient, user);
    assert!(!notification.read);
    assert_eq!(notification.created_at, notification.updated_at);
}

#[tokio::test]
async fn notify_user_rejects_blank_titles() {
    let (service, repository) = service();

    let result = service
        .notify_user(
            UserId::new(),
            NotificationRequest {
                title: "   ".to_owned(),
                message: "body".to_owned(),
                kind: NotificationKind::General,
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(repository.rows.lock().await.is_empty());
}

#[tokio::test]
async fn mark_as_read_flips_the_flag_once() {
    let (service, _repository) = service();
    let user = UserId::new();
    let Ok(notification) = service.notify_user(user, request()).await else {
        panic!("expected notification");
    };

    let Ok(updated) = service.mark_as_read(notification.id).await else {
        panic!("expected read flag to flip");
    };
    assert!(updated.read);

    let Ok(fetched) = service.user_notifications(user).await else {
        panic!("expected notifications");
    };
    assert!(fetched[0].read);
}

#[tokio::test]
async fn mark_as_read_reports_not_found_for_missing_id() {
    let (service, _repository) = service();

    let result = service.mark_as_read(NotificationId::new()).await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn mark_all_as_read_only_touches_the_given_user() {
    let (service, _repository) = service();
    let alice = UserId::new();
    let bob = UserId::new();

    for user in [alice, alice, bob] {
        let Ok(_) = service.notify_user(user, request()).await else {
            panic!("expected notification");
        };
    }

    let Ok(flipped) = service.mark_all_as_read(alice).await else {
        panic!("expected batch update");
    };
    assert_eq!(flipped, 2);

    let Ok(alice_unread) = service.unread_notifications(alice).await else {
        panic!("expected unread list");
    };
    assert!(alice_unread.is_empty());

    let Ok(bob_unread) = service.unread_notifications(bob).await else {
        panic!("expected unread list");
    };
    assert_eq!(bob_unread.len(), 1);
}

#[tokio::test]
async fn notify_many_continues_past_failures() {
    let (service, repository) = service();
    let first = UserId::new();
    let second = UserId::new();

    // Fail the first insert only.
    repository.reject_inserts.store(true, Ordering::SeqCst);
    let created = service.notify_many(&[first], &request()).await;
    assert!(created.is_empty());

    repository.reject_inserts.store(false, Ordering::SeqCst);
    let created = service.notify_many(&[first, second], &request()).await;
    assert_eq!(created.len(), 2);
}

#[tokio::test]
async fn retention_sweep_preserves_boundary_rows() {
    let (service, repository) = service();
    let user = UserId::new();

    let now = Utc::now();
    let make_row = |age: Duration| Notification {
        id: NotificationId::new(),
        recipient: user,
        title: "old".to_owned(),
        message: "old".to_owned(),
        kind: NotificationKind::General,
        read: true,
        created_at: now - age,
        updated_at: now - age,
    };

    {
        let mut rows = repository.rows.lock().await;
        rows.push(make_row(Duration::days(31)));
        rows.push(make_row(Duration::days(29)));
        // A row exactly at the 30-day boundary must survive a strict sweep.
        rows.push(make_row(Duration::days(30) - Duration::seconds(1)));
    }

    let Ok(deleted) = service.delete_old_notifications().await else {
        panic!("expected sweep to run");
    };

    assert_eq!(deleted, 1);
    let Ok(remaining) = service.user_notifications(user).await else {
        panic!("expected notifications");
    };
    assert_eq!(remaining.len(), 2);
}

#[tokio::test]
async fn preferences_default_until_updated() {
    let (service, _repository) = service();
    let user = UserId::new();

    let Ok(defaults) = service.preferences(user).await else {
        panic!("expected defaults");
    };
    assert_eq!(defaults, NotificationPreferences::default());

    let wanted = NotificationPreferences {
        email_notifications: false,
        push_notifications: true,
        sms_notifications: true,
        event_reminders: false,
        marketing_emails: true,
    };
    let Ok(stored) = service.update_preferences(user, wanted).await else {
        panic!("expected upsert");
    };
    assert_eq!(stored, wanted);

    let Ok(fetched) = service.preferences(user).await else {
        panic!("expected preferences");
    };
    assert_eq!(fetched, wanted);
}

#[tokio::test]
async fn stats_split_read_and_unread() {
    let (service, _repository) = service();
    let user = UserId::new();

    let Ok(first) = service.notify_user(user, request()).await else {
        panic!("expected notification");
    };
    let Ok(_) = service.notify_user(user, request()).await else {
        panic!("expected notification");
    };
    let Ok(_) = service.mark_as_read(first.id).await else {
        panic!("expected read flag to flip");
    };

    let Ok(stats) = service.notification_stats(user).await else {
        panic!("expected stats");
    };
    assert_eq!(stats.total, 2);
    assert_eq!(stats.unread, 1);
    assert_eq!(stats.read, 1);
}

#[tokio::test]
async fn convenience_senders_tag_the_right_kind() {
    let (service, _repository) = service();
    let user = UserId::new();

    let Ok(reminder) = service.send_event_reminder(user, "Summer Jam").await else {
        panic!("expected reminder");
    };
    assert_eq!(reminder.kind, NotificationKind::EventReminder);
    assert!(reminder.message.contains("Summer Jam"));

    let Ok(cancelled) = service
        .send_cancellation_notification(user, "Summer Jam")
        .await
    else {
        panic!("expected cancellation notice");
    };
    assert_eq!(cancelled.kind, NotificationKind::EventCancellation);

    let Ok(confirmation) = service
        .send_booking_confirmation(user, "Summer Jam", "BK-1234")
        .await
    else {
        panic!("expected confirmation");
    };
    assert_eq!(confirmation.kind, NotificationKind::BookingConfirmation);
    assert!(confirmation.message.contains("BK-1234"));
}
