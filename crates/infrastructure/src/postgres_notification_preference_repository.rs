//! PostgreSQL-backed repository for per-user delivery preferences.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{FromRow, PgPool};

use encore_application::NotificationPreferenceRepository;
use encore_core::{AppError, AppResult};
use encore_domain::{NotificationPreferences, UserId};

/// PostgreSQL implementation of the preference port. Upserts are last write
/// wins; no row locking.
#[derive(Clone)]
pub struct PostgresNotificationPreferenceRepository {
    pool: PgPool,
}

impl PostgresNotificationPreferenceRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PreferenceRow {
    email_notifications: bool,
    push_notifications: bool,
    sms_notifications: bool,
    event_reminders: bool,
    marketing_emails: bool,
}

impl From<PreferenceRow> for NotificationPreferences {
    fn from(row: PreferenceRow) -> Self {
        Self {
            email_notifications: row.email_notifications,
            push_notifications: row.push_notifications,
            sms_notifications: row.sms_notifications,
            event_reminders: row.event_reminders,
            marketing_emails: row.marketing_emails,
        }
    }
}

#[async_trait]
impl NotificationPreferenceRepository for PostgresNotificationPreferenceRepository {
    async fn find_for_user(&self, user: UserId) -> AppResult<Option<NotificationPreferences>> {
        let row = sqlx::query_as::<_, PreferenceRow>(
            r#"
            SELECT
                email_notifications,
                push_notifications,
                sms_notifications,
                event_reminders,
                marketing_emails
            FROM notification_preferences
            WHERE user_id = $1
            "#,
        )
        .bind(user.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load notification preferences: {error}"))
        })?;

        Ok(row.map(NotificationPreferences::from))
    }

    async fn upsert(&self, user: UserId, preferences: NotificationPreferences) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO notification_preferences (
                user_id,
                email_notifications,
                push_notifications,
                sms_notifications,
                event_reminders,
                marketing_emails,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id) DO UPDATE SET
                email_notifications = EXCLUDED.email_notifications,
                push_notifications = EXCLUDED.push_notifications,
                sms_notifications = EXCLUDED.sms_notifications,
                event_reminders = EXCLUDED.event_reminders,
                marketing_emails = EXCLUDED.marketing_emails,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user.as_uuid())
        .bind(preferences.email_notifications)
        .bind(preferences.push_notifications)
        .bind(preferences.sms_notifications)
        .bind(preferences.event_reminders)
        .bind(preferences.marketing_emails)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to upsert notification preferences: {error}"))
        })?;

        Ok(())
    }
}
