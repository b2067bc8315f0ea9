//! PostgreSQL-backed repository for notification rows.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use encore_application::NotificationRepository;
use encore_core::{AppError, AppResult};
use encore_domain::{Notification, NotificationId, NotificationKind, UserId};

#[cfg(test)]
mod tests;

/// PostgreSQL implementation of the notification port.
#[derive(Clone)]
pub struct PostgresNotificationRepository {
    pool: PgPool,
}

impl PostgresNotificationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct NotificationRow {
    id: Uuid,
    recipient_id: Uuid,
    title: String,
    message: String,
    kind: String,
    read: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Self {
            id: NotificationId::from_uuid(row.id),
            recipient: UserId::from_uuid(row.recipient_id),
            title: row.title,
            message: row.message,
            kind: NotificationKind::from_tag(row.kind.as_str()),
            read: row.read,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_COLUMNS: &str =
    "id, recipient_id, title, message, kind, read, created_at, updated_at";

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    async fn insert(&self, notification: Notification) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (
                id,
                recipient_id,
                title,
                message,
                kind,
                read,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(notification.id.as_uuid())
        .bind(notification.recipient.as_uuid())
        .bind(notification.title)
        .bind(notification.message)
        .bind(notification.kind.as_str())
        .bind(notification.read)
        .bind(notification.created_at)
        .bind(notification.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to insert notification: {error}")))?;

        Ok(())
    }

    async fn find_by_id(&self, id: NotificationId) -> AppResult<Option<Notification>> {
        let row = sqlx::query_as::<_, NotificationRow>(&format!(
            r#"
            SELECT {SELECT_COLUMNS}
            FROM notifications
            WHERE id = $1
            "#,
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load notification: {error}")))?;

        Ok(row.map(Notification::from))
    }

    async fn list_for_user(&self, user: UserId) -> AppResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(&format!(
            r#"
            SELECT {SELECT_COLUMNS}
            FROM notifications
            WHERE recipient_id = $1
            ORDER BY created_at DESC
            "#,
        ))
        .bind(user.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list notifications: {error}")))?;

        Ok(rows.into_iter().map(Notification::from).collect())
    }

    async fn list_unread_for_user(&self, user: UserId) -> AppResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(&format!(
            r#"
            SELECT {SELECT_COLUMNS}
            FROM notifications
            WHERE recipient_id = $1 AND read = FALSE
            ORDER BY created_at DESC
            "#,
        ))
        .bind(user.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list unread notifications: {error}"))
        })?;

        Ok(rows.into_iter().map(Notification::from).collect())
    }

    async fn mark_read(&self, ids: &[NotificationId], updated_at: DateTime<Utc>) -> AppResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let raw_ids: Vec<Uuid> = ids.iter().map(NotificationId::as_uuid).collect();
        sqlx::query(
            r#"
            UPDATE notifications
            SET read = TRUE, updated_at = $2
            WHERE id = ANY($1) AND read = FALSE
            "#,
        )
        .bind(raw_ids)
        .bind(updated_at)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to mark notifications read: {error}"))
        })?;

        Ok(())
    }

    async fn delete(&self, id: NotificationId) -> AppResult<()> {
        sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to delete notification: {error}"))
            })?;

        Ok(())
    }

    async fn delete_created_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM notifications WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to sweep old notifications: {error}"))
            })?;

        Ok(result.rows_affected())
    }
}
