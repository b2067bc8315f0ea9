//! PostgreSQL-backed repository for the append-only audit log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use encore_application::AuditLogRepository;
use encore_core::{AppError, AppResult};
use encore_domain::{AuditAction, AuditLogEntry, UserId};


/// PostgreSQL implementation of the audit log port.
#[derive(Clone)]
pub struct PostgresAuditLogRepository {
    pool: PgPool,
}

impl PostgresAuditLogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AuditLogRow {
    id: Uuid,
    actor_id: Option<Uuid>,
    entity_type: String,
    entity_id: Option<Uuid>,
    action: String,
    detail: String,
    created_at: DateTime<Utc>,
}

impl From<AuditLogRow> for AuditLogEntry {
    fn from(row: AuditLogRow) -> Self {
        Self {
            id: row.id,
            actor: row.actor_id.map(UserId::from_uuid),
            entity_type: row.entity_type,
            entity_id: row.entity_id,
            action: AuditAction::from(row.action),
            detail: row.detail,
            created_at: row.created_at,
        }
    }
}

const SELECT_COLUMNS: &str = "id, actor_id, entity_type, entity_id, action, detail, created_at";

#[async_trait]
impl AuditLogRepository for PostgresAuditLogRepository {
    async fn append(&self, entry: AuditLogEntry) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_log_entries (
                id,
                actor_id,
                entity_type,
                entity_id,
                action,
                detail,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.id)
        .bind(entry.actor.map(|actor| actor.as_uuid()))
        .bind(entry.entity_type)
        .bind(entry.entity_id)
        .bind(entry.action.as_str().to_owned())
        .bind(entry.detail)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to append audit entry: {error}")))?;

        Ok(())
    }

    async fn list_for_entity(
        &self,
        entity_type: &str,
        entity_id: Uuid,
    ) -> AppResult<Vec<AuditLogEntry>> {
        let rows = sqlx::query_as::<_, AuditLogRow>(&format!(
            r#"
            SELECT {SELECT_COLUMNS}
            FROM audit_log_entries
            WHERE entity_type = $1 AND entity_id = $2
            ORDER BY created_at DESC
            "#,
        ))
        .bind(entity_type)
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list entity audit entries: {error}"))
        })?;

        Ok(rows.into_iter().map(AuditLogEntry::from).collect())
    }

    async fn list_for_actor(
        &self,
        actor: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<AuditLogEntry>> {
        let rows = sqlx::query_as::<_, AuditLogRow>(&format!(
            r#"
            SELECT {SELECT_COLUMNS}
            FROM audit_log_entries
            WHERE actor_id = $1 AND created_at >= $2 AND created_at < $3
            ORDER BY created_at DESC
            "#,
        ))
        .bind(actor.as_uuid())
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list actor audit entries: {error}"))
        })?;

        Ok(rows.into_iter().map(AuditLogEntry::from).collect())
    }

    async fn list_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<AuditLogEntry>> {
        let rows = sqlx::query_as::<_, AuditLogRow>(&format!(
            r#"
            SELECT {SELECT_COLUMNS}
            FROM audit_log_entries
            WHERE created_at >= $1 AND created_at < $2
            ORDER BY created_at DESC
            "#,
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list audit entries in range: {error}"))
        })?;

        Ok(rows.into_iter().map(AuditLogEntry::from).collect())
    }
}
