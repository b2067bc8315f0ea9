//! Best-effort audit recorder over an append-only log port.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use encore_core::AppResult;
use encore_domain::{AuditAction, AuditLogEntry, BookingId, EventId, UserId};


/// Port for persisting and querying append-only audit entries.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Appends one entry. Entries are never updated or deleted.
    async fn append(&self, entry: AuditLogEntry) -> AppResult<()>;

    /// Lists entries for one entity, newest first.
    async fn list_for_entity(
        &self,
        entity_type: &str,
        entity_id: Uuid,
    ) -> AppResult<Vec<AuditLogEntry>>;

    /// Lists entries recorded by one actor inside a date window.
    async fn list_for_actor(
        &self,
        actor: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<AuditLogEntry>>;

    /// Lists entries inside a date window.
    async fn list_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<AuditLogEntry>>;
}

/// Whether an audit write reached the log.
///
/// Audit persistence failures never abort the caller's primary operation,
/// so they surface here instead of as an `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditStatus {
    /// The entry was appended.
    Recorded,
    /// The entry was dropped; the reason was logged.
    Degraded(String),
}

impl AuditStatus {
    /// Reports whether the entry reached the log.
    #[must_use]
    pub fn recorded(&self) -> bool {
        matches!(self, Self::Recorded)
    }
}

/// Per-action counts over a date window.
///
/// The four tracked buckets cover CREATE, UPDATE, DELETE and LOGIN;
/// untracked actions contribute to `total_entries` only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceReport {
    /// Window start (inclusive).
    pub start: DateTime<Utc>,
    /// Window end (exclusive).
    pub end: DateTime<Utc>,
    /// Every entry in the window, tracked or not.
    pub total_entries: u64,
    /// CREATE entries.
    pub creations: u64,
    /// UPDATE entries.
    pub updates: u64,
    /// DELETE entries.
    pub deletions: u64,
    /// LOGIN entries.
    pub logins: u64,
}

/// Application service for activity auditing.
#[derive(Clone)]
pub struct AuditService {
    repository: Arc<dyn AuditLogRepository>,
}

impl AuditService {
    /// Creates a service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn AuditLogRepository>) -> Self {
        Self { repository }
    }

    /// Appends one entry with a server-assigned id and timestamp.
    ///
    /// Persistence failures are swallowed and reported as
    /// [`AuditStatus::Degraded`] so auditing never blocks the caller.
    pub async fn record(
        &self,
        actor: Option<UserId>,
        entity_type: &str,
        entity_id: Option<Uuid>,
        action: AuditAction,
        detail: String,
    ) -> AuditStatus {
        let entry = AuditLogEntry {
            id: Uuid::new_v4(),
            actor,
            entity_type: entity_type.to_owned(),
            entity_id,
            action,
            detail,
            created_at: Utc::now(),
        };

        match self.repository.append(entry).await {
            Ok(()) => AuditStatus::Recorded,
            Err(error) => {
                let reason = error.to_string();
                warn!(entity_type = entity_type, error = %reason, "dropping audit entry");
                AuditStatus::Degraded(reason)
            }
        }
    }

    /// Appends one entry with a structured detail payload.
    ///
    /// A payload that fails to serialize is replaced with `{}` rather than
    /// failing the audit call.
    pub async fn record_with_payload<T: Serialize>(
        &self,
        actor: Option<UserId>,
        entity_type: &str,
        entity_id: Option<Uuid>,
        action: AuditAction,
        payload: &T,
    ) -> AuditStatus {
        let detail = match serde_json::to_string(payload) {
            Ok(detail) => detail,
            Err(error) => {
                warn!(entity_type = entity_type, error = %error, "audit payload failed to serialize");
                "{}".to_owned()
            }
        };

        self.record(actor, entity_type, entity_id, action, detail)
            .await
    }

    /// Records a user sign-in.
    pub async fn record_user_login(&self, user: UserId, email: &str) -> AuditStatus {
        let payload = json!({ "email": email, "timestamp": Utc::now() });
        self.record_with_payload(
            Some(user),
            "User",
            Some(user.as_uuid()),
            AuditAction::Login,
            &payload,
        )
        .await
    }

    /// Records a user sign-out.
    pub async fn record_user_logout(&self, user: UserId) -> AuditStatus {
        let payload = json!({ "timestamp": Utc::now() });
        self.record_with_payload(
            Some(user),
            "User",
            Some(user.as_uuid()),
            AuditAction::Logout,
            &payload,
        )
        .await
    }

    /// Records an event creation.
    pub async fn record_event_created(
        &self,
        actor: UserId,
        event: EventId,
        title: &str,
    ) -> AuditStatus {
        let payload = json!({ "title": title, "created_by": actor });
        self.record_with_payload(
            Some(actor),
            "Event",
            Some(event.as_uuid()),
            AuditAction::Create,
            &payload,
        )
        .await
    }

    /// Records an event update with the changed fields.
    pub async fn record_event_updated(
        &self,
        actor: UserId,
        event: EventId,
        title: &str,
        changes: &serde_json::Value,
    ) -> AuditStatus {
        let payload = json!({ "title": title, "changes": changes });
        self.record_with_payload(
            Some(actor),
            "Event",
            Some(event.as_uuid()),
            AuditAction::Update,
            &payload,
        )
        .await
    }

    /// Records an event deletion.
    pub async fn record_event_deleted(
        &self,
        actor: UserId,
        event: EventId,
        title: &str,
    ) -> AuditStatus {
        let payload = json!({ "title": title, "deleted_by": actor });
        self.record_with_payload(
            Some(actor),
            "Event",
            Some(event.as_uuid()),
            AuditAction::Delete,
            &payload,
        )
        .await
    }

    /// Records a booking creation.
    pub async fn record_booking_created(
        &self,
        actor: UserId,
        booking: BookingId,
        event: EventId,
        event_title: &str,
    ) -> AuditStatus {
        let payload = json!({
            "event_id": event,
            "event_title": event_title,
            "booked_by": actor,
        });
        self.record_with_payload(
            Some(actor),
            "Booking",
            Some(booking.as_uuid()),
            AuditAction::Create,
            &payload,
        )
        .await
    }

    /// Records a booking cancellation.
    pub async fn record_booking_cancelled(
        &self,
        actor: UserId,
        booking: BookingId,
        event: EventId,
    ) -> AuditStatus {
        let payload = json!({ "event_id": event, "cancelled_by": actor });
        self.record_with_payload(
            Some(actor),
            "Booking",
            Some(booking.as_uuid()),
            AuditAction::Cancel,
            &payload,
        )
        .await
    }

    /// Records a file upload.
    pub async fn record_file_upload(
        &self,
        actor: UserId,
        file_name: &str,
        file_type: &str,
        file_size: u64,
    ) -> AuditStatus {
        let payload = json!({
            "file_name": file_name,
            "file_type": file_type,
            "file_size": file_size,
        });
        self.record_with_payload(Some(actor), "File", None, AuditAction::Upload, &payload)
            .await
    }

    /// Records a file deletion.
    pub async fn record_file_deletion(&self, actor: UserId, file_name: &str) -> AuditStatus {
        let payload = json!({ "file_name": file_name });
        self.record_with_payload(Some(actor), "File", None, AuditAction::Delete, &payload)
            .await
    }

    /// Lists the change history of one entity.
    pub async fn entity_history(
        &self,
        entity_type: &str,
        entity_id: Uuid,
    ) -> AppResult<Vec<AuditLogEntry>> {
        self.repository.list_for_entity(entity_type, entity_id).await
    }

    /// Lists one actor's activity inside a date window.
    pub async fn actor_activity(
        &self,
        actor: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<AuditLogEntry>> {
        self.repository.list_for_actor(actor, start, end).await
    }

    /// Lists all activity inside a date window.
    pub async fn activity_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<AuditLogEntry>> {
        self.repository.list_in_range(start, end).await
    }

    /// Counts entries per tracked action over a date window.
    pub async fn compliance_report(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<ComplianceReport> {
        let entries = self.repository.list_in_range(start, end).await?;

        let mut report = ComplianceReport {
            start,
            end,
            total_entries: entries.len() as u64,
            creations: 0,
            updates: 0,
            deletions: 0,
            logins: 0,
        };

        for entry in &entries {
            match entry.action {
                AuditAction::Create => report.creations += 1,
                AuditAction::Update => report.updates += 1,
                AuditAction::Delete => report.deletions += 1,
                AuditAction::Login => report.logins += 1,
                _ => {}
            }
        }

        Ok(report)
    }

    /// Scans for suspicious activity patterns.
    ///
    /// Placeholder: always returns an empty list until a real detector is
    /// specified.
    pub async fn detect_anomalies(&self) -> AppResult<Vec<String>> {
        Ok(Vec::new())
    }
}
