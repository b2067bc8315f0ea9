//! Read-only PostgreSQL access to the event catalogue owned by the web
//! application.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use encore_application::EventCatalogRepository;
use encore_core::{AppError, AppResult};
use encore_domain::{EventId, EventSummary, UserId};

/// PostgreSQL implementation of the event catalogue port.
#[derive(Clone)]
pub struct PostgresEventCatalogRepository {
    pool: PgPool,
}

impl PostgresEventCatalogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct EventRow {
    id: Uuid,
    title: String,
    category: Option<String>,
    ticket_price: Option<f64>,
    start_date: DateTime<Utc>,
    organizer_id: Uuid,
}

impl From<EventRow> for EventSummary {
    fn from(row: EventRow) -> Self {
        Self {
            id: EventId::from_uuid(row.id),
            title: row.title,
            category: row.category,
            ticket_price: row.ticket_price,
            start_date: row.start_date,
            organizer: UserId::from_uuid(row.organizer_id),
        }
    }
}

const SELECT_COLUMNS: &str = "id, title, category, ticket_price, start_date, organizer_id";

#[async_trait]
impl EventCatalogRepository for PostgresEventCatalogRepository {
    async fn count_events(&self) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events")
            .fetch_one(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to count events: {error}")))?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn list_events(&self) -> AppResult<Vec<EventSummary>> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            SELECT {SELECT_COLUMNS}
            FROM events
            ORDER BY start_date ASC
            "#,
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list events: {error}")))?;

        Ok(rows.into_iter().map(EventSummary::from).collect())
    }

    async fn list_by_organizer(&self, organizer: UserId) -> AppResult<Vec<EventSummary>> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            SELECT {SELECT_COLUMNS}
            FROM events
            WHERE organizer_id = $1
            ORDER BY start_date ASC
            "#,
        ))
        .bind(organizer.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list organizer events: {error}"))
        })?;

        Ok(rows.into_iter().map(EventSummary::from).collect())
    }
}
