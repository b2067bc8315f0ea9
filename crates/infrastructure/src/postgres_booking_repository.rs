//! Read-only PostgreSQL access to booking rows owned by the web application.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use encore_application::BookingRepository;
use encore_core::{AppError, AppResult};
use encore_domain::{EventId, UserId};

/// PostgreSQL implementation of the booking port.
#[derive(Clone)]
pub struct PostgresBookingRepository {
    pool: PgPool,
}

impl PostgresBookingRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AttendanceRow {
    event_id: Uuid,
    bookings: i64,
}

#[async_trait]
impl BookingRepository for PostgresBookingRepository {
    async fn count_bookings(&self) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings")
            .fetch_one(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to count bookings: {error}")))?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn count_for_user(&self, user: UserId) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE user_id = $1")
            .bind(user.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to count user bookings: {error}"))
            })?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn attendance_by_event(&self) -> AppResult<HashMap<EventId, u64>> {
        let rows = sqlx::query_as::<_, AttendanceRow>(
            r#"
            SELECT event_id, COUNT(*) AS bookings
            FROM bookings
            GROUP BY event_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to aggregate event attendance: {error}"))
        })?;

        Ok(rows
            .into_iter()
            .map(|row| {
                (
                    EventId::from_uuid(row.event_id),
                    u64::try_from(row.bookings).unwrap_or(0),
                )
            })
            .collect())
    }
}
