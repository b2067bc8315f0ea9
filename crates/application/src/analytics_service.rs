//! Derived metrics over the event catalogue and booking records.
//!
//! Every metric is a full in-memory scan of repository results; the hot
//! ones are memoized through the cache-aside accessor with fixed TTLs.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use encore_core::AppResult;
use encore_domain::{EventId, EventSummary, UserId};

use crate::cache_service::CacheService;

#[cfg(test)]
mod tests;

const TOTAL_EVENTS_KEY: &str = "analytics:total_events";
const TOTAL_BOOKINGS_KEY: &str = "analytics:total_bookings";
const CONVERSION_RATE_KEY: &str = "analytics:conversion_rate";
const TOP_EVENTS_KEY: &str = "analytics:top_events";
const CATEGORY_POPULARITY_KEY: &str = "analytics:category_popularity";

const HOUR_TTL_SECONDS: u64 = 3600;
const HALF_HOUR_TTL_SECONDS: u64 = 1800;

/// Read-only port over the event catalogue owned by the web application.
#[async_trait]
pub trait EventCatalogRepository: Send + Sync {
    /// Counts all events.
    async fn count_events(&self) -> AppResult<u64>;

    /// Lists all events.
    async fn list_events(&self) -> AppResult<Vec<EventSummary>>;

    /// Lists one organizer's events.
    async fn list_by_organizer(&self, organizer: UserId) -> AppResult<Vec<EventSummary>>;
}

/// Read-only port over booking records owned by the web application.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Counts all bookings.
    async fn count_bookings(&self) -> AppResult<u64>;

    /// Counts one user's bookings.
    async fn count_for_user(&self, user: UserId) -> AppResult<u64>;

    /// Returns the booking count per event.
    async fn attendance_by_event(&self) -> AppResult<HashMap<EventId, u64>>;
}

/// One entry of the attendance ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopEvent {
    /// Event identifier.
    pub id: EventId,
    /// Display title.
    pub title: String,
    /// Category label, when assigned.
    pub category: Option<String>,
    /// Ticket price.
    pub ticket_price: Option<f64>,
    /// Scheduled start.
    pub start_date: DateTime<Utc>,
    /// Booking count for the event.
    pub attendance: u64,
}

/// Revenue summary for one organizer over a reporting window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueMetrics {
    /// Organizer the metrics cover.
    pub organizer: UserId,
    /// Reporting window start.
    pub start: DateTime<Utc>,
    /// Reporting window end.
    pub end: DateTime<Utc>,
    /// Sum of ticket prices over the organizer's events.
    pub total_revenue: f64,
    /// Number of events.
    pub event_count: u64,
    /// Average revenue per event; `0.0` when the organizer has no events.
    pub average_revenue_per_event: f64,
}

/// Engagement summary for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementMetrics {
    /// User the metrics cover.
    pub user: UserId,
    /// Bookings made by the user.
    pub total_bookings: u64,
}

/// Descriptor of a reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventsTrend {
    /// Window start.
    pub start: DateTime<Utc>,
    /// Window end.
    pub end: DateTime<Utc>,
    /// Number of whole days inside the window.
    pub period_days: i64,
}

/// Aggregated snapshot for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    /// Total event count.
    pub total_events: u64,
    /// Total booking count.
    pub total_bookings: u64,
    /// Bookings per event.
    pub conversion_rate: f64,
    /// Top five events by attendance.
    pub top_events: Vec<TopEvent>,
    /// Event count per category.
    pub category_popularity: BTreeMap<String, u64>,
    /// When the snapshot was generated.
    pub generated_at: DateTime<Utc>,
}

/// Application service for analytics aggregation.
#[derive(Clone)]
pub struct AnalyticsService {
    events: Arc<dyn EventCatalogRepository>,
    bookings: Arc<dyn BookingRepository>,
    cache: CacheService,
}

impl AnalyticsService {
    /// Creates a service from the catalogue ports and the cache accessor.
    #[must_use]
    pub fn new(
        events: Arc<dyn EventCatalogRepository>,
        bookings: Arc<dyn BookingRepository>,
        cache: CacheService,
    ) -> Self {
        Self {
            events,
            bookings,
            cache,
        }
    }

    /// Total number of events. Memoized for an hour.
    pub async fn total_events(&self) -> AppResult<u64> {
        let events = self.events.clone();
        let lookup = self
            .cache
            .get_or_compute(TOTAL_EVENTS_KEY, HOUR_TTL_SECONDS, move || async move {
                events.count_events().await
            })
            .await?;
        Ok(lookup.value)
    }

    /// Total number of bookings. Memoized for an hour.
    pub async fn total_bookings(&self) -> AppResult<u64> {
        let bookings = self.bookings.clone();
        let lookup = self
            .cache
            .get_or_compute(TOTAL_BOOKINGS_KEY, HOUR_TTL_SECONDS, move || async move {
                bookings.count_bookings().await
            })
            .await?;
        Ok(lookup.value)
    }

    /// Bookings per event. `0.0` when there are no events. Memoized for an
    /// hour.
    pub async fn booking_conversion_rate(&self) -> AppResult<f64> {
        let service = self.clone();
        let lookup = self
            .cache
            .get_or_compute(CONVERSION_RATE_KEY, HOUR_TTL_SECONDS, move || async move {
                let total_events = service.total_events().await?;
                if total_events == 0 {
                    return Ok(0.0);
                }
                let total_bookings = service.total_bookings().await?;
                Ok(total_bookings as f64 / total_events as f64)
            })
            .await?;
        Ok(lookup.value)
    }

    /// Events ranked by attendance, descending, truncated to `limit`.
    ///
    /// The full ranking is memoized for thirty minutes and truncated after
    /// retrieval, so different limits share one cache entry.
    pub async fn top_events(&self, limit: usize) -> AppResult<Vec<TopEvent>> {
        let events = self.events.clone();
        let bookings = self.bookings.clone();
        let lookup = self
            .cache
            .get_or_compute(
                TOP_EVENTS_KEY,
                HALF_HOUR_TTL_SECONDS,
                move || async move {
                    let all_events = events.list_events().await?;
                    let attendance = bookings.attendance_by_event().await?;
                    Ok(rank_by_attendance(all_events, &attendance))
                },
            )
            .await?;

        let mut ranked = lookup.value;
        ranked.truncate(limit);
        Ok(ranked)
    }

    /// Event count per category, `"Other"` for uncategorised events.
    /// Memoized for an hour.
    pub async fn category_popularity(&self) -> AppResult<BTreeMap<String, u64>> {
        let events = self.events.clone();
        let lookup = self
            .cache
            .get_or_compute(
                CATEGORY_POPULARITY_KEY,
                HOUR_TTL_SECONDS,
                move || async move {
                    let all_events = events.list_events().await?;
                    let mut popularity: BTreeMap<String, u64> = BTreeMap::new();
                    for event in &all_events {
                        let category = event
                            .category
                            .clone()
                            .unwrap_or_else(|| "Other".to_owned());
                        *popularity.entry(category).or_insert(0) += 1;
                    }
                    Ok(popularity)
                },
            )
            .await?;
        Ok(lookup.value)
    }

    /// Revenue summary for one organizer.
    ///
    /// The window is reporting metadata; the sum covers all of the
    /// organizer's events.
    pub async fn revenue_metrics(
        &self,
        organizer: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<RevenueMetrics> {
        let organizer_events = self.events.list_by_organizer(organizer).await?;

        let total_revenue: f64 = organizer_events
            .iter()
            .map(|event| event.ticket_price.unwrap_or(0.0))
            .sum();
        let event_count = organizer_events.len() as u64;
        let average_revenue_per_event = if event_count == 0 {
            0.0
        } else {
            total_revenue / event_count as f64
        };

        Ok(RevenueMetrics {
            organizer,
            start,
            end,
            total_revenue,
            event_count,
            average_revenue_per_event,
        })
    }

    /// Booking count for one user.
    pub async fn user_engagement(&self, user: UserId) -> AppResult<EngagementMetrics> {
        let total_bookings = self.bookings.count_for_user(user).await?;
        Ok(EngagementMetrics {
            user,
            total_bookings,
        })
    }

    /// Describes a reporting window.
    #[must_use]
    pub fn events_trend(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> EventsTrend {
        EventsTrend {
            start,
            end,
            period_days: (end - start).num_days(),
        }
    }

    /// Composes the admin dashboard snapshot from the cached metrics.
    pub async fn generate_dashboard(&self) -> AppResult<DashboardSnapshot> {
        Ok(DashboardSnapshot {
            total_events: self.total_events().await?,
            total_bookings: self.total_bookings().await?,
            conversion_rate: self.booking_conversion_rate().await?,
            top_events: self.top_events(5).await?,
            category_popularity: self.category_popularity().await?,
            generated_at: Utc::now(),
        })
    }
}

fn rank_by_attendance(
    events: Vec<EventSummary>,
    attendance: &HashMap<EventId, u64>,
) -> Vec<TopEvent> {
    let mut ranked: Vec<TopEvent> = events
        .into_iter()
        .map(|event| {
            let count = attendance.get(&event.id).copied().unwrap_or(0);
            TopEvent {
                id: event.id,
                title: event.title,
                category: event.category,
                ticket_price: event.ticket_price,
                start_date: event.start_date,
                attendance: count,
            }
        })
        .collect();

    // Title breaks ties so the ranking is stable across scans.
    ranked.sort_by(|left, right| {
        right
            .attendance
            .cmp(&left.attendance)
            .then_with(|| left.title.cmp(&right.title))
    });
    ranked
}
