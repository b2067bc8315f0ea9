use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::Mutex;

use encore_core::AppResult;
use encore_domain::{EventId, EventSummary, UserId};

use crate::cache_service::{CacheService, CacheStore};

use super::{AnalyticsService, BookingRepository, EventCatalogRepository};

struct MapStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MapStore {
    fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl CacheStore for MapStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set_with_ttl(&self, key: &str, value: String, _ttl_seconds: u64) -> AppResult<()> {
        self.entries.lock().await.insert(key.to_owned(), value);
        Ok(())
    }

    async fn set(&self, key: &str, value: String) -> AppResult<()> {
        self.entries.lock().await.insert(key.to_owned(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn delete_many(&self, keys: &[String]) -> AppResult<()> {
        let mut entries = self.entries.lock().await;
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.entries.lock().await.contains_key(key))
    }

    async fn remaining_ttl(&self, _key: &str) -> AppResult<i64> {
        Ok(-1)
    }

    async fn increment(&self, _key: &str, _delta: i64) -> AppResult<i64> {
        Ok(0)
    }

    async fn flush_all(&self) -> AppResult<()> {
        self.entries.lock().await.clear();
        Ok(())
    }
}

struct FakeCatalog {
    events: Vec<EventSummary>,
    count_calls: AtomicUsize,
}

#[async_trait]
impl EventCatalogRepository for FakeCatalog {
    async fn count_events(&self) -> AppResult<u64> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.events.len() as u64)
    }

    async fn list_events(&self) -> AppResult<Vec<EventSummary>> {
        Ok(self.events.clone())
    }

    async fn list_by_organizer(&self, organizer: UserId) -> AppResult<Vec<EventSummary>> {
        Ok(self
            .events
            .iter()
            .filter(|event| event.organizer == organizer)
            .cloned()
            .collect())
    }
}

struct FakeBookings {
    attendance: HashMap<EventId, u64>,
    per_user: HashMap<UserId, u64>,
}

#[async_trait]
impl BookingRepository for FakeBookings {
    async fn count_bookings(&self) -> AppResult<u64> {
        Ok(self.attendance.values().sum())
    }

    async fn count_for_user(&self, user: UserId) -> AppResult<u64> {
        Ok(self.per_user.get(&user).copied().unwrap_or(0))
    }

    async fn attendance_by_event(&self) -> AppResult<HashMap<EventId, u64>> {
        Ok(self.attendance.clone())
    }
}

fn event(title: &str, category: Option<&str>, price: Option<f64>, organizer: UserId) -> EventSummary {
    EventSummary {
        id: EventId::new(),
        title: title.to_owned(),
        category: category.map(str::to_owned),
        ticket_price: price,
        start_date: Utc::now() + Duration::days(7),
        organizer,
    }
}

fn service(
    events: Vec<EventSummary>,
    attendance: HashMap<EventId, u64>,
    per_user: HashMap<UserId, u64>,
) -> (AnalyticsService, Arc<FakeCatalog>) {
    let catalog = Arc::new(FakeCatalog {
        events,
        count_calls: AtomicUsize::new(0),
    });
    let bookings = Arc::new(FakeBookings {
        attendance,
        per_user,
    });
    let cache = CacheService::new(Arc::new(MapStore::new()));
    (
        AnalyticsService::new(catalog.clone(), bookings, cache),
        catalog,
    )
}

#[tokio::test]
async fn conversion_rate_is_zero_without_events() {
    let (service, _catalog) = service(Vec::new(), HashMap::new(), HashMap::new());

    let Ok(rate) = service.booking_conversion_rate().await else {
        panic!("expected a rate");
    };
    assert_eq!(rate, 0.0);
}

#[tokio::test]
async fn conversion_rate_divides_bookings_by_events() {
    let organizer = UserId::new();
    let first = event("Summer Jam", Some("Rock"), Some(50.0), organizer);
    let second = event("Winter Gala", Some("Classical"), Some(80.0), organizer);
    let attendance = HashMap::from([(first.id, 5), (second.id, 1)]);
    let (service, _catalog) = service(vec![first, second], attendance, HashMap::new());

    let Ok(rate) = service.booking_conversion_rate().await else {
        panic!("expected a rate");
    };
    assert_eq!(rate, 3.0);
}

#[tokio::test]
async fn total_events_is_memoized() {
    let organizer = UserId::new();
    let (service, catalog) = service(
        vec![event("Summer Jam", None, None, organizer)],
        HashMap::new(),
        HashMap::new(),
    );

    for _ in 0..3 {
        let Ok(total) = service.total_events().await else {
            panic!("expected a count");
        };
        assert_eq!(total, 1);
    }

    assert_eq!(catalog.count_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn top_events_rank_by_attendance_descending() {
    let organizer = UserId::new();
    let quiet = event("Quiet Night", Some("Jazz"), Some(30.0), organizer);
    let packed = event("Packed Arena", Some("Rock"), Some(90.0), organizer);
    let mid = event("Mid Show", Some("Pop"), Some(45.0), organizer);
    let attendance = HashMap::from([(quiet.id, 2), (packed.id, 120), (mid.id, 40)]);
    let (service, _catalog) = service(
        vec![quiet.clone(), packed.clone(), mid.clone()],
        attendance,
        HashMap::new(),
    );

    let Ok(top) = service.top_events(2).await else {
        panic!("expected ranking");
    };

    assert_eq!(top.len(), 2);
    assert_eq!(top[0].id, packed.id);
    assert_eq!(top[0].attendance, 120);
    assert_eq!(top[1].id, mid.id);
}

#[tokio::test]
async fn category_popularity_buckets_uncategorised_as_other() {
    let organizer = UserId::new();
    let (service, _catalog) = service(
        vec![
            event("A", Some("Rock"), None, organizer),
            event("B", Some("Rock"), None, organizer),
            event("C", None, None, organizer),
        ],
        HashMap::new(),
        HashMap::new(),
    );

    let Ok(popularity) = service.category_popularity().await else {
        panic!("expected categories");
    };

    assert_eq!(popularity.get("Rock"), Some(&2));
    assert_eq!(popularity.get("Other"), Some(&1));
}

#[tokio::test]
async fn revenue_metrics_guard_against_empty_catalogues() {
    let organizer = UserId::new();
    let other = UserId::new();
    let (service, _catalog) = service(
        vec![
            event("A", None, Some(50.0), organizer),
            event("B", None, Some(70.0), organizer),
            event("C", None, Some(999.0), other),
        ],
        HashMap::new(),
        HashMap::new(),
    );

    let start = Utc::now() - Duration::days(30);
    let end = Utc::now();
    let Ok(metrics) = service.revenue_metrics(organizer, start, end).await else {
        panic!("expected metrics");
    };
    assert_eq!(metrics.total_revenue, 120.0);
    assert_eq!(metrics.event_count, 2);
    assert_eq!(metrics.average_revenue_per_event, 60.0);

    let nobody = UserId::new();
    let Ok(empty) = service.revenue_metrics(nobody, start, end).await else {
        panic!("expected metrics");
    };
    assert_eq!(empty.total_revenue, 0.0);
    assert_eq!(empty.average_revenue_per_event, 0.0);
}

#[tokio::test]
async fn dashboard_composes_all_metrics() {
    let organizer = UserId::new();
    let headliner = event("Headliner", Some("Rock"), Some(60.0), organizer);
    let attendance = HashMap::from([(headliner.id, 10)]);
    let (service, _catalog) = service(vec![headliner], attendance, HashMap::new());

    let Ok(dashboard) = service.generate_dashboard().await else {
        panic!("expected dashboard");
    };

    assert_eq!(dashboard.total_events, 1);
    assert_eq!(dashboard.total_bookings, 10);
    assert_eq!(dashboard.conversion_rate, 10.0);
    assert_eq!(dashboard.top_events.len(), 1);
    assert_eq!(dashboard.category_popularity.get("Rock"), Some(&1));
}

#[tokio::test]
async fn user_engagement_counts_bookings() {
    let user = UserId::new();
    let (service, _catalog) = service(
        Vec::new(),
        HashMap::new(),
        HashMap::from([(user, 4_u64)]),
    );

    let Ok(engagement) = service.user_engagement(user).await else {
        panic!("expected engagement");
    };
    assert_eq!(engagement.total_bookings, 4);

    let trend = service.events_trend(Utc::now() - Duration::days(14), Utc::now());
    assert_eq!(trend.period_days, 14);
}
