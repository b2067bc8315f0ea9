//! In-memory implementation of the cache store port for development and
//! tests. Expiry is evaluated lazily on read.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use encore_application::CacheStore;
use encore_core::AppResult;

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

/// In-memory cache store.
#[derive(Default)]
pub struct InMemoryCacheStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryCacheStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expired(now) => {
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn set_with_ttl(&self, key: &str, value: String, ttl_seconds: u64) -> AppResult<()> {
        self.entries.lock().await.insert(
            key.to_owned(),
            Entry {
                value,
                expires_at: Some(Instant::now() + Duration::from_secs(ttl_seconds)),
            },
        );
        Ok(())
    }

    async fn set(&self, key: &str, value: String) -> AppResult<()> {
        self.entries.lock().await.insert(
            key.to_owned(),
            Entry {
                value,
                expires_at: None,
            },
        );
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
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expired(now) => {
                entries.remove(key);
                Ok(false)
            }
            Some(_) => Ok(true),
            None => Ok(false),
        }
    }

    async fn remaining_ttl(&self, key: &str) -> AppResult<i64> {
        let now = Instant::now();
        let entries = self.entries.lock().await;
        Ok(match entries.get(key) {
            Some(entry) if entry.expired(now) => -2,
            Some(Entry {
                expires_at: Some(expires_at),
                ..
            }) => i64::try_from((*expires_at - now).as_secs()).unwrap_or(i64::MAX),
            Some(_) => -1,
            None => -2,
        })
    }

    async fn increment(&self, key: &str, delta: i64) -> AppResult<i64> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        // Counter updates keep the key's expiry, matching redis INCR.
        let (current, expires_at) = match entries.get(key) {
            Some(entry) if entry.expired(now) => (0, None),
            Some(entry) => (
                entry.value.parse::<i64>().unwrap_or(0),
                entry.expires_at,
            ),
            None => (0, None),
        };
        let next = current + delta;
        entries.insert(
            key.to_owned(),
            Entry {
                value: next.to_string(),
                expires_at,
            },
        );
        Ok(next)
    }

    async fn flush_all(&self) -> AppResult<()> {
        self.entries.lock().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::InMemoryCacheStore;
    use encore_application::CacheStore;

    #[tokio::test]
    async fn set_get_and_delete_round_trip() {
        let store = InMemoryCacheStore::new();
        let Ok(()) = store.set("greeting", "\"hello\"".to_owned()).await else {
            panic!("expected set to succeed");
        };

        let Ok(value) = store.get("greeting").await else {
            panic!("expected get to succeed");
        };
        assert_eq!(value.as_deref(), Some("\"hello\""));

        let Ok(()) = store.delete("greeting").await else {
            panic!("expected delete to succeed");
        };
        let Ok(value) = store.get("greeting").await else {
            panic!("expected get to succeed");
        };
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn zero_ttl_entries_expire_immediately() {
        let store = InMemoryCacheStore::new();
        let Ok(()) = store.set_with_ttl("gone", "1".to_owned(), 0).await else {
            panic!("expected set to succeed");
        };

        let Ok(value) = store.get("gone").await else {
            panic!("expected get to succeed");
        };
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn counters_accumulate() {
        let store = InMemoryCacheStore::new();
        let Ok(first) = store.increment("hits", 1).await else {
            panic!("expected increment to succeed");
        };
        let Ok(second) = store.increment("hits", 1).await else {
            panic!("expected increment to succeed");
        };
        assert_eq!((first, second), (1, 2));
    }

    #[tokio::test]
    async fn counters_keep_their_expiry() {
        let store = InMemoryCacheStore::new();
        let Ok(()) = store.set_with_ttl("hits", "5".to_owned(), 600).await else {
            panic!("expected set to succeed");
        };

        let Ok(next) = store.increment("hits", 1).await else {
            panic!("expected increment to succeed");
        };
        assert_eq!(next, 6);

        let Ok(ttl) = store.remaining_ttl("hits").await else {
            panic!("expected ttl query to succeed");
        };
        assert!(ttl > 0, "counter with a TTL must not become permanent");
    }

    #[tokio::test]
    async fn permanent_entries_report_no_expiry() {
        let store = InMemoryCacheStore::new();
        let Ok(()) = store.set("keep", "1".to_owned()).await else {
            panic!("expected set to succeed");
        };

        let Ok(ttl) = store.remaining_ttl("keep").await else {
            panic!("expected ttl query to succeed");
        };
        assert_eq!(ttl, -1);

        let Ok(ttl) = store.remaining_ttl("missing").await else {
            panic!("expected ttl query to succeed");
        };
        assert_eq!(ttl, -2);
    }
}
