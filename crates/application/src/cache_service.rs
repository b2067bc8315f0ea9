//! Cache-aside accessor over a key-value store port.
//!
//! Every operation fails open: when the store is unreachable the caller
//! still gets a correct answer and the degradation is reported through an
//! explicit sum type instead of an `Err`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use encore_core::AppResult;


/// Port for the underlying key-value store. Values are JSON strings.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Reads the value stored under `key`, if any.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Stores `value` under `key` with a TTL in seconds.
    async fn set_with_ttl(&self, key: &str, value: String, ttl_seconds: u64) -> AppResult<()>;

    /// Stores `value` under `key` with no expiration.
    async fn set(&self, key: &str, value: String) -> AppResult<()>;

    /// Deletes the entry under `key`.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Deletes all entries under the given keys.
    async fn delete_many(&self, keys: &[String]) -> AppResult<()>;

    /// Reports whether `key` currently exists.
    async fn exists(&self, key: &str) -> AppResult<bool>;

    /// Returns the remaining TTL for `key` in seconds, or a negative value
    /// when the key is missing or has no expiration.
    async fn remaining_ttl(&self, key: &str) -> AppResult<i64>;

    /// Atomically adds `delta` to the counter under `key` and returns the
    /// new value.
    async fn increment(&self, key: &str, delta: i64) -> AppResult<i64>;

    /// Removes every entry in the store.
    async fn flush_all(&self) -> AppResult<()>;
}

/// How a cache lookup produced its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheSource {
    /// The value was served from the store.
    Hit,
    /// The value was computed on a miss and written back.
    Computed,
    /// The store was unusable; the value was computed and nothing was cached.
    Bypassed(String),
}

/// Result of a cache-aside lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLookup<T> {
    /// The value, regardless of where it came from.
    pub value: T,
    /// Where the value came from.
    pub source: CacheSource,
}

/// Outcome of a cache write or delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheWrite {
    /// The store acknowledged the operation.
    Applied,
    /// The store was unusable and the operation became a no-op.
    Degraded(String),
}

impl CacheWrite {
    /// Reports whether the store acknowledged the operation.
    #[must_use]
    pub fn applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Cache-aside accessor.
///
/// No stampede protection: concurrent callers that miss on the same key all
/// compute independently and the last store write wins. Accepted gap.
#[derive(Clone)]
pub struct CacheService {
    store: Arc<dyn CacheStore>,
}

impl CacheService {
    /// Creates an accessor over a store implementation.
    #[must_use]
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Returns the cached value under `key`, or computes it, writes it back
    /// with the given TTL, and returns it.
    ///
    /// Store faults (connect, read, write, decode) degrade to direct
    /// computation and surface as [`CacheSource::Bypassed`]. An `Err` only
    /// comes from `compute` itself.
    pub async fn get_or_compute<T, F, Fut>(
        &self,
        key: &str,
        ttl_seconds: u64,
        compute: F,
    ) -> AppResult<CacheLookup<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        match self.store.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str::<T>(raw.as_str()) {
                Ok(value) => {
                    return Ok(CacheLookup {
                        value,
                        source: CacheSource::Hit,
                    });
                }
                Err(error) => {
                    warn!(key = key, error = %error, "discarding undecodable cache entry");
                }
            },
            Ok(None) => {}
            Err(error) => {
                let reason = error.to_string();
                warn!(key = key, error = %reason, "cache read failed, computing directly");
                let value = compute().await?;
                return Ok(CacheLookup {
                    value,
                    source: CacheSource::Bypassed(reason),
                });
            }
        }

        let value = compute().await?;
        let source = match serde_json::to_string(&value) {
            Ok(encoded) => match self.store.set_with_ttl(key, encoded, ttl_seconds).await {
                Ok(()) => CacheSource::Computed,
                Err(error) => {
                    let reason = error.to_string();
                    warn!(key = key, error = %reason, "cache write failed after compute");
                    CacheSource::Bypassed(reason)
                }
            },
            Err(error) => {
                let reason = format!("failed to encode cache value: {error}");
                warn!(key = key, error = %reason, "skipping cache write");
                CacheSource::Bypassed(reason)
            }
        };

        Ok(CacheLookup { value, source })
    }

    /// Stores a value under `key` with a TTL in seconds.
    pub async fn put<T: Serialize>(&self, key: &str, value: &T, ttl_seconds: u64) -> CacheWrite {
        let encoded = match serde_json::to_string(value) {
            Ok(encoded) => encoded,
            Err(error) => return self.degraded(key, "encode cache value", &error),
        };

        match self.store.set_with_ttl(key, encoded, ttl_seconds).await {
            Ok(()) => CacheWrite::Applied,
            Err(error) => self.degraded(key, "write cache entry", &error),
        }
    }

    /// Stores a value under `key` with no expiration.
    pub async fn put_permanent<T: Serialize>(&self, key: &str, value: &T) -> CacheWrite {
        let encoded = match serde_json::to_string(value) {
            Ok(encoded) => encoded,
            Err(error) => return self.degraded(key, "encode cache value", &error),
        };

        match self.store.set(key, encoded).await {
            Ok(()) => CacheWrite::Applied,
            Err(error) => self.degraded(key, "write permanent cache entry", &error),
        }
    }

    /// Removes the entry under `key`.
    pub async fn remove(&self, key: &str) -> CacheWrite {
        match self.store.delete(key).await {
            Ok(()) => CacheWrite::Applied,
            Err(error) => self.degraded(key, "delete cache entry", &error),
        }
    }

    /// Removes the entries under all given keys.
    pub async fn remove_many(&self, keys: &[String]) -> CacheWrite {
        match self.store.delete_many(keys).await {
            Ok(()) => CacheWrite::Applied,
            Err(error) => self.degraded("<multiple>", "delete cache entries", &error),
        }
    }

    /// Reports whether `key` exists. Degrades to `false`.
    pub async fn has(&self, key: &str) -> bool {
        match self.store.exists(key).await {
            Ok(exists) => exists,
            Err(error) => {
                warn!(key = key, error = %error, "cache existence check failed");
                false
            }
        }
    }

    /// Returns the remaining TTL for `key` in seconds. Degrades to `-1`.
    pub async fn remaining_ttl(&self, key: &str) -> i64 {
        match self.store.remaining_ttl(key).await {
            Ok(ttl) => ttl,
            Err(error) => {
                warn!(key = key, error = %error, "cache TTL query failed");
                -1
            }
        }
    }

    /// Atomically increments the counter under `key`. Degrades to `0`.
    pub async fn increment(&self, key: &str) -> i64 {
        match self.store.increment(key, 1).await {
            Ok(value) => value,
            Err(error) => {
                warn!(key = key, error = %error, "cache increment failed");
                0
            }
        }
    }

    /// Atomically decrements the counter under `key`. Degrades to `0`.
    pub async fn decrement(&self, key: &str) -> i64 {
        match self.store.increment(key, -1).await {
            Ok(value) => value,
            Err(error) => {
                warn!(key = key, error = %error, "cache decrement failed");
                0
            }
        }
    }

    /// Removes every entry in the store.
    pub async fn clear_all(&self) -> CacheWrite {
        match self.store.flush_all().await {
            Ok(()) => CacheWrite::Applied,
            Err(error) => self.degraded("<all>", "flush cache", &error),
        }
    }

    fn degraded(&self, key: &str, operation: &str, error: &dyn std::fmt::Display) -> CacheWrite {
        let reason = format!("failed to {operation}: {error}");
        warn!(key = key, error = %reason, "cache operation degraded to no-op");
        CacheWrite::Degraded(reason)
    }
}
