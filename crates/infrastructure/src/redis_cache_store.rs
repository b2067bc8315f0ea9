//! Redis-backed implementation of the cache store port.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;

use encore_application::CacheStore;
use encore_core::{AppError, AppResult};

/// Redis implementation of the cache store port.
///
/// Errors are reported as [`AppError::Internal`]; the cache-aside accessor
/// above this adapter decides how to degrade.
#[derive(Clone)]
pub struct RedisCacheStore {
    client: redis::Client,
    key_prefix: String,
}

impl RedisCacheStore {
    /// Creates a store adapter with a configured Redis client and key prefix.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>) -> Self {
        Self {
            client,
            key_prefix: key_prefix.into(),
        }
    }

    fn key_for(&self, key: &str) -> String {
        format!("{}:{key}", self.key_prefix)
    }

    async fn connection(&self) -> AppResult<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut connection = self.connection().await?;
        connection
            .get(self.key_for(key))
            .await
            .map_err(|error| AppError::Internal(format!("failed to read cache entry: {error}")))
    }

    async fn set_with_ttl(&self, key: &str, value: String, ttl_seconds: u64) -> AppResult<()> {
        let mut connection = self.connection().await?;
        connection
            .set_ex(self.key_for(key), value, ttl_seconds)
            .await
            .map_err(|error| AppError::Internal(format!("failed to write cache entry: {error}")))
    }

    async fn set(&self, key: &str, value: String) -> AppResult<()> {
        let mut connection = self.connection().await?;
        connection
            .set(self.key_for(key), value)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to write permanent cache entry: {error}"))
            })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let mut connection = self.connection().await?;
        let _: i64 = connection
            .del(self.key_for(key))
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete cache entry: {error}")))?;
        Ok(())
    }

    async fn delete_many(&self, keys: &[String]) -> AppResult<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let prefixed: Vec<String> = keys.iter().map(|key| self.key_for(key)).collect();
        let mut connection = self.connection().await?;
        let _: i64 = connection.del(prefixed).await.map_err(|error| {
            AppError::Internal(format!("failed to delete cache entries: {error}"))
        })?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let mut connection = self.connection().await?;
        connection
            .exists(self.key_for(key))
            .await
            .map_err(|error| AppError::Internal(format!("failed to check cache entry: {error}")))
    }

    async fn remaining_ttl(&self, key: &str) -> AppResult<i64> {
        let mut connection = self.connection().await?;
        connection
            .ttl(self.key_for(key))
            .await
            .map_err(|error| AppError::Internal(format!("failed to query cache TTL: {error}")))
    }

    async fn increment(&self, key: &str, delta: i64) -> AppResult<i64> {
        let mut connection = self.connection().await?;
        connection
            .incr(self.key_for(key), delta)
            .await
            .map_err(|error| AppError::Internal(format!("failed to adjust cache counter: {error}")))
    }

    async fn flush_all(&self) -> AppResult<()> {
        let mut connection = self.connection().await?;
        let _: () = redis::cmd("FLUSHALL")
            .query_async(&mut connection)
            .await
            .map_err(|error| AppError::Internal(format!("failed to flush cache: {error}")))?;
        Ok(())
    }
}
