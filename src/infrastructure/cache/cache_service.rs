//! Cache Service
//!
//! Generic cache trait and Redis implementation for read-through caching of
//! public content.
//!
//! Values are stored as JSON strings. Every operation returns
//! `Result<_, AppError>`; callers treat a failing cache as a miss.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::shared::error::AppError;

/// Generic cache trait for abstracting cache operations.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Retrieves a value from the cache by key.
    ///
    /// # Returns
    /// * `Ok(Some(T))` - If the key exists and deserialization succeeds
    /// * `Ok(None)` - If the key does not exist
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>, AppError>;

    /// Stores a value in the cache with an expiration time in seconds.
    async fn set_ex<T: Serialize + Sync + Send>(
        &self,
        key: &str,
        value: &T,
        seconds: u64,
    ) -> Result<(), AppError>;

    /// Deletes a key, returning whether it existed.
    async fn delete(&self, key: &str) -> Result<bool, AppError>;

    /// Round-trip to the backing store.
    async fn ping(&self) -> Result<(), AppError>;
}

/// Redis-backed cache implementation.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    prefix: Option<Arc<str>>,
}

impl RedisCache {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn, prefix: None }
    }

    /// All keys will be prefixed, e.g. `rehab:` + `texts:all`.
    pub fn with_prefix(conn: ConnectionManager, prefix: impl Into<Arc<str>>) -> Self {
        Self {
            conn,
            prefix: Some(prefix.into()),
        }
    }

    /// The underlying connection, shared with the rate limiter.
    pub fn connection(&self) -> ConnectionManager {
        self.conn.clone()
    }

    fn format_key(&self, key: &str) -> String {
        prefixed(self.prefix.as_deref(), key)
    }

    fn serialize<T: Serialize>(value: &T) -> Result<String, AppError> {
        serde_json::to_string(value).map_err(|e| {
            warn!("Cache serialization error: {}", e);
            AppError::Internal(format!("Cache serialization failed: {}", e))
        })
    }

    fn deserialize<T: DeserializeOwned>(data: &str) -> Result<T, AppError> {
        serde_json::from_str(data).map_err(|e| {
            warn!("Cache deserialization error: {}", e);
            AppError::Internal(format!("Cache deserialization failed: {}", e))
        })
    }
}

fn prefixed(prefix: Option<&str>, key: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}{}", prefix, key),
        None => key.to_string(),
    }
}

#[async_trait]
impl Cache for RedisCache {
    #[instrument(skip(self), level = "debug")]
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>, AppError> {
        let full_key = self.format_key(key);
        let mut conn = self.conn.clone();

        let result: Option<String> = conn.get(&full_key).await?;

        match result {
            Some(data) => {
                debug!(key = %full_key, "Cache hit");
                Ok(Some(Self::deserialize(&data)?))
            }
            None => {
                debug!(key = %full_key, "Cache miss");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, value), level = "debug")]
    async fn set_ex<T: Serialize + Sync + Send>(
        &self,
        key: &str,
        value: &T,
        seconds: u64,
    ) -> Result<(), AppError> {
        let full_key = self.format_key(key);
        let data = Self::serialize(value)?;
        let mut conn = self.conn.clone();

        let _: () = conn.set_ex(&full_key, data, seconds).await?;
        debug!(key = %full_key, ttl = seconds, "Cache set with expiry");

        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete(&self, key: &str) -> Result<bool, AppError> {
        let full_key = self.format_key(key);
        let mut conn = self.conn.clone();

        let deleted: u64 = conn.del(&full_key).await?;
        debug!(key = %full_key, deleted = deleted > 0, "Cache delete");

        Ok(deleted > 0)
    }

    async fn ping(&self) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

/// Process-local cache for service tests.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct MemoryCache {
    entries: std::sync::Mutex<std::collections::HashMap<String, String>>,
}

#[cfg(test)]
impl MemoryCache {
    pub(crate) fn contains(&self, key: &str) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }
}

#[cfg(test)]
#[async_trait]
impl Cache for MemoryCache {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>, AppError> {
        let data = self.entries.lock().unwrap().get(key).cloned();
        data.map(|d| RedisCache::deserialize(&d)).transpose()
    }

    async fn set_ex<T: Serialize + Sync + Send>(
        &self,
        key: &str,
        value: &T,
        _seconds: u64,
    ) -> Result<(), AppError> {
        let data = RedisCache::serialize(value)?;
        self.entries.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, AppError> {
        Ok(self.entries.lock().unwrap().remove(key).is_some())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct CachedTexts {
        lang: String,
        entries: Vec<(String, String)>,
    }

    #[test]
    fn cached_values_survive_json_encoding() {
        let data = CachedTexts {
            lang: "uk".to_string(),
            entries: vec![("hero.title".to_string(), "Центр".to_string())],
        };

        let json = RedisCache::serialize(&data).unwrap();
        let parsed: CachedTexts = RedisCache::deserialize(&json).unwrap();

        assert_eq!(data, parsed);
    }

    #[test]
    fn corrupt_entries_are_reported_as_internal() {
        let result: Result<CachedTexts, _> = RedisCache::deserialize("{not json");
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[test]
    fn keys_are_prefixed_when_configured() {
        assert_eq!(prefixed(None, "texts:all"), "texts:all");
        assert_eq!(prefixed(Some("rehab:"), "texts:all"), "rehab:texts:all");
    }
}
