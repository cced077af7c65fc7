//! Object Storage
//!
//! Media files live in an S3-compatible bucket (Cloudflare R2 in
//! production) and are served from a CDN domain. Only the object key is
//! stored in the database; public URLs are derived from the CDN base URL.

mod s3;

pub use s3::S3ObjectStore;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("object storage request failed: {0}")]
    Backend(String),
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StorageError>;

    /// Deleting a missing object is not an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Cheap reachability probe for readiness checks.
    async fn check(&self) -> Result<(), StorageError>;
}

/// `media/{yyyy}/{mm}/{uuid}.{ext}`
pub fn media_key(extension: &str, now: DateTime<Utc>) -> String {
    format!(
        "media/{:04}/{:02}/{}.{}",
        now.year(),
        now.month(),
        Uuid::new_v4(),
        extension.trim_start_matches('.').to_ascii_lowercase()
    )
}

/// Public URL of an object under the CDN domain.
pub fn public_url(cdn_base_url: &str, key: &str) -> String {
    format!(
        "{}/{}",
        cdn_base_url.trim_end_matches('/'),
        key.trim_start_matches('/')
    )
}

/// Keeps objects in memory. Used by tests and by local runs without
/// bucket credentials.
#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<String, (String, Vec<u8>)>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.objects.read().await.contains_key(key)
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StorageError> {
        self.objects
            .write()
            .await
            .insert(key.to_string(), (content_type.to_string(), bytes));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn check(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn media_keys_are_partitioned_by_month() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 10, 0, 0).unwrap();
        let key = media_key(".JPG", now);
        assert!(key.starts_with("media/2024/03/"));
        assert!(key.ends_with(".jpg"));
        assert_eq!(key.len(), "media/2024/03/".len() + 36 + ".jpg".len());
    }

    #[test]
    fn public_url_joins_cdn_and_key() {
        assert_eq!(
            public_url("https://cdn.rehab.example/", "media/2024/03/a.jpg"),
            "https://cdn.rehab.example/media/2024/03/a.jpg"
        );
    }

    #[tokio::test]
    async fn in_memory_store_puts_and_deletes() {
        let store = InMemoryObjectStore::new();
        store.put("media/a.png", vec![1, 2, 3], "image/png").await.unwrap();
        assert!(store.contains("media/a.png").await);

        store.delete("media/a.png").await.unwrap();
        store.delete("media/a.png").await.unwrap();
        assert!(!store.contains("media/a.png").await);
    }
}
