//! Editable site content: translated texts, media objects and homepage
//! media slots.
//!
//! Maps to the `texts`, `media` and `homepage_media_items` tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::LocalizedText;
use crate::shared::error::AppError;

/// A translated UI string addressed by key (e.g. `hero.title`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextEntry {
    pub key: String,
    pub value: LocalizedText,
    pub updated_at: DateTime<Utc>,
}

/// A file stored in the media bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaObject {
    /// Object key inside the bucket, also the path under the CDN domain
    pub key: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub original_name: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// A media slot on the homepage (hero slider, gallery, partners...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomepageMediaItem {
    pub id: Uuid,
    pub section: String,
    pub media_key: String,
    pub position: i32,
    pub alt: LocalizedText,
    pub link_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait TextRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<TextEntry>, AppError>;

    async fn upsert(&self, key: &str, value: &LocalizedText) -> Result<TextEntry, AppError>;

    /// Returns false when the key does not exist.
    async fn delete(&self, key: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait MediaRepository: Send + Sync {
    async fn create(&self, media: &MediaObject) -> Result<MediaObject, AppError>;

    async fn find_by_key(&self, key: &str) -> Result<Option<MediaObject>, AppError>;

    /// Newest first, optionally restricted to a content type prefix
    /// such as `image/`.
    async fn list(
        &self,
        content_type_prefix: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MediaObject>, AppError>;

    async fn delete(&self, key: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait HomepageMediaRepository: Send + Sync {
    /// All items ordered by section, then position.
    async fn list(&self) -> Result<Vec<HomepageMediaItem>, AppError>;

    async fn create(&self, item: &HomepageMediaItem) -> Result<HomepageMediaItem, AppError>;

    /// Returns `None` when the item does not exist.
    async fn update(&self, item: &HomepageMediaItem) -> Result<Option<HomepageMediaItem>, AppError>;

    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}
