//! Content Repository Implementation
//!
//! PostgreSQL implementations of TextRepository, MediaRepository and
//! HomepageMediaRepository. Translated fields are stored as one column per
//! language and folded into `LocalizedText` here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{
    HomepageMediaItem, HomepageMediaRepository, LocalizedText, MediaObject, MediaRepository,
    TextEntry, TextRepository,
};
use crate::shared::error::AppError;

// ============================================================================
// Texts
// ============================================================================

#[derive(Debug, sqlx::FromRow)]
struct TextRow {
    key: String,
    uk: String,
    en: String,
    pl: String,
    updated_at: DateTime<Utc>,
}

impl TextRow {
    fn into_entry(self) -> TextEntry {
        TextEntry {
            key: self.key,
            value: LocalizedText::new(self.uk, self.en, self.pl),
            updated_at: self.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct PgTextRepository {
    pool: PgPool,
}

impl PgTextRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TextRepository for PgTextRepository {
    async fn find_all(&self) -> Result<Vec<TextEntry>, AppError> {
        let rows = sqlx::query_as::<_, TextRow>(
            "SELECT key, uk, en, pl, updated_at FROM texts ORDER BY key",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_entry()).collect())
    }

    async fn upsert(&self, key: &str, value: &LocalizedText) -> Result<TextEntry, AppError> {
        let row = sqlx::query_as::<_, TextRow>(
            r#"
            INSERT INTO texts (key, uk, en, pl, updated_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (key) DO UPDATE
            SET uk = EXCLUDED.uk, en = EXCLUDED.en, pl = EXCLUDED.pl, updated_at = NOW()
            RETURNING key, uk, en, pl, updated_at
            "#,
        )
        .bind(key)
        .bind(&value.uk)
        .bind(&value.en)
        .bind(&value.pl)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_entry())
    }

    async fn delete(&self, key: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM texts WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ============================================================================
// Media
// ============================================================================

#[derive(Debug, sqlx::FromRow)]
struct MediaRow {
    key: String,
    content_type: String,
    size_bytes: i64,
    original_name: Option<String>,
    uploaded_at: DateTime<Utc>,
}

impl MediaRow {
    fn into_media(self) -> MediaObject {
        MediaObject {
            key: self.key,
            content_type: self.content_type,
            size_bytes: self.size_bytes,
            original_name: self.original_name,
            uploaded_at: self.uploaded_at,
        }
    }
}

#[derive(Clone)]
pub struct PgMediaRepository {
    pool: PgPool,
}

impl PgMediaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MediaRepository for PgMediaRepository {
    async fn create(&self, media: &MediaObject) -> Result<MediaObject, AppError> {
        let row = sqlx::query_as::<_, MediaRow>(
            r#"
            INSERT INTO media (key, content_type, size_bytes, original_name, uploaded_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING key, content_type, size_bytes, original_name, uploaded_at
            "#,
        )
        .bind(&media.key)
        .bind(&media.content_type)
        .bind(media.size_bytes)
        .bind(&media.original_name)
        .bind(media.uploaded_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_media())
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<MediaObject>, AppError> {
        let row = sqlx::query_as::<_, MediaRow>(
            r#"
            SELECT key, content_type, size_bytes, original_name, uploaded_at
            FROM media
            WHERE key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_media()))
    }

    async fn list(
        &self,
        content_type_prefix: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MediaObject>, AppError> {
        let rows = sqlx::query_as::<_, MediaRow>(
            r#"
            SELECT key, content_type, size_bytes, original_name, uploaded_at
            FROM media
            WHERE ($1::TEXT IS NULL OR content_type LIKE $1 || '%')
            ORDER BY uploaded_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(content_type_prefix)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_media()).collect())
    }

    async fn delete(&self, key: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM media WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ============================================================================
// Homepage media
// ============================================================================

#[derive(Debug, sqlx::FromRow)]
struct HomepageMediaRow {
    id: Uuid,
    section: String,
    media_key: String,
    position: i32,
    alt_uk: String,
    alt_en: String,
    alt_pl: String,
    link_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl HomepageMediaRow {
    fn into_item(self) -> HomepageMediaItem {
        HomepageMediaItem {
            id: self.id,
            section: self.section,
            media_key: self.media_key,
            position: self.position,
            alt: LocalizedText::new(self.alt_uk, self.alt_en, self.alt_pl),
            link_url: self.link_url,
            created_at: self.created_at,
        }
    }
}

const HOMEPAGE_COLUMNS: &str =
    "id, section, media_key, position, alt_uk, alt_en, alt_pl, link_url, created_at";

#[derive(Clone)]
pub struct PgHomepageMediaRepository {
    pool: PgPool,
}

impl PgHomepageMediaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HomepageMediaRepository for PgHomepageMediaRepository {
    async fn list(&self) -> Result<Vec<HomepageMediaItem>, AppError> {
        let rows = sqlx::query_as::<_, HomepageMediaRow>(&format!(
            "SELECT {HOMEPAGE_COLUMNS} FROM homepage_media_items ORDER BY section, position, created_at"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_item()).collect())
    }

    async fn create(&self, item: &HomepageMediaItem) -> Result<HomepageMediaItem, AppError> {
        let row = sqlx::query_as::<_, HomepageMediaRow>(&format!(
            r#"
            INSERT INTO homepage_media_items ({HOMEPAGE_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {HOMEPAGE_COLUMNS}
            "#
        ))
        .bind(item.id)
        .bind(&item.section)
        .bind(&item.media_key)
        .bind(item.position)
        .bind(&item.alt.uk)
        .bind(&item.alt.en)
        .bind(&item.alt.pl)
        .bind(&item.link_url)
        .bind(item.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_item())
    }

    async fn update(&self, item: &HomepageMediaItem) -> Result<Option<HomepageMediaItem>, AppError> {
        let row = sqlx::query_as::<_, HomepageMediaRow>(&format!(
            r#"
            UPDATE homepage_media_items
            SET section = $2, media_key = $3, position = $4,
                alt_uk = $5, alt_en = $6, alt_pl = $7, link_url = $8
            WHERE id = $1
            RETURNING {HOMEPAGE_COLUMNS}
            "#
        ))
        .bind(item.id)
        .bind(&item.section)
        .bind(&item.media_key)
        .bind(item.position)
        .bind(&item.alt.uk)
        .bind(&item.alt.en)
        .bind(&item.alt.pl)
        .bind(&item.link_url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_item()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM homepage_media_items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
