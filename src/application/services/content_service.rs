//! Content Service
//!
//! Translations, media files and homepage media slots.
//!
//! Public translation bundles are read through the cache; any write drops
//! the cached bundles of every language.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::{
    HomepageMediaItem, HomepageMediaRepository, Language, LocalizedText, MediaObject,
    MediaRepository, TextEntry, TextRepository,
};
use crate::infrastructure::cache::{keys, Cache};
use crate::infrastructure::storage::{self, ObjectStore, StorageError};
use crate::shared::error::AppError;

/// How long a translation bundle stays cached.
pub const TEXTS_CACHE_TTL_SECS: u64 = 300;

/// Content service trait
#[async_trait]
pub trait ContentService: Send + Sync {
    /// `{key: value}` for one language, falling back to Ukrainian.
    async fn translations(&self, lang: Language) -> Result<TranslationsDto, ContentError>;

    /// Every key with all of its languages.
    async fn list_texts(&self) -> Result<Vec<TextEntry>, ContentError>;

    async fn upsert_text(&self, key: &str, value: LocalizedText) -> Result<TextEntry, ContentError>;

    async fn delete_text(&self, key: &str) -> Result<(), ContentError>;

    async fn upload_media(&self, upload: UploadMediaDto) -> Result<MediaDto, ContentError>;

    async fn list_media(&self, query: MediaQueryDto) -> Result<Vec<MediaDto>, ContentError>;

    /// Remove the object from storage and its row.
    async fn delete_media(&self, key: &str) -> Result<(), ContentError>;

    /// Homepage slots grouped by section, with localized alt text.
    async fn homepage(&self, lang: Language) -> Result<Vec<HomepageSectionDto>, ContentError>;

    async fn create_homepage_item(&self, input: HomepageItemInput) -> Result<HomepageMediaItem, ContentError>;

    async fn update_homepage_item(
        &self,
        id: Uuid,
        input: HomepageItemInput,
    ) -> Result<HomepageMediaItem, ContentError>;

    async fn delete_homepage_item(&self, id: Uuid) -> Result<(), ContentError>;
}

/// Translation bundle, with a warning when it bypassed the cache
#[derive(Debug, Clone)]
pub struct TranslationsDto {
    pub texts: BTreeMap<String, String>,
    pub warning: Option<String>,
}

/// Warning for bundles read without a working cache.
pub const UNCACHED_TRANSLATIONS_WARNING: &str =
    "Cache is unavailable, translations were read from the database";

/// An uploaded file
#[derive(Debug, Clone)]
pub struct UploadMediaDto {
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Media list query
#[derive(Debug, Clone, Default)]
pub struct MediaQueryDto {
    /// `image` or `video`
    pub kind: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Media object with its public URL
#[derive(Debug, Clone, Serialize)]
pub struct MediaDto {
    pub key: String,
    pub url: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub original_name: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// Homepage slot fields set by the admin
#[derive(Debug, Clone)]
pub struct HomepageItemInput {
    pub section: String,
    pub media_key: String,
    pub position: i32,
    pub alt: LocalizedText,
    pub link_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HomepageItemDto {
    pub id: Uuid,
    pub media_key: String,
    pub url: String,
    pub alt: String,
    pub link_url: Option<String>,
    pub position: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct HomepageSectionDto {
    pub section: String,
    pub items: Vec<HomepageItemDto>,
}

/// Content errors, shared by the catalog and report services
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Repository(#[from] AppError),
}

impl From<ContentError> for AppError {
    fn from(error: ContentError) -> Self {
        match error {
            e @ ContentError::NotFound(_) => AppError::NotFound(e.to_string()),
            ContentError::Invalid(msg) => AppError::Validation(msg),
            ContentError::Storage(e) => AppError::Upstream(e.to_string()),
            ContentError::Repository(e) => e,
        }
    }
}

/// Translation keys look like `hero.title` or `donate.cta-button`.
pub fn is_valid_text_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= 200
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Only images and videos go to the media bucket.
pub fn is_allowed_media_type(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.starts_with("image/") || content_type.starts_with("video/")
}

/// Extension for a stored object: the uploaded file's own, else the MIME
/// subtype (`image/svg+xml` -> `svg`).
fn media_extension(file_name: Option<&str>, content_type: &str) -> String {
    let from_name = file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    let ext = from_name.unwrap_or_else(|| {
        content_type
            .split_once('/')
            .map(|(_, sub)| sub.split(['+', ';']).next().unwrap_or(sub))
            .unwrap_or("bin")
    });
    ext.to_ascii_lowercase()
}

/// ContentService implementation
pub struct ContentServiceImpl<T, M, H, C>
where
    T: TextRepository,
    M: MediaRepository,
    H: HomepageMediaRepository,
    C: Cache,
{
    text_repo: Arc<T>,
    media_repo: Arc<M>,
    homepage_repo: Arc<H>,
    cache: Option<Arc<C>>,
    store: Arc<dyn ObjectStore>,
    cdn_base_url: String,
    max_upload_bytes: usize,
}

impl<T, M, H, C> ContentServiceImpl<T, M, H, C>
where
    T: TextRepository,
    M: MediaRepository,
    H: HomepageMediaRepository,
    C: Cache,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        text_repo: Arc<T>,
        media_repo: Arc<M>,
        homepage_repo: Arc<H>,
        cache: Option<Arc<C>>,
        store: Arc<dyn ObjectStore>,
        cdn_base_url: impl Into<String>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            text_repo,
            media_repo,
            homepage_repo,
            cache,
            store,
            cdn_base_url: cdn_base_url.into(),
            max_upload_bytes,
        }
    }

    fn media_dto(&self, media: MediaObject) -> MediaDto {
        MediaDto {
            url: storage::public_url(&self.cdn_base_url, &media.key),
            key: media.key,
            content_type: media.content_type,
            size_bytes: media.size_bytes,
            original_name: media.original_name,
            uploaded_at: media.uploaded_at,
        }
    }

    async fn invalidate_texts(&self) {
        let Some(cache) = &self.cache else { return };
        for lang in Language::ALL {
            if let Err(e) = cache.delete(&keys::texts(lang)).await {
                warn!(%lang, error = %e, "Failed to invalidate cached translations");
            }
        }
    }

    async fn validate_homepage_input(&self, input: &HomepageItemInput) -> Result<(), ContentError> {
        let section = input.section.trim();
        if section.is_empty() || section.len() > 64 {
            return Err(ContentError::Invalid("Section must be 1-64 characters".into()));
        }
        if self.media_repo.find_by_key(&input.media_key).await?.is_none() {
            return Err(ContentError::Invalid(format!(
                "Unknown media key {}",
                input.media_key
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl<T, M, H, C> ContentService for ContentServiceImpl<T, M, H, C>
where
    T: TextRepository + 'static,
    M: MediaRepository + 'static,
    H: HomepageMediaRepository + 'static,
    C: Cache + 'static,
{
    #[instrument(skip(self))]
    async fn translations(&self, lang: Language) -> Result<TranslationsDto, ContentError> {
        let cache_key = keys::texts(lang);
        let mut cache_ok = self.cache.is_some();

        if let Some(cache) = &self.cache {
            match cache.get::<BTreeMap<String, String>>(&cache_key).await {
                Ok(Some(texts)) => return Ok(TranslationsDto { texts, warning: None }),
                Ok(None) => {}
                Err(e) => {
                    warn!(error = %e, "Translation cache unavailable");
                    cache_ok = false;
                }
            }
        }

        let bundle: BTreeMap<String, String> = self
            .text_repo
            .find_all()
            .await?
            .into_iter()
            .map(|entry| {
                let value = entry.value.get(lang).to_string();
                (entry.key, value)
            })
            .collect();

        if let Some(cache) = self.cache.as_ref().filter(|_| cache_ok) {
            if let Err(e) = cache.set_ex(&cache_key, &bundle, TEXTS_CACHE_TTL_SECS).await {
                warn!(error = %e, "Failed to cache translations");
            }
        }

        Ok(TranslationsDto {
            texts: bundle,
            warning: (!cache_ok).then(|| UNCACHED_TRANSLATIONS_WARNING.to_string()),
        })
    }

    async fn list_texts(&self) -> Result<Vec<TextEntry>, ContentError> {
        Ok(self.text_repo.find_all().await?)
    }

    #[instrument(skip(self, value))]
    async fn upsert_text(&self, key: &str, value: LocalizedText) -> Result<TextEntry, ContentError> {
        if !is_valid_text_key(key) {
            return Err(ContentError::Invalid(
                "Key may contain letters, digits, '.', '_' and '-' only".into(),
            ));
        }

        let entry = self.text_repo.upsert(key, &value).await?;
        self.invalidate_texts().await;
        Ok(entry)
    }

    async fn delete_text(&self, key: &str) -> Result<(), ContentError> {
        if !self.text_repo.delete(key).await? {
            return Err(ContentError::NotFound("Translation"));
        }
        self.invalidate_texts().await;
        Ok(())
    }

    #[instrument(skip(self, upload), fields(content_type = %upload.content_type, size = upload.bytes.len()))]
    async fn upload_media(&self, upload: UploadMediaDto) -> Result<MediaDto, ContentError> {
        if !is_allowed_media_type(&upload.content_type) {
            return Err(ContentError::Invalid(
                "Only image and video files can be uploaded".into(),
            ));
        }
        if upload.bytes.is_empty() {
            return Err(ContentError::Invalid("File is empty".into()));
        }
        if upload.bytes.len() > self.max_upload_bytes {
            return Err(ContentError::Invalid(format!(
                "File exceeds the {} byte limit",
                self.max_upload_bytes
            )));
        }

        let now = Utc::now();
        let extension = media_extension(upload.file_name.as_deref(), &upload.content_type);
        let key = storage::media_key(&extension, now);
        let size_bytes = upload.bytes.len() as i64;

        self.store
            .put(&key, upload.bytes, &upload.content_type)
            .await?;

        let media = MediaObject {
            key: key.clone(),
            content_type: upload.content_type,
            size_bytes,
            original_name: upload.file_name,
            uploaded_at: now,
        };

        let media = match self.media_repo.create(&media).await {
            Ok(media) => media,
            Err(e) => {
                if let Err(cleanup) = self.store.delete(&key).await {
                    warn!(%key, error = %cleanup, "Orphaned object left in storage");
                }
                return Err(e.into());
            }
        };

        info!(key = %media.key, "Media uploaded");
        Ok(self.media_dto(media))
    }

    async fn list_media(&self, query: MediaQueryDto) -> Result<Vec<MediaDto>, ContentError> {
        let prefix = match query.kind.as_deref() {
            None | Some("") => None,
            Some("image") => Some("image/"),
            Some("video") => Some("video/"),
            Some(other) => {
                return Err(ContentError::Invalid(format!("Unknown media kind {}", other)))
            }
        };

        let media = self
            .media_repo
            .list(
                prefix,
                query.limit.unwrap_or(50).clamp(1, 200),
                query.offset.unwrap_or(0).max(0),
            )
            .await?;

        Ok(media.into_iter().map(|m| self.media_dto(m)).collect())
    }

    #[instrument(skip(self))]
    async fn delete_media(&self, key: &str) -> Result<(), ContentError> {
        if self.media_repo.find_by_key(key).await?.is_none() {
            return Err(ContentError::NotFound("Media"));
        }

        self.store.delete(key).await?;
        self.media_repo.delete(key).await?;
        debug!(%key, "Media deleted");
        Ok(())
    }

    async fn homepage(&self, lang: Language) -> Result<Vec<HomepageSectionDto>, ContentError> {
        let items = self.homepage_repo.list().await?;

        let mut sections: Vec<HomepageSectionDto> = Vec::new();
        for item in items {
            let dto = HomepageItemDto {
                id: item.id,
                url: storage::public_url(&self.cdn_base_url, &item.media_key),
                alt: item.alt.get(lang).to_string(),
                media_key: item.media_key,
                link_url: item.link_url,
                position: item.position,
            };

            match sections.last_mut() {
                Some(section) if section.section == item.section => section.items.push(dto),
                _ => sections.push(HomepageSectionDto {
                    section: item.section,
                    items: vec![dto],
                }),
            }
        }

        Ok(sections)
    }

    async fn create_homepage_item(&self, input: HomepageItemInput) -> Result<HomepageMediaItem, ContentError> {
        self.validate_homepage_input(&input).await?;

        let item = HomepageMediaItem {
            id: Uuid::now_v7(),
            section: input.section.trim().to_string(),
            media_key: input.media_key,
            position: input.position,
            alt: input.alt,
            link_url: input.link_url,
            created_at: Utc::now(),
        };
        Ok(self.homepage_repo.create(&item).await?)
    }

    async fn update_homepage_item(
        &self,
        id: Uuid,
        input: HomepageItemInput,
    ) -> Result<HomepageMediaItem, ContentError> {
        self.validate_homepage_input(&input).await?;

        let item = HomepageMediaItem {
            id,
            section: input.section.trim().to_string(),
            media_key: input.media_key,
            position: input.position,
            alt: input.alt,
            link_url: input.link_url,
            created_at: Utc::now(),
        };
        self.homepage_repo
            .update(&item)
            .await?
            .ok_or(ContentError::NotFound("Homepage item"))
    }

    async fn delete_homepage_item(&self, id: Uuid) -> Result<(), ContentError> {
        if !self.homepage_repo.delete(id).await? {
            return Err(ContentError::NotFound("Homepage item"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::cache::MemoryCache;
    use crate::infrastructure::storage::InMemoryObjectStore;
    use std::sync::Mutex;
    use test_case::test_case;

    #[derive(Default)]
    struct MemoryTexts {
        entries: Mutex<Vec<TextEntry>>,
        reads: Mutex<usize>,
    }

    #[async_trait]
    impl TextRepository for MemoryTexts {
        async fn find_all(&self) -> Result<Vec<TextEntry>, AppError> {
            *self.reads.lock().unwrap() += 1;
            Ok(self.entries.lock().unwrap().clone())
        }

        async fn upsert(&self, key: &str, value: &LocalizedText) -> Result<TextEntry, AppError> {
            let mut entries = self.entries.lock().unwrap();
            entries.retain(|e| e.key != key);
            let entry = TextEntry {
                key: key.to_string(),
                value: value.clone(),
                updated_at: Utc::now(),
            };
            entries.push(entry.clone());
            Ok(entry)
        }

        async fn delete(&self, key: &str) -> Result<bool, AppError> {
            let mut entries = self.entries.lock().unwrap();
            let before = entries.len();
            entries.retain(|e| e.key != key);
            Ok(entries.len() != before)
        }
    }

    #[derive(Default)]
    struct MemoryMedia {
        rows: Mutex<Vec<MediaObject>>,
        fail_inserts: bool,
    }

    #[async_trait]
    impl MediaRepository for MemoryMedia {
        async fn create(&self, media: &MediaObject) -> Result<MediaObject, AppError> {
            if self.fail_inserts {
                return Err(AppError::Internal("insert failed".into()));
            }
            self.rows.lock().unwrap().push(media.clone());
            Ok(media.clone())
        }

        async fn find_by_key(&self, key: &str) -> Result<Option<MediaObject>, AppError> {
            Ok(self.rows.lock().unwrap().iter().find(|m| m.key == key).cloned())
        }

        async fn list(
            &self,
            content_type_prefix: Option<&str>,
            limit: i64,
            _offset: i64,
        ) -> Result<Vec<MediaObject>, AppError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|m| content_type_prefix.is_none_or(|p| m.content_type.starts_with(p)))
                .take(limit as usize)
                .cloned()
                .collect())
        }

        async fn delete(&self, key: &str) -> Result<bool, AppError> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|m| m.key != key);
            Ok(rows.len() != before)
        }
    }

    #[derive(Default)]
    struct MemoryHomepage {
        items: Mutex<Vec<HomepageMediaItem>>,
    }

    #[async_trait]
    impl HomepageMediaRepository for MemoryHomepage {
        async fn list(&self) -> Result<Vec<HomepageMediaItem>, AppError> {
            let mut items = self.items.lock().unwrap().clone();
            items.sort_by(|a, b| (&a.section, a.position).cmp(&(&b.section, b.position)));
            Ok(items)
        }

        async fn create(&self, item: &HomepageMediaItem) -> Result<HomepageMediaItem, AppError> {
            self.items.lock().unwrap().push(item.clone());
            Ok(item.clone())
        }

        async fn update(&self, item: &HomepageMediaItem) -> Result<Option<HomepageMediaItem>, AppError> {
            let mut items = self.items.lock().unwrap();
            Ok(items.iter_mut().find(|i| i.id == item.id).map(|existing| {
                *existing = item.clone();
                item.clone()
            }))
        }

        async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
            let mut items = self.items.lock().unwrap();
            let before = items.len();
            items.retain(|i| i.id != id);
            Ok(items.len() != before)
        }
    }

    struct Fixture {
        service: ContentServiceImpl<MemoryTexts, MemoryMedia, MemoryHomepage, MemoryCache>,
        texts: Arc<MemoryTexts>,
        cache: Arc<MemoryCache>,
        store: Arc<InMemoryObjectStore>,
    }

    fn fixture_with(media: MemoryMedia) -> Fixture {
        let texts = Arc::new(MemoryTexts::default());
        let cache = Arc::new(MemoryCache::default());
        let store = Arc::new(InMemoryObjectStore::new());
        let service = ContentServiceImpl::new(
            texts.clone(),
            Arc::new(media),
            Arc::new(MemoryHomepage::default()),
            Some(cache.clone()),
            store.clone(),
            "https://cdn.rehab.example",
            1024,
        );
        Fixture {
            service,
            texts,
            cache,
            store,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(MemoryMedia::default())
    }

    fn png(name: &str) -> UploadMediaDto {
        UploadMediaDto {
            file_name: Some(name.into()),
            content_type: "image/png".into(),
            bytes: vec![0x89, b'P', b'N', b'G'],
        }
    }

    #[test_case("hero.title", true)]
    #[test_case("donate.cta-button", true)]
    #[test_case("", false)]
    #[test_case("has space", false)]
    #[test_case("path/like", false)]
    fn validates_text_keys(key: &str, expected: bool) {
        assert_eq!(is_valid_text_key(key), expected);
    }

    #[test_case(Some("photo.JPG"), "image/jpeg", "jpg")]
    #[test_case(Some("noext"), "image/webp", "webp")]
    #[test_case(None, "image/svg+xml", "svg")]
    #[test_case(Some("clip.mp4"), "video/mp4", "mp4")]
    fn picks_media_extension(name: Option<&str>, content_type: &str, expected: &str) {
        assert_eq!(media_extension(name, content_type), expected);
    }

    #[tokio::test]
    async fn translations_fall_back_and_are_cached() {
        let f = fixture();
        f.service
            .upsert_text("hero.title", LocalizedText::new("Центр", "", "Centrum"))
            .await
            .unwrap();

        let en = f.service.translations(Language::En).await.unwrap();
        assert_eq!(en.texts["hero.title"], "Центр");
        assert_eq!(en.warning, None);
        assert!(f.cache.contains(&keys::texts(Language::En)));

        f.service.translations(Language::En).await.unwrap();
        assert_eq!(*f.texts.reads.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn translations_without_cache_carry_a_warning() {
        let texts = Arc::new(MemoryTexts::default());
        let service: ContentServiceImpl<_, _, _, MemoryCache> = ContentServiceImpl::new(
            texts.clone(),
            Arc::new(MemoryMedia::default()),
            Arc::new(MemoryHomepage::default()),
            None,
            Arc::new(InMemoryObjectStore::new()),
            "https://cdn.rehab.example",
            1024,
        );
        service
            .upsert_text("hero.title", LocalizedText::new("Центр", "Center", ""))
            .await
            .unwrap();

        let en = service.translations(Language::En).await.unwrap();

        assert_eq!(en.texts["hero.title"], "Center");
        assert_eq!(en.warning.as_deref(), Some(UNCACHED_TRANSLATIONS_WARNING));
    }

    #[tokio::test]
    async fn writes_invalidate_cached_bundles() {
        let f = fixture();
        f.service
            .upsert_text("hero.title", LocalizedText::new("Центр", "Center", ""))
            .await
            .unwrap();
        f.service.translations(Language::En).await.unwrap();

        f.service
            .upsert_text("hero.title", LocalizedText::new("Центр", "Centre", ""))
            .await
            .unwrap();
        assert!(!f.cache.contains(&keys::texts(Language::En)));

        let en = f.service.translations(Language::En).await.unwrap();
        assert_eq!(en.texts["hero.title"], "Centre");
    }

    #[tokio::test]
    async fn deleting_a_missing_translation_is_not_found() {
        let f = fixture();
        assert!(matches!(
            f.service.delete_text("nope").await,
            Err(ContentError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn upload_stores_object_and_row() {
        let f = fixture();
        let media = f.service.upload_media(png("logo.png")).await.unwrap();

        assert!(media.key.starts_with("media/"));
        assert!(media.key.ends_with(".png"));
        assert_eq!(media.url, format!("https://cdn.rehab.example/{}", media.key));
        assert!(f.store.contains(&media.key).await);

        f.service.delete_media(&media.key).await.unwrap();
        assert!(!f.store.contains(&media.key).await);
        assert!(matches!(
            f.service.delete_media(&media.key).await,
            Err(ContentError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn upload_rejects_documents_and_oversized_files() {
        let f = fixture();

        let mut pdf = png("cv.pdf");
        pdf.content_type = "application/pdf".into();
        assert!(matches!(f.service.upload_media(pdf).await, Err(ContentError::Invalid(_))));

        let mut big = png("big.png");
        big.bytes = vec![0; 2048];
        assert!(matches!(f.service.upload_media(big).await, Err(ContentError::Invalid(_))));
    }

    #[tokio::test]
    async fn failed_insert_removes_the_stored_object() {
        let f = fixture_with(MemoryMedia {
            fail_inserts: true,
            ..Default::default()
        });

        assert!(f.service.upload_media(png("logo.png")).await.is_err());
        assert!(f.service.list_media(MediaQueryDto::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn homepage_groups_by_section_in_order() {
        let f = fixture();
        let media = f.service.upload_media(png("a.png")).await.unwrap();

        for (section, position) in [("hero", 2), ("gallery", 1), ("hero", 1)] {
            f.service
                .create_homepage_item(HomepageItemInput {
                    section: section.into(),
                    media_key: media.key.clone(),
                    position,
                    alt: LocalizedText::new("Фото", "Photo", ""),
                    link_url: None,
                })
                .await
                .unwrap();
        }

        let sections = f.service.homepage(Language::Pl).await.unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].section, "gallery");
        assert_eq!(sections[1].section, "hero");
        assert_eq!(
            sections[1].items.iter().map(|i| i.position).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert_eq!(sections[1].items[0].alt, "Фото");
    }

    #[tokio::test]
    async fn homepage_items_must_reference_existing_media() {
        let f = fixture();
        let result = f
            .service
            .create_homepage_item(HomepageItemInput {
                section: "hero".into(),
                media_key: "media/2024/01/missing.png".into(),
                position: 0,
                alt: LocalizedText::default(),
                link_url: None,
            })
            .await;
        assert!(matches!(result, Err(ContentError::Invalid(_))));
    }
}
