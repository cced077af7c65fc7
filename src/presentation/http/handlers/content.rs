//! Content Handlers
//!
//! Translations, media library and homepage slots.

use std::collections::BTreeMap;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::application::dto::request::{HomepageItemRequest, LangQuery, MediaQuery};
use crate::application::dto::response::ApiResponse;
use crate::application::services::{
    ContentService, HomepageItemInput, HomepageSectionDto, MediaDto, MediaQueryDto, UploadMediaDto,
};
use crate::domain::{HomepageMediaItem, Language, LocalizedText, TextEntry};
use crate::presentation::http::extractors::ValidatedJson;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Multipart field carrying the uploaded file.
const FILE_FIELD: &str = "file";

// ============================================================================
// Translations
// ============================================================================

/// `{key: text}` for one language
pub async fn translations(
    State(state): State<AppState>,
    Query(query): Query<LangQuery>,
) -> Result<Json<ApiResponse<BTreeMap<String, String>>>, AppError> {
    let lang = Language::from_code_or_default(query.lang.as_deref());
    let bundle = state.content_service().translations(lang).await?;
    Ok(Json(ApiResponse::with_warning(bundle.texts, bundle.warning)))
}

/// All keys with every language (admin)
pub async fn list_texts(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<TextEntry>>>, AppError> {
    let texts = state.content_service().list_texts().await?;
    Ok(Json(ApiResponse::ok(texts)))
}

/// Create or replace a translation (admin)
pub async fn upsert_text(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(value): Json<LocalizedText>,
) -> Result<Json<ApiResponse<TextEntry>>, AppError> {
    let entry = state.content_service().upsert_text(&key, value).await?;
    Ok(Json(ApiResponse::ok(entry)))
}

/// Delete a translation (admin)
pub async fn delete_text(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<StatusCode, AppError> {
    state.content_service().delete_text(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Media
// ============================================================================

pub async fn list_media(
    State(state): State<AppState>,
    Query(query): Query<MediaQuery>,
) -> Result<Json<ApiResponse<Vec<MediaDto>>>, AppError> {
    let media = state
        .content_service()
        .list_media(MediaQueryDto {
            kind: query.kind,
            limit: query.limit,
            offset: query.offset,
        })
        .await?;
    Ok(Json(ApiResponse::ok(media)))
}

/// Upload an image or video as the `file` field (admin)
pub async fn upload_media(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<MediaDto>>), AppError> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;

        upload = Some(UploadMediaDto {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
        break;
    }

    let upload = upload.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;
    let media = state.content_service().upload_media(upload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(media))))
}

/// Remove a file from storage (admin)
pub async fn delete_media(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<StatusCode, AppError> {
    state.content_service().delete_media(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Homepage
// ============================================================================

fn homepage_input(body: HomepageItemRequest) -> HomepageItemInput {
    HomepageItemInput {
        section: body.section,
        media_key: body.media_key,
        position: body.position,
        alt: body.alt,
        link_url: body.link_url,
    }
}

pub async fn homepage(
    State(state): State<AppState>,
    Query(query): Query<LangQuery>,
) -> Result<Json<ApiResponse<Vec<HomepageSectionDto>>>, AppError> {
    let lang = Language::from_code_or_default(query.lang.as_deref());
    let sections = state.content_service().homepage(lang).await?;
    Ok(Json(ApiResponse::ok(sections)))
}

pub async fn create_homepage_item(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<HomepageItemRequest>,
) -> Result<(StatusCode, Json<ApiResponse<HomepageMediaItem>>), AppError> {
    let item = state
        .content_service()
        .create_homepage_item(homepage_input(body))
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(item))))
}

pub async fn update_homepage_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<HomepageItemRequest>,
) -> Result<Json<ApiResponse<HomepageMediaItem>>, AppError> {
    let item = state
        .content_service()
        .update_homepage_item(id, homepage_input(body))
        .await?;
    Ok(Json(ApiResponse::ok(item)))
}

pub async fn delete_homepage_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.content_service().delete_homepage_item(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
