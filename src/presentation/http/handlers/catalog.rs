//! Services Catalog Handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::application::dto::request::{LangQuery, ServiceOptionRequest, ServiceRequest};
use crate::application::dto::response::ApiResponse;
use crate::application::services::{CatalogService, ServiceDto, ServiceInput, ServiceOptionInput};
use crate::domain::{Language, Service, ServiceOption, ServiceWithOptions};
use crate::presentation::http::extractors::ValidatedJson;
use crate::shared::error::AppError;
use crate::startup::AppState;

impl From<ServiceRequest> for ServiceInput {
    fn from(body: ServiceRequest) -> Self {
        Self {
            slug: body.slug,
            title: body.title,
            description: body.description,
            image_key: body.image_key,
            position: body.position,
            active: body.active,
        }
    }
}

impl From<ServiceOptionRequest> for ServiceOptionInput {
    fn from(body: ServiceOptionRequest) -> Self {
        Self {
            name: body.name,
            price_minor: body.price_minor,
            duration_minutes: body.duration_minutes,
            position: body.position,
        }
    }
}

/// Active services, localized
pub async fn list_services(
    State(state): State<AppState>,
    Query(query): Query<LangQuery>,
) -> Result<Json<ApiResponse<Vec<ServiceDto>>>, AppError> {
    let lang = Language::from_code_or_default(query.lang.as_deref());
    let services = state.catalog_service().list_services(lang).await?;
    Ok(Json(ApiResponse::ok(services)))
}

/// Every service with all languages, including inactive ones (admin)
pub async fn list_all_services(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ServiceWithOptions>>>, AppError> {
    let services = state.catalog_service().list_all().await?;
    Ok(Json(ApiResponse::ok(services)))
}

pub async fn create_service(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<ServiceRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Service>>), AppError> {
    let service = state.catalog_service().create_service(body.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(service))))
}

pub async fn update_service(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<ServiceRequest>,
) -> Result<Json<ApiResponse<Service>>, AppError> {
    let service = state.catalog_service().update_service(id, body.into()).await?;
    Ok(Json(ApiResponse::ok(service)))
}

/// Delete a service together with its options
pub async fn delete_service(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.catalog_service().delete_service(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_option(
    State(state): State<AppState>,
    Path(service_id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<ServiceOptionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ServiceOption>>), AppError> {
    let option = state
        .catalog_service()
        .create_option(service_id, body.into())
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(option))))
}

pub async fn update_option(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<ServiceOptionRequest>,
) -> Result<Json<ApiResponse<ServiceOption>>, AppError> {
    let option = state.catalog_service().update_option(id, body.into()).await?;
    Ok(Json(ApiResponse::ok(option)))
}

pub async fn delete_option(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.catalog_service().delete_option(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
