//! Spending Report Handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::application::dto::request::{ReportItemRequest, ReportQuery, ReportSettingRequest};
use crate::application::dto::response::ApiResponse;
use crate::application::services::{ReportDto, ReportItemInput, ReportService};
use crate::domain::{Currency, Language, ReportItem, ReportSetting};
use crate::presentation::http::extractors::ValidatedJson;
use crate::shared::error::AppError;
use crate::startup::AppState;

fn item_input(body: ReportItemRequest) -> Result<ReportItemInput, AppError> {
    let currency = match body.currency.as_deref() {
        None => Currency::default(),
        Some(code) => Currency::parse(code)
            .ok_or_else(|| AppError::Validation(format!("Unsupported currency '{}'", code)))?,
    };

    Ok(ReportItemInput {
        period: body.period,
        category: body.category,
        description: body.description,
        amount_minor: body.amount_minor,
        currency,
        position: body.position,
    })
}

/// Report for a period, the newest one by default
pub async fn report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ApiResponse<ReportDto>>, AppError> {
    let lang = Language::from_code_or_default(query.lang.as_deref());
    let report = state
        .report_service()
        .report(query.period.as_deref(), lang)
        .await?;
    Ok(Json(ApiResponse::ok(report)))
}

pub async fn create_item(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<ReportItemRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ReportItem>>), AppError> {
    let item = state.report_service().create_item(item_input(body)?).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(item))))
}

pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<ReportItemRequest>,
) -> Result<Json<ApiResponse<ReportItem>>, AppError> {
    let item = state
        .report_service()
        .update_item(id, item_input(body)?)
        .await?;
    Ok(Json(ApiResponse::ok(item)))
}

pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.report_service().delete_item(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Set a report page setting such as the fundraising goal
pub async fn upsert_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(body): Json<ReportSettingRequest>,
) -> Result<Json<ApiResponse<ReportSetting>>, AppError> {
    let setting = state.report_service().upsert_setting(&key, body.value).await?;
    Ok(Json(ApiResponse::ok(setting)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(currency: Option<&str>) -> ReportItemRequest {
        ReportItemRequest {
            period: "2024-05".into(),
            category: "food".into(),
            description: Default::default(),
            amount_minor: 120_000,
            currency: currency.map(str::to_string),
            position: 0,
        }
    }

    #[test]
    fn currency_defaults_to_hryvnia() {
        assert_eq!(item_input(body(None)).unwrap().currency, Currency::Uah);
    }

    #[test]
    fn unknown_currency_is_rejected() {
        assert!(matches!(item_input(body(Some("XYZ"))), Err(AppError::Validation(_))));
    }
}
