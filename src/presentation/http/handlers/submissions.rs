//! Form Submission Handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::application::dto::request::{CreateSubmissionRequest, SubmissionsQuery, UpdateSubmissionRequest};
use crate::application::dto::response::{ApiResponse, MessageResponse};
use crate::application::services::{CreateSubmissionDto, SubmissionService};
use crate::domain::{FormSubmission, FormType, SubmissionFilter};
use crate::presentation::http::extractors::ValidatedJson;
use crate::shared::error::AppError;
use crate::startup::AppState;

fn parse_form_type(value: &str) -> Result<FormType, AppError> {
    FormType::parse(value).ok_or_else(|| {
        AppError::Validation(format!(
            "Unknown form type '{}', expected contact, consultation, volunteer, partnership or feedback",
            value
        ))
    })
}

/// Submit a public form
pub async fn create_submission(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<CreateSubmissionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<FormSubmission>>), AppError> {
    let form_type = parse_form_type(&body.form_type)?;

    let receipt = state
        .submission_service()
        .create_submission(CreateSubmissionDto {
            form_type,
            name: body.name,
            phone: body.phone,
            email: body.email,
            message: body.message,
            extra: body.extra,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_warning(receipt.submission, receipt.warning)),
    ))
}

/// List submissions (admin)
pub async fn list_submissions(
    State(state): State<AppState>,
    Query(query): Query<SubmissionsQuery>,
) -> Result<Json<ApiResponse<Vec<FormSubmission>>>, AppError> {
    let filter = SubmissionFilter {
        form_type: query.form_type.as_deref().map(parse_form_type).transpose()?,
        processed: query.processed,
        limit: query.limit.unwrap_or(50),
        offset: query.offset.unwrap_or(0),
    };

    let submissions = state.submission_service().list_submissions(filter).await?;
    Ok(Json(ApiResponse::ok(submissions)))
}

/// Mark a submission processed or unprocessed (admin)
pub async fn update_submission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateSubmissionRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .submission_service()
        .mark_processed(id, body.processed)
        .await?;
    Ok(Json(MessageResponse::new("Submission updated")))
}

/// Delete a submission (admin)
pub async fn delete_submission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.submission_service().delete_submission(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
