//! Application Error Types
//!
//! Centralized error handling with Axum integration.
//!
//! Every error is rendered as `{"success": false, "error": ..., "details": ...}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Validation failed")]
    InvalidFields(Vec<FieldError>),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            details: None,
        }
    }
}

/// Field-level validation error
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl AppError {
    /// HTTP status this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation(_) | AppError::InvalidFields(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) | AppError::Database(_) | AppError::Redis(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            AppError::NotFound(msg)
            | AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::Conflict(msg)
            | AppError::Validation(msg) => ErrorResponse::new(msg),
            AppError::RateLimited => ErrorResponse::new("Too many requests"),
            AppError::InvalidFields(fields) => ErrorResponse {
                success: false,
                error: fields
                    .first()
                    .map(|f| format!("{}: {}", f.field, f.message))
                    .unwrap_or_else(|| "Validation failed".into()),
                details: serde_json::to_value(&fields).ok(),
            },
            AppError::Upstream(msg) => {
                tracing::error!("Upstream error: {}", msg);
                ErrorResponse::new("External service unavailable")
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                ErrorResponse::new("Internal server error")
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                ErrorResponse::new("Internal server error")
            }
            AppError::Redis(e) => {
                tracing::error!("Redis error: {}", e);
                ErrorResponse::new("Internal server error")
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(AppError::NotFound("x".into()), StatusCode::NOT_FOUND)]
    #[test_case(AppError::Validation("x".into()), StatusCode::BAD_REQUEST)]
    #[test_case(AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED)]
    #[test_case(AppError::Conflict("x".into()), StatusCode::CONFLICT)]
    #[test_case(AppError::RateLimited, StatusCode::TOO_MANY_REQUESTS)]
    #[test_case(AppError::Upstream("x".into()), StatusCode::BAD_GATEWAY)]
    #[test_case(AppError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    fn maps_variant_to_status(error: AppError, expected: StatusCode) {
        assert_eq!(error.status_code(), expected);
    }

    #[test]
    fn error_response_omits_empty_details() {
        let json = serde_json::to_value(ErrorResponse::new("nope")).unwrap();
        assert_eq!(json, serde_json::json!({"success": false, "error": "nope"}));
    }
}
