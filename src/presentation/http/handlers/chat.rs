//! Chat Handlers
//!
//! Visitor endpoints for opening a chat and exchanging messages, plus the
//! operator's admin endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::application::dto::request::{
    ChatMessagesQuery, ChatSessionsQuery, OpenChatRequest, SendChatMessageRequest,
};
use crate::application::dto::response::ApiResponse;
use crate::application::services::{ChatService, Delivery, OpenSessionDto, SentMessageDto, SessionStatusDto};
use crate::domain::{ChatMessage, ChatSession, ChatSessionStatus, CloseOutcome, MessageSender};
use crate::presentation::http::extractors::ValidatedJson;
use crate::shared::error::AppError;
use crate::startup::AppState;

const DATABASE_FALLBACK_WARNING: &str = "Real-time delivery unavailable, message stored for later";

/// Messages stored without the relay still succeed, with a warning.
fn sent_response(sent: SentMessageDto) -> ApiResponse<SentMessageDto> {
    let warning = (sent.delivered_via == Delivery::Database)
        .then(|| DATABASE_FALLBACK_WARNING.to_string());
    ApiResponse::with_warning(sent, warning)
}

/// Start a chat; the visitor is either connected or queued
pub async fn open_session(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<OpenChatRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SessionStatusDto>>), AppError> {
    let status = state
        .chat_service()
        .open_session(OpenSessionDto {
            visitor_name: body.name,
            visitor_phone: body.phone,
            visitor_email: body.email,
            first_message: body.message,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(status))))
}

/// Session status and queue position
pub async fn session_status(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<ApiResponse<SessionStatusDto>>, AppError> {
    let status = state.chat_service().session_status(session_id).await?;
    Ok(Json(ApiResponse::ok(status)))
}

/// Chat history
pub async fn list_messages(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Query(query): Query<ChatMessagesQuery>,
) -> Result<Json<ApiResponse<Vec<ChatMessage>>>, AppError> {
    let messages = state
        .chat_service()
        .list_messages(session_id, query.after)
        .await?;
    Ok(Json(ApiResponse::ok(messages)))
}

/// Visitor sends a message
pub async fn send_visitor_message(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<SendChatMessageRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SentMessageDto>>), AppError> {
    send(state, session_id, MessageSender::Visitor, body).await
}

/// Operator replies (admin)
pub async fn send_operator_message(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<SendChatMessageRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SentMessageDto>>), AppError> {
    send(state, session_id, MessageSender::Operator, body).await
}

async fn send(
    state: AppState,
    session_id: Uuid,
    sender: MessageSender,
    body: SendChatMessageRequest,
) -> Result<(StatusCode, Json<ApiResponse<SentMessageDto>>), AppError> {
    let sent = state
        .chat_service()
        .send_message(session_id, sender, &body.content)
        .await?;

    Ok((StatusCode::CREATED, Json(sent_response(sent))))
}

/// Sessions for the operator (admin)
pub async fn list_sessions(
    State(state): State<AppState>,
    Query(query): Query<ChatSessionsQuery>,
) -> Result<Json<ApiResponse<Vec<ChatSession>>>, AppError> {
    let status = query
        .status
        .as_deref()
        .map(|s| {
            ChatSessionStatus::parse(s)
                .ok_or_else(|| AppError::Validation(format!("Unknown chat status '{}'", s)))
        })
        .transpose()?;

    let sessions = state
        .chat_service()
        .list_sessions(status, query.limit.unwrap_or(50))
        .await?;
    Ok(Json(ApiResponse::ok(sessions)))
}

/// Close a chat and admit the next visitor (admin)
pub async fn close_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<ApiResponse<CloseOutcome>>, AppError> {
    let outcome = state.chat_service().close_session(session_id).await?;
    Ok(Json(ApiResponse::ok(outcome)))
}
