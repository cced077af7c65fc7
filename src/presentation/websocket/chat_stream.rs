//! Chat Room Stream
//!
//! `GET /api/chat/sessions/{id}/ws` pushes the session's room events as
//! JSON text frames. The stream is receive-only: messages are still sent
//! through the HTTP endpoints so they pass validation and the database
//! fallback.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::interval;
use uuid::Uuid;

use crate::application::services::ChatService;
use crate::domain::ChatSessionStatus;
use crate::infrastructure::metrics;
use crate::infrastructure::realtime::{ChatEvent, RoomHub};
use crate::shared::error::AppError;
use crate::startup::AppState;

const PING_INTERVAL: Duration = Duration::from_secs(30);

/// WebSocket upgrade handler
pub async fn chat_stream(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let rooms = state.rooms.clone().ok_or_else(|| {
        AppError::BadRequest("Real-time chat is disabled, poll the messages endpoint instead".into())
    })?;

    let current = state.chat_service().session_status(session_id).await?;
    let greeting = ChatEvent::Status {
        session_id,
        status: current.session.status,
        queue_position: current.session.queue_position,
    };
    if current.session.status == ChatSessionStatus::Closed {
        return Err(AppError::BadRequest("Chat session is closed".into()));
    }

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, rooms, session_id, greeting)))
}

async fn handle_socket(socket: WebSocket, rooms: Arc<RoomHub>, session_id: Uuid, greeting: ChatEvent) {
    let events = rooms.subscribe(session_id);
    metrics::CHAT_STREAMS_ACTIVE.inc();
    tracing::debug!(%session_id, "Chat stream connected");

    forward_events(socket, events, session_id, greeting).await;

    rooms.release(session_id);
    metrics::CHAT_STREAMS_ACTIVE.dec();
    tracing::debug!(%session_id, "Chat stream disconnected");
}

async fn forward_events(
    socket: WebSocket,
    mut events: broadcast::Receiver<ChatEvent>,
    session_id: Uuid,
    greeting: ChatEvent,
) {
    let (mut sender, mut receiver) = socket.split();

    if send_event(&mut sender, &greeting).await.is_err() {
        return;
    }

    let mut ping = interval(PING_INTERVAL);
    ping.tick().await;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    let closed = matches!(
                        event,
                        ChatEvent::Status { status: ChatSessionStatus::Closed, .. }
                    );
                    if send_event(&mut sender, &event).await.is_err() || closed {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(%session_id, skipped, "Chat stream lagged, events dropped");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                // Pings are answered by the protocol layer; text is ignored.
                Some(Ok(_)) => {}
            },
            _ = ping.tick() => {
                if sender.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            }
        }
    }

    let _ = sender.send(Message::Close(None)).await;
}

async fn send_event<S>(sender: &mut S, event: &ChatEvent) -> Result<(), ()>
where
    S: SinkExt<Message> + Unpin,
{
    let text = match serde_json::to_string(event) {
        Ok(text) => text,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize chat event");
            return Ok(());
        }
    };
    sender.send(Message::Text(text.into())).await.map_err(|_| ())
}
