//! Chat Service
//!
//! Visitor chats with single-active admission. Messages go through the
//! real-time relay when one is running and straight to the database
//! otherwise.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::{
    ChatMessage, ChatMessageRepository, ChatSession, ChatSessionRepository, ChatSessionStatus,
    CloseOutcome, MessageSender, NewChatSession,
};
use crate::infrastructure::metrics;
use crate::infrastructure::notifications::{Notification, Notifier};
use crate::infrastructure::realtime::{ChatEvent, ChatRelay, RelayError};
use crate::shared::error::AppError;

/// Upper bound for one page of chat history.
pub const MAX_HISTORY: i64 = 200;

/// Chat service trait
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Start a chat, either active or queued.
    async fn open_session(&self, request: OpenSessionDto) -> Result<SessionStatusDto, ChatError>;

    /// A session plus the number of visitors queued ahead of it.
    async fn session_status(&self, session_id: Uuid) -> Result<SessionStatusDto, ChatError>;

    /// Deliver a message through the relay or, failing that, the database.
    async fn send_message(
        &self,
        session_id: Uuid,
        sender: MessageSender,
        content: &str,
    ) -> Result<SentMessageDto, ChatError>;

    /// Chronological history, optionally only messages after a timestamp.
    async fn list_messages(
        &self,
        session_id: Uuid,
        after: Option<DateTime<Utc>>,
    ) -> Result<Vec<ChatMessage>, ChatError>;

    /// Close a session and promote the next queued visitor if needed.
    async fn close_session(&self, session_id: Uuid) -> Result<CloseOutcome, ChatError>;

    /// Sessions for the operator, newest first.
    async fn list_sessions(
        &self,
        status: Option<ChatSessionStatus>,
        limit: i64,
    ) -> Result<Vec<ChatSession>, ChatError>;
}

/// Open session request
#[derive(Debug, Clone)]
pub struct OpenSessionDto {
    pub visitor_name: String,
    pub visitor_phone: String,
    pub visitor_email: Option<String>,
    pub first_message: Option<String>,
}

/// Session with its place in the queue
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatusDto {
    #[serde(flatten)]
    pub session: ChatSession,
    pub queue_ahead: i64,
}

/// Path a message took to be stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Delivery {
    Realtime,
    Database,
}

impl Delivery {
    pub fn as_str(&self) -> &'static str {
        match self {
            Delivery::Realtime => "realtime",
            Delivery::Database => "database",
        }
    }
}

/// Stored message and how it got there
#[derive(Debug, Clone, Serialize)]
pub struct SentMessageDto {
    pub message: ChatMessage,
    pub delivered_via: Delivery,
}

/// Chat service errors
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Chat session not found")]
    SessionNotFound,

    #[error("Chat session is closed")]
    SessionClosed,

    #[error("Message must be between 1 and {0} characters")]
    InvalidContent(usize),

    #[error("Name must not be blank")]
    BlankName,

    #[error(transparent)]
    Repository(#[from] AppError),
}

impl From<ChatError> for AppError {
    fn from(error: ChatError) -> Self {
        match error {
            ChatError::SessionNotFound => AppError::NotFound("Chat session not found".into()),
            ChatError::SessionClosed => AppError::BadRequest("Chat session is closed".into()),
            e @ (ChatError::InvalidContent(_) | ChatError::BlankName) => {
                AppError::Validation(e.to_string())
            }
            ChatError::Repository(e) => e,
        }
    }
}

/// ChatService implementation
pub struct ChatServiceImpl<S, M>
where
    S: ChatSessionRepository,
    M: ChatMessageRepository,
{
    session_repo: Arc<S>,
    message_repo: Arc<M>,
    relay: Option<Arc<dyn ChatRelay>>,
    notifier: Notifier,
    max_message_length: usize,
}

impl<S, M> ChatServiceImpl<S, M>
where
    S: ChatSessionRepository,
    M: ChatMessageRepository,
{
    pub fn new(
        session_repo: Arc<S>,
        message_repo: Arc<M>,
        relay: Option<Arc<dyn ChatRelay>>,
        notifier: Notifier,
        max_message_length: usize,
    ) -> Self {
        Self {
            session_repo,
            message_repo,
            relay,
            notifier,
            max_message_length,
        }
    }

    fn check_content(&self, content: &str) -> Result<(), ChatError> {
        let length = content.trim().chars().count();
        if length == 0 || content.chars().count() > self.max_message_length {
            return Err(ChatError::InvalidContent(self.max_message_length));
        }
        Ok(())
    }

    async fn queue_ahead(&self, session: &ChatSession) -> Result<i64, ChatError> {
        match session.queue_position {
            Some(position) if session.status == ChatSessionStatus::Queued => {
                Ok(self.session_repo.count_queued_before(position).await?)
            }
            _ => Ok(0),
        }
    }

    async fn deliver(&self, message: ChatMessage) -> Result<SentMessageDto, ChatError> {
        if let Some(relay) = self.relay.as_ref().filter(|r| r.is_available()) {
            match relay.relay(message.clone()).await {
                Ok(stored) => {
                    metrics::record_chat_message(Delivery::Realtime.as_str());
                    return Ok(SentMessageDto {
                        message: stored,
                        delivered_via: Delivery::Realtime,
                    });
                }
                Err(RelayError::Unavailable) => {
                    warn!(session_id = %message.session_id, "Relay went away, storing message directly");
                }
                Err(RelayError::Persist(e)) => return Err(e.into()),
            }
        }

        let stored = self.message_repo.create(&message).await?;
        metrics::record_chat_message(Delivery::Database.as_str());
        Ok(SentMessageDto {
            message: stored,
            delivered_via: Delivery::Database,
        })
    }

    fn publish_status(&self, session: &ChatSession) {
        if let Some(relay) = &self.relay {
            relay.publish(
                session.id,
                ChatEvent::Status {
                    session_id: session.id,
                    status: session.status,
                    queue_position: session.queue_position,
                },
            );
        }
    }
}

#[async_trait]
impl<S, M> ChatService for ChatServiceImpl<S, M>
where
    S: ChatSessionRepository + 'static,
    M: ChatMessageRepository + 'static,
{
    #[instrument(skip(self, request))]
    async fn open_session(&self, request: OpenSessionDto) -> Result<SessionStatusDto, ChatError> {
        let visitor_name = request.visitor_name.trim();
        if visitor_name.is_empty() {
            return Err(ChatError::BlankName);
        }

        let first_message = request
            .first_message
            .filter(|m| !m.trim().is_empty());
        if let Some(content) = &first_message {
            self.check_content(content)?;
        }

        let contact = NewChatSession {
            visitor_name: visitor_name.to_string(),
            visitor_phone: request.visitor_phone.trim().to_string(),
            visitor_email: request
                .visitor_email
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty()),
        };

        let session = self.session_repo.admit(&contact).await?;
        metrics::record_chat_session_opened(session.status.as_str());
        info!(
            session_id = %session.id,
            status = %session.status,
            queue_position = ?session.queue_position,
            "Chat session opened"
        );

        if let Some(content) = &first_message {
            self.deliver(ChatMessage::new(session.id, MessageSender::Visitor, content))
                .await?;
        }

        self.notifier.notify(Notification::ChatOpened {
            session_id: session.id,
            visitor_name: session.visitor_name.clone(),
            visitor_phone: session.visitor_phone.clone(),
            queue_position: session.queue_position,
            first_message,
        });

        let queue_ahead = self.queue_ahead(&session).await?;
        Ok(SessionStatusDto {
            session,
            queue_ahead,
        })
    }

    async fn session_status(&self, session_id: Uuid) -> Result<SessionStatusDto, ChatError> {
        let session = self
            .session_repo
            .find_by_id(session_id)
            .await?
            .ok_or(ChatError::SessionNotFound)?;

        let queue_ahead = self.queue_ahead(&session).await?;
        Ok(SessionStatusDto {
            session,
            queue_ahead,
        })
    }

    #[instrument(skip(self, content))]
    async fn send_message(
        &self,
        session_id: Uuid,
        sender: MessageSender,
        content: &str,
    ) -> Result<SentMessageDto, ChatError> {
        self.check_content(content)?;

        let session = self
            .session_repo
            .find_by_id(session_id)
            .await?
            .ok_or(ChatError::SessionNotFound)?;

        if session.is_closed() {
            return Err(ChatError::SessionClosed);
        }

        let sent = self
            .deliver(ChatMessage::new(session_id, sender, content))
            .await?;

        if sender == MessageSender::Visitor {
            self.notifier.notify(Notification::ChatMessage {
                session_id,
                visitor_name: session.visitor_name,
                content: sent.message.content.clone(),
            });
        }

        Ok(sent)
    }

    async fn list_messages(
        &self,
        session_id: Uuid,
        after: Option<DateTime<Utc>>,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        if self.session_repo.find_by_id(session_id).await?.is_none() {
            return Err(ChatError::SessionNotFound);
        }

        Ok(self
            .message_repo
            .find_by_session(session_id, after, MAX_HISTORY)
            .await?)
    }

    #[instrument(skip(self))]
    async fn close_session(&self, session_id: Uuid) -> Result<CloseOutcome, ChatError> {
        let outcome = self
            .session_repo
            .close(session_id)
            .await?
            .ok_or(ChatError::SessionNotFound)?;

        self.publish_status(&outcome.closed);
        if let Some(promoted) = &outcome.promoted {
            info!(session_id = %promoted.id, "Queued chat promoted to active");
            self.publish_status(promoted);
        }

        Ok(outcome)
    }

    async fn list_sessions(
        &self,
        status: Option<ChatSessionStatus>,
        limit: i64,
    ) -> Result<Vec<ChatSession>, ChatError> {
        Ok(self
            .session_repo
            .list(status, limit.clamp(1, MAX_HISTORY))
            .await?)
    }
}
