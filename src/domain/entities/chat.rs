//! Chat session and chat message entities and repository traits.
//!
//! Maps to the `chat_sessions` and `chat_messages` tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::services::Admission;
use crate::shared::error::AppError;

/// Lifecycle of a visitor chat.
///
/// Database definition:
/// ```sql
/// status VARCHAR(16) NOT NULL CHECK (status IN ('active', 'queued', 'closed'))
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatSessionStatus {
    /// The operator is talking to this visitor
    Active,
    /// Waiting for the active chat to finish
    Queued,
    /// Finished by the operator
    Closed,
}

impl ChatSessionStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(Self::Active),
            "queued" => Some(Self::Queued),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Queued => "queued",
            Self::Closed => "closed",
        }
    }
}

impl std::fmt::Display for ChatSessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Contact details a visitor submits to start a chat.
#[derive(Debug, Clone)]
pub struct NewChatSession {
    pub visitor_name: String,
    pub visitor_phone: String,
    pub visitor_email: Option<String>,
}

/// One visitor's conversation.
///
/// `queue_position` is set exactly when `status` is `Queued`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub visitor_name: String,
    pub visitor_phone: String,
    pub visitor_email: Option<String>,
    pub status: ChatSessionStatus,
    pub queue_position: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub activated_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl ChatSession {
    /// Build a session from contact details and the admission decision.
    pub fn admitted(contact: &NewChatSession, admission: Admission, now: DateTime<Utc>) -> Self {
        let (status, queue_position, activated_at) = match admission {
            Admission::Active => (ChatSessionStatus::Active, None, Some(now)),
            Admission::Queued { position } => (ChatSessionStatus::Queued, Some(position), None),
        };

        Self {
            id: Uuid::now_v7(),
            visitor_name: contact.visitor_name.clone(),
            visitor_phone: contact.visitor_phone.clone(),
            visitor_email: contact.visitor_email.clone(),
            status,
            queue_position,
            created_at: now,
            activated_at,
            closed_at: None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.status == ChatSessionStatus::Closed
    }

    pub fn is_active(&self) -> bool {
        self.status == ChatSessionStatus::Active
    }
}

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSender {
    Visitor,
    Operator,
}

impl MessageSender {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "visitor" => Some(Self::Visitor),
            "operator" => Some(Self::Operator),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Visitor => "visitor",
            Self::Operator => "operator",
        }
    }
}

/// A message inside a chat session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: Uuid,
    pub sender: MessageSender,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(session_id: Uuid, sender: MessageSender, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            session_id,
            sender,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// Result of closing a session: the closed row and, when the active chat
/// was closed, the queued session promoted in its place.
#[derive(Debug, Clone, Serialize)]
pub struct CloseOutcome {
    pub closed: ChatSession,
    pub promoted: Option<ChatSession>,
}

/// Repository trait for chat sessions.
#[async_trait]
pub trait ChatSessionRepository: Send + Sync {
    /// Insert a new session, deciding active vs. queued atomically against
    /// the sessions that already exist.
    async fn admit(&self, contact: &NewChatSession) -> Result<ChatSession, AppError>;

    /// Find a session by ID.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ChatSession>, AppError>;

    /// Number of queued sessions ahead of the given position.
    async fn count_queued_before(&self, position: i32) -> Result<i64, AppError>;

    /// List sessions, newest first, optionally filtered by status.
    async fn list(
        &self,
        status: Option<ChatSessionStatus>,
        limit: i64,
    ) -> Result<Vec<ChatSession>, AppError>;

    /// Close a session and promote the next queued one if it was active.
    /// Returns `None` when the session does not exist.
    async fn close(&self, id: Uuid) -> Result<Option<CloseOutcome>, AppError>;
}

/// Repository trait for chat messages.
#[async_trait]
pub trait ChatMessageRepository: Send + Sync {
    /// Persist a message.
    async fn create(&self, message: &ChatMessage) -> Result<ChatMessage, AppError>;

    /// Messages of a session in chronological order, optionally only those
    /// created after a timestamp.
    async fn find_by_session(
        &self,
        session_id: Uuid,
        after: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, AppError>;
}
