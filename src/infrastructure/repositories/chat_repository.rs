//! Chat Repository Implementation
//!
//! PostgreSQL implementations of the ChatSessionRepository and
//! ChatMessageRepository traits.
//!
//! Admission and closing run inside a transaction holding a
//! transaction-scoped advisory lock, so two visitors arriving at the same
//! moment cannot both become active or share a queue position.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::{
    Admission, ChatMessage, ChatMessageRepository, ChatSession, ChatSessionRepository,
    ChatSessionStatus, CloseOutcome, MessageSender, NewChatSession,
};
use crate::shared::error::AppError;

/// Advisory lock key serialising every change to the chat queue.
const CHAT_QUEUE_LOCK: i64 = 0x4348_4154; // "CHAT"

const SESSION_COLUMNS: &str = "id, visitor_name, visitor_phone, visitor_email, status, \
                               queue_position, created_at, activated_at, closed_at";

/// Database row representation of the chat_sessions table.
#[derive(Debug, sqlx::FromRow)]
struct ChatSessionRow {
    id: Uuid,
    visitor_name: String,
    visitor_phone: String,
    visitor_email: Option<String>,
    status: String,
    queue_position: Option<i32>,
    created_at: DateTime<Utc>,
    activated_at: Option<DateTime<Utc>>,
    closed_at: Option<DateTime<Utc>>,
}

impl ChatSessionRow {
    fn into_session(self) -> Result<ChatSession, AppError> {
        let status = ChatSessionStatus::parse(&self.status).ok_or_else(|| {
            AppError::Internal(format!("unknown chat session status {:?}", self.status))
        })?;

        Ok(ChatSession {
            id: self.id,
            visitor_name: self.visitor_name,
            visitor_phone: self.visitor_phone,
            visitor_email: self.visitor_email,
            status,
            queue_position: self.queue_position,
            created_at: self.created_at,
            activated_at: self.activated_at,
            closed_at: self.closed_at,
        })
    }
}

/// Database row representation of the chat_messages table.
#[derive(Debug, sqlx::FromRow)]
struct ChatMessageRow {
    id: Uuid,
    session_id: Uuid,
    sender: String,
    content: String,
    created_at: DateTime<Utc>,
}

impl ChatMessageRow {
    fn into_message(self) -> Result<ChatMessage, AppError> {
        let sender = MessageSender::parse(&self.sender).ok_or_else(|| {
            AppError::Internal(format!("unknown chat message sender {:?}", self.sender))
        })?;

        Ok(ChatMessage {
            id: self.id,
            session_id: self.session_id,
            sender,
            content: self.content,
            created_at: self.created_at,
        })
    }
}

/// PostgreSQL chat session repository.
#[derive(Clone)]
pub struct PgChatSessionRepository {
    pool: PgPool,
}

impl PgChatSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn lock_queue(tx: &mut Transaction<'_, Postgres>) -> Result<(), AppError> {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(CHAT_QUEUE_LOCK)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ChatSessionRepository for PgChatSessionRepository {
    async fn admit(&self, contact: &NewChatSession) -> Result<ChatSession, AppError> {
        let mut tx = self.pool.begin().await?;
        Self::lock_queue(&mut tx).await?;

        let active: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM chat_sessions WHERE status = 'active'")
                .fetch_one(&mut *tx)
                .await?;

        let max_position: Option<i32> = sqlx::query_scalar(
            "SELECT MAX(queue_position) FROM chat_sessions WHERE status = 'queued'",
        )
        .fetch_one(&mut *tx)
        .await?;

        let session =
            ChatSession::admitted(contact, Admission::decide(active, max_position), Utc::now());

        let row = sqlx::query_as::<_, ChatSessionRow>(&format!(
            r#"
            INSERT INTO chat_sessions (
                id, visitor_name, visitor_phone, visitor_email, status,
                queue_position, created_at, activated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(session.id)
        .bind(&session.visitor_name)
        .bind(&session.visitor_phone)
        .bind(&session.visitor_email)
        .bind(session.status.as_str())
        .bind(session.queue_position)
        .bind(session.created_at)
        .bind(session.activated_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        row.into_session()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ChatSession>, AppError> {
        let row = sqlx::query_as::<_, ChatSessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM chat_sessions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_session()).transpose()
    }

    async fn count_queued_before(&self, position: i32) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM chat_sessions WHERE status = 'queued' AND queue_position < $1",
        )
        .bind(position)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn list(
        &self,
        status: Option<ChatSessionStatus>,
        limit: i64,
    ) -> Result<Vec<ChatSession>, AppError> {
        let rows = sqlx::query_as::<_, ChatSessionRow>(&format!(
            r#"
            SELECT {SESSION_COLUMNS}
            FROM chat_sessions
            WHERE ($1::TEXT IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2
            "#
        ))
        .bind(status.map(|s| s.as_str()))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_session()).collect()
    }

    async fn close(&self, id: Uuid) -> Result<Option<CloseOutcome>, AppError> {
        let mut tx = self.pool.begin().await?;
        Self::lock_queue(&mut tx).await?;

        let Some(current) = sqlx::query_as::<_, ChatSessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM chat_sessions WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };

        let current = current.into_session()?;
        if current.is_closed() {
            tx.commit().await?;
            return Ok(Some(CloseOutcome {
                closed: current,
                promoted: None,
            }));
        }

        let closed = sqlx::query_as::<_, ChatSessionRow>(&format!(
            r#"
            UPDATE chat_sessions
            SET status = 'closed', queue_position = NULL, closed_at = NOW()
            WHERE id = $1
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?
        .into_session()?;

        let promoted = if current.is_active() {
            sqlx::query_as::<_, ChatSessionRow>(&format!(
                r#"
                UPDATE chat_sessions
                SET status = 'active', queue_position = NULL, activated_at = NOW()
                WHERE id = (
                    SELECT id FROM chat_sessions
                    WHERE status = 'queued'
                    ORDER BY queue_position ASC, created_at ASC
                    LIMIT 1
                )
                AND NOT EXISTS (SELECT 1 FROM chat_sessions WHERE status = 'active')
                RETURNING {SESSION_COLUMNS}
                "#
            ))
            .fetch_optional(&mut *tx)
            .await?
            .map(|r| r.into_session())
            .transpose()?
        } else {
            None
        };

        tx.commit().await?;

        Ok(Some(CloseOutcome { closed, promoted }))
    }
}

/// PostgreSQL chat message repository.
#[derive(Clone)]
pub struct PgChatMessageRepository {
    pool: PgPool,
}

impl PgChatMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatMessageRepository for PgChatMessageRepository {
    async fn create(&self, message: &ChatMessage) -> Result<ChatMessage, AppError> {
        let row = sqlx::query_as::<_, ChatMessageRow>(
            r#"
            INSERT INTO chat_messages (id, session_id, sender, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, session_id, sender, content, created_at
            "#,
        )
        .bind(message.id)
        .bind(message.session_id)
        .bind(message.sender.as_str())
        .bind(&message.content)
        .bind(message.created_at)
        .fetch_one(&self.pool)
        .await?;

        row.into_message()
    }

    async fn find_by_session(
        &self,
        session_id: Uuid,
        after: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, AppError> {
        let rows = sqlx::query_as::<_, ChatMessageRow>(
            r#"
            SELECT id, session_id, sender, content, created_at
            FROM chat_messages
            WHERE session_id = $1
              AND ($2::TIMESTAMPTZ IS NULL OR created_at > $2)
            ORDER BY created_at ASC, id ASC
            LIMIT $3
            "#,
        )
        .bind(session_id)
        .bind(after)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_message()).collect()
    }
}
