//! Real-time chat rooms
//!
//! Every chat session has a room: a `broadcast` channel that the visitor's
//! and the operator's WebSocket streams subscribe to. The [`RoomHub`] is the
//! in-process relay. It persists each message and fans it out to the
//! room's subscribers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::domain::entities::{ChatMessage, ChatMessageRepository, ChatSessionStatus};
use crate::shared::error::AppError;

/// Events pushed to room subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ChatEvent {
    Message(ChatMessage),
    Status {
        session_id: Uuid,
        status: ChatSessionStatus,
        queue_position: Option<i32>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("real-time relay is unavailable")]
    Unavailable,

    #[error(transparent)]
    Persist(#[from] AppError),
}

/// A per-session channel that stores and distributes chat messages.
#[async_trait]
pub trait ChatRelay: Send + Sync {
    /// Whether the relay currently accepts messages.
    fn is_available(&self) -> bool;

    /// Persist a message and deliver it to the session's room.
    async fn relay(&self, message: ChatMessage) -> Result<ChatMessage, RelayError>;

    /// Push an event to a room without persisting anything.
    fn publish(&self, session_id: Uuid, event: ChatEvent);
}

/// In-process room registry.
pub struct RoomHub {
    rooms: DashMap<Uuid, broadcast::Sender<ChatEvent>>,
    messages: Arc<dyn ChatMessageRepository>,
    capacity: usize,
    available: AtomicBool,
}

impl RoomHub {
    pub fn new(messages: Arc<dyn ChatMessageRepository>, capacity: usize) -> Self {
        Self {
            rooms: DashMap::new(),
            messages,
            capacity: capacity.max(1),
            available: AtomicBool::new(true),
        }
    }

    /// Join a room, creating it on first use.
    pub fn subscribe(&self, session_id: Uuid) -> broadcast::Receiver<ChatEvent> {
        self.rooms
            .entry(session_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Drop a room once nobody listens to it anymore.
    pub fn release(&self, session_id: Uuid) {
        if self
            .rooms
            .remove_if(&session_id, |_, tx| tx.receiver_count() == 0)
            .is_some()
        {
            debug!(%session_id, "Chat room released");
        }
    }

    /// Stop accepting messages and disconnect every subscriber.
    pub fn shutdown(&self) {
        self.available.store(false, Ordering::SeqCst);
        self.rooms.clear();
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn dispatch(&self, session_id: Uuid, event: ChatEvent) {
        if let Some(tx) = self.rooms.get(&session_id) {
            // No receivers is fine: nobody has the chat open right now.
            let delivered = tx.send(event).unwrap_or(0);
            debug!(%session_id, delivered, "Chat event dispatched");
        }
    }
}

#[async_trait]
impl ChatRelay for RoomHub {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    #[instrument(skip(self, message), fields(session_id = %message.session_id))]
    async fn relay(&self, message: ChatMessage) -> Result<ChatMessage, RelayError> {
        if !self.is_available() {
            return Err(RelayError::Unavailable);
        }

        let stored = self.messages.create(&message).await?;
        self.dispatch(stored.session_id, ChatEvent::Message(stored.clone()));
        Ok(stored)
    }

    fn publish(&self, session_id: Uuid, event: ChatEvent) {
        self.dispatch(session_id, event);
    }
}
