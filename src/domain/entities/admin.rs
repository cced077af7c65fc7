//! Admin user and admin session entities with their repository traits.
//!
//! Maps to the `admin_users` and `admin_sessions` tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;

/// An account allowed into the admin panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: Uuid,
    pub username: String,

    /// Argon2 PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// A logged-in browser, identified by the hash of its cookie token.
///
/// Maps to the `admin_sessions` table:
/// - token_hash: CHAR(64) PRIMARY KEY (SHA-256 hex, never the raw token)
/// - admin_id: UUID NOT NULL REFERENCES admin_users(id) ON DELETE CASCADE
/// - expires_at: TIMESTAMPTZ NOT NULL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSession {
    #[serde(skip_serializing)]
    pub token_hash: String,
    pub admin_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AdminSession {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Repository trait for admin accounts.
#[async_trait]
pub trait AdminUserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AdminUser>, AppError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<AdminUser>, AppError>;

    async fn create(&self, user: &AdminUser) -> Result<AdminUser, AppError>;

    async fn count(&self) -> Result<i64, AppError>;

    async fn touch_login(&self, id: Uuid) -> Result<(), AppError>;
}

/// Repository trait for admin sessions.
#[async_trait]
pub trait AdminSessionRepository: Send + Sync {
    async fn create(&self, session: &AdminSession) -> Result<(), AppError>;

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<AdminSession>, AppError>;

    async fn delete(&self, token_hash: &str) -> Result<(), AppError>;

    /// Delete expired sessions, returning how many were removed.
    async fn cleanup_expired(&self) -> Result<u64, AppError>;
}
