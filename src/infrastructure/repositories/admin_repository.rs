//! Admin Repository Implementation
//!
//! PostgreSQL implementations of AdminUserRepository and
//! AdminSessionRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{AdminSession, AdminSessionRepository, AdminUser, AdminUserRepository};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct AdminUserRow {
    id: Uuid,
    username: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    last_login_at: Option<DateTime<Utc>>,
}

impl AdminUserRow {
    fn into_user(self) -> AdminUser {
        AdminUser {
            id: self.id,
            username: self.username,
            password_hash: self.password_hash,
            created_at: self.created_at,
            last_login_at: self.last_login_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AdminSessionRow {
    token_hash: String,
    admin_id: Uuid,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl AdminSessionRow {
    fn into_session(self) -> AdminSession {
        AdminSession {
            token_hash: self.token_hash,
            admin_id: self.admin_id,
            created_at: self.created_at,
            expires_at: self.expires_at,
        }
    }
}

/// PostgreSQL admin account repository.
#[derive(Clone)]
pub struct PgAdminUserRepository {
    pool: PgPool,
}

impl PgAdminUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdminUserRepository for PgAdminUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AdminUser>, AppError> {
        let row = sqlx::query_as::<_, AdminUserRow>(
            r#"
            SELECT id, username, password_hash, created_at, last_login_at
            FROM admin_users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_user()))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<AdminUser>, AppError> {
        let row = sqlx::query_as::<_, AdminUserRow>(
            r#"
            SELECT id, username, password_hash, created_at, last_login_at
            FROM admin_users
            WHERE LOWER(username) = LOWER($1)
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_user()))
    }

    async fn create(&self, user: &AdminUser) -> Result<AdminUser, AppError> {
        let row = sqlx::query_as::<_, AdminUserRow>(
            r#"
            INSERT INTO admin_users (id, username, password_hash, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, password_hash, created_at, last_login_at
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("Username already exists".to_string())
            }
            _ => AppError::Database(e),
        })?;

        Ok(row.into_user())
    }

    async fn count(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admin_users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn touch_login(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE admin_users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// PostgreSQL admin session repository.
#[derive(Clone)]
pub struct PgAdminSessionRepository {
    pool: PgPool,
}

impl PgAdminSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdminSessionRepository for PgAdminSessionRepository {
    async fn create(&self, session: &AdminSession) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO admin_sessions (token_hash, admin_id, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&session.token_hash)
        .bind(session.admin_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<AdminSession>, AppError> {
        let row = sqlx::query_as::<_, AdminSessionRow>(
            r#"
            SELECT token_hash, admin_id, created_at, expires_at
            FROM admin_sessions
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_session()))
    }

    async fn delete(&self, token_hash: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM admin_sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn cleanup_expired(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM admin_sessions WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
