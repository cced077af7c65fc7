//! Admin Authentication Service
//!
//! Cookie sessions for the admin panel. The browser holds a random token;
//! the database only ever sees its SHA-256 hash.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::{AdminSession, AdminSessionRepository, AdminUser, AdminUserRepository};
use crate::shared::error::AppError;

/// Admin authentication service trait
#[async_trait]
pub trait AdminAuthService: Send + Sync {
    /// Check credentials and open a session.
    async fn login(&self, username: &str, password: &str) -> Result<AdminLogin, AuthError>;

    /// Forget a session token. Unknown tokens are ignored.
    async fn logout(&self, token: &str) -> Result<(), AuthError>;

    /// Resolve a session token to its admin.
    async fn authenticate(&self, token: &str) -> Result<AdminUser, AuthError>;

    /// Create the first admin when none exists yet.
    async fn bootstrap(&self, username: &str, password: &str) -> Result<Option<AdminUser>, AuthError>;

    /// Purge expired sessions.
    async fn cleanup_expired(&self) -> Result<u64, AuthError>;
}

/// A successful login
#[derive(Debug, Clone)]
pub struct AdminLogin {
    pub admin: AdminUser,
    /// Raw cookie value, handed to the browser once
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Admin authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Not logged in")]
    SessionInvalid,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Repository(#[from] AppError),
}

impl From<AuthError> for AppError {
    fn from(error: AuthError) -> Self {
        match error {
            e @ (AuthError::InvalidCredentials | AuthError::SessionInvalid) => {
                AppError::Unauthorized(e.to_string())
            }
            AuthError::Internal(msg) => AppError::Internal(msg),
            AuthError::Repository(e) => e,
        }
    }
}

/// SHA-256 hex digest of a session token.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// 256 random bits, hex encoded.
pub fn generate_token() -> String {
    hex::encode(rand::random::<[u8; 32]>())
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Internal(format!("Password hashing failed: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AuthError::Internal(format!("Invalid password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// AdminAuthService implementation
pub struct AdminAuthServiceImpl<U, S>
where
    U: AdminUserRepository,
    S: AdminSessionRepository,
{
    user_repo: Arc<U>,
    session_repo: Arc<S>,
    session_ttl: Duration,
}

impl<U, S> AdminAuthServiceImpl<U, S>
where
    U: AdminUserRepository,
    S: AdminSessionRepository,
{
    pub fn new(user_repo: Arc<U>, session_repo: Arc<S>, session_ttl_days: i64) -> Self {
        Self {
            user_repo,
            session_repo,
            session_ttl: Duration::days(session_ttl_days),
        }
    }
}

#[async_trait]
impl<U, S> AdminAuthService for AdminAuthServiceImpl<U, S>
where
    U: AdminUserRepository + 'static,
    S: AdminSessionRepository + 'static,
{
    #[instrument(skip(self, password))]
    async fn login(&self, username: &str, password: &str) -> Result<AdminLogin, AuthError> {
        let Some(admin) = self.user_repo.find_by_username(username.trim()).await? else {
            // Equalize timing with the known-user path.
            let _ = hash_password(password);
            warn!("Login attempt for unknown admin");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &admin.password_hash)? {
            warn!(admin_id = %admin.id, "Login attempt with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = generate_token();
        let now = Utc::now();
        let session = AdminSession {
            token_hash: hash_token(&token),
            admin_id: admin.id,
            created_at: now,
            expires_at: now + self.session_ttl,
        };
        self.session_repo.create(&session).await?;
        self.user_repo.touch_login(admin.id).await?;

        info!(admin_id = %admin.id, "Admin logged in");
        Ok(AdminLogin {
            admin,
            token,
            expires_at: session.expires_at,
        })
    }

    async fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.session_repo.delete(&hash_token(token)).await?;
        Ok(())
    }

    async fn authenticate(&self, token: &str) -> Result<AdminUser, AuthError> {
        let session = self
            .session_repo
            .find_by_token_hash(&hash_token(token))
            .await?
            .ok_or(AuthError::SessionInvalid)?;

        if session.is_expired() {
            self.session_repo.delete(&session.token_hash).await?;
            return Err(AuthError::SessionInvalid);
        }

        self.user_repo
            .find_by_id(session.admin_id)
            .await?
            .ok_or(AuthError::SessionInvalid)
    }

    #[instrument(skip(self, password))]
    async fn bootstrap(&self, username: &str, password: &str) -> Result<Option<AdminUser>, AuthError> {
        if self.user_repo.count().await? > 0 {
            return Ok(None);
        }

        let admin = AdminUser {
            id: Uuid::now_v7(),
            username: username.trim().to_string(),
            password_hash: hash_password(password)?,
            created_at: Utc::now(),
            last_login_at: None,
        };
        let admin = self.user_repo.create(&admin).await?;
        info!(admin_id = %admin.id, username = %admin.username, "Bootstrap admin created");
        Ok(Some(admin))
    }

    async fn cleanup_expired(&self) -> Result<u64, AuthError> {
        Ok(self.session_repo.cleanup_expired().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryAdmins {
        users: Mutex<Vec<AdminUser>>,
    }

    #[async_trait]
    impl AdminUserRepository for MemoryAdmins {
        async fn find_by_id(&self, id: Uuid) -> Result<Option<AdminUser>, AppError> {
            Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
        }

        async fn find_by_username(&self, username: &str) -> Result<Option<AdminUser>, AppError> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.username.eq_ignore_ascii_case(username))
                .cloned())
        }

        async fn create(&self, user: &AdminUser) -> Result<AdminUser, AppError> {
            self.users.lock().unwrap().push(user.clone());
            Ok(user.clone())
        }

        async fn count(&self) -> Result<i64, AppError> {
            Ok(self.users.lock().unwrap().len() as i64)
        }

        async fn touch_login(&self, id: Uuid) -> Result<(), AppError> {
            if let Some(u) = self.users.lock().unwrap().iter_mut().find(|u| u.id == id) {
                u.last_login_at = Some(Utc::now());
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemorySessions {
        sessions: Mutex<Vec<AdminSession>>,
    }

    #[async_trait]
    impl AdminSessionRepository for MemorySessions {
        async fn create(&self, session: &AdminSession) -> Result<(), AppError> {
            self.sessions.lock().unwrap().push(session.clone());
            Ok(())
        }

        async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<AdminSession>, AppError> {
            Ok(self
                .sessions
                .lock()
                .unwrap()
                .iter()
                .find(|s| s.token_hash == token_hash)
                .cloned())
        }

        async fn delete(&self, token_hash: &str) -> Result<(), AppError> {
            self.sessions.lock().unwrap().retain(|s| s.token_hash != token_hash);
            Ok(())
        }

        async fn cleanup_expired(&self) -> Result<u64, AppError> {
            let mut sessions = self.sessions.lock().unwrap();
            let before = sessions.len();
            sessions.retain(|s| !s.is_expired());
            Ok((before - sessions.len()) as u64)
        }
    }

    type Service = AdminAuthServiceImpl<MemoryAdmins, MemorySessions>;

    async fn service_with_admin() -> (Service, Arc<MemorySessions>) {
        let sessions = Arc::new(MemorySessions::default());
        let service = AdminAuthServiceImpl::new(Arc::new(MemoryAdmins::default()), sessions.clone(), 7);
        service.bootstrap("admin", "correct horse").await.unwrap();
        (service, sessions)
    }

    #[test]
    fn token_hash_is_sha256_hex() {
        assert_eq!(
            hash_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(generate_token().len(), 64);
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn password_round_trip() {
        let hash = hash_password("s3cret-pass").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3cret-pass", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[tokio::test]
    async fn login_stores_only_the_token_hash() {
        let (service, sessions) = service_with_admin().await;

        let login = service.login("Admin", "correct horse").await.unwrap();

        let stored = sessions.sessions.lock().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].token_hash, hash_token(&login.token));
        assert_ne!(stored[0].token_hash, login.token);
        assert!(login.expires_at > Utc::now() + Duration::days(6));
    }

    #[tokio::test]
    async fn wrong_credentials_are_rejected() {
        let (service, _) = service_with_admin().await;

        assert!(matches!(
            service.login("admin", "battery staple").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            service.login("nobody", "correct horse").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn session_token_authenticates_until_logout() {
        let (service, _) = service_with_admin().await;
        let login = service.login("admin", "correct horse").await.unwrap();

        let admin = service.authenticate(&login.token).await.unwrap();
        assert_eq!(admin.username, "admin");

        service.logout(&login.token).await.unwrap();
        assert!(matches!(
            service.authenticate(&login.token).await,
            Err(AuthError::SessionInvalid)
        ));
    }

    #[tokio::test]
    async fn expired_sessions_are_rejected_and_purged() {
        let (service, sessions) = service_with_admin().await;
        let login = service.login("admin", "correct horse").await.unwrap();
        sessions.sessions.lock().unwrap()[0].expires_at = Utc::now() - Duration::minutes(1);

        assert!(matches!(
            service.authenticate(&login.token).await,
            Err(AuthError::SessionInvalid)
        ));
        assert!(sessions.sessions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cleanup_removes_only_expired_sessions() {
        let (service, sessions) = service_with_admin().await;
        service.login("admin", "correct horse").await.unwrap();
        service.login("admin", "correct horse").await.unwrap();
        sessions.sessions.lock().unwrap()[0].expires_at = Utc::now() - Duration::minutes(1);

        assert_eq!(service.cleanup_expired().await.unwrap(), 1);
        assert_eq!(sessions.sessions.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn bootstrap_runs_only_once() {
        let (service, _) = service_with_admin().await;
        assert!(service.bootstrap("second", "whatever").await.unwrap().is_none());
    }
}
