//! Admin Authentication Middleware
//!
//! Resolves the admin session cookie on `/api/admin/**` routes.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};

use crate::application::services::AdminAuthService;
use crate::config::AdminSettings;
use crate::domain::AdminUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Authenticated admin extension
#[derive(Debug, Clone)]
pub struct AuthAdmin {
    pub admin: AdminUser,
    /// Raw cookie token, needed to end the session on logout
    pub token: String,
}

/// Reject the request unless it carries a live admin session cookie.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = jar
        .get(&state.settings.admin.cookie_name)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Not logged in".into()))?;

    let admin = state.auth_service().authenticate(&token).await?;

    request.extensions_mut().insert(AuthAdmin { admin, token });

    Ok(next.run(request).await)
}

/// Session cookie carrying a freshly issued token.
pub fn session_cookie(settings: &AdminSettings, token: String, expires_at: DateTime<Utc>) -> Cookie<'static> {
    let max_age = (expires_at - Utc::now()).num_seconds().max(0);

    let mut cookie = Cookie::new(settings.cookie_name.clone(), token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(settings.secure_cookie);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(time::Duration::seconds(max_age));
    cookie
}

/// Cookie that clears the session in the browser.
pub fn removal_cookie(settings: &AdminSettings) -> Cookie<'static> {
    let mut cookie = Cookie::from(settings.cookie_name.clone());
    cookie.set_path("/");
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(secure: bool) -> AdminSettings {
        AdminSettings {
            cookie_name: "admin_session".into(),
            session_ttl_days: 7,
            secure_cookie: secure,
            cleanup_interval_secs: 3600,
            bootstrap_username: None,
            bootstrap_password: None,
        }
    }

    #[test]
    fn session_cookie_is_http_only_and_lax() {
        let cookie = session_cookie(
            &settings(true),
            "abc".into(),
            Utc::now() + chrono::Duration::days(7),
        );

        assert_eq!(cookie.name(), "admin_session");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        let max_age = cookie.max_age().map(|d| d.whole_days());
        assert!(matches!(max_age, Some(6) | Some(7)));
    }

    #[test]
    fn cookie_is_not_secure_outside_production() {
        let cookie = session_cookie(&settings(false), "abc".into(), Utc::now());
        assert_eq!(cookie.secure(), Some(false));
    }
}
