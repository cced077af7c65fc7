//! Admin Authentication Handlers

use axum::{extract::State, Extension, Json};
use axum_extra::extract::cookie::CookieJar;

use crate::application::dto::request::AdminLoginRequest;
use crate::application::dto::response::{AdminResponse, ApiResponse, LoginResponse, MessageResponse};
use crate::application::services::AdminAuthService;
use crate::presentation::http::extractors::ValidatedJson;
use crate::presentation::middleware::auth::{removal_cookie, session_cookie, AuthAdmin};
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Log in and set the session cookie
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(body): ValidatedJson<AdminLoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<LoginResponse>>), AppError> {
    let login = state
        .auth_service()
        .login(body.username.trim(), &body.password)
        .await?;

    let cookie = session_cookie(&state.settings.admin, login.token, login.expires_at);
    let response = LoginResponse {
        admin: AdminResponse::from(login.admin),
        expires_at: login.expires_at,
    };

    Ok((jar.add(cookie), Json(ApiResponse::ok(response))))
}

/// End the current session and clear the cookie
pub async fn logout(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthAdmin>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>), AppError> {
    state.auth_service().logout(&admin.token).await?;
    tracing::info!(username = %admin.admin.username, "Admin logged out");

    let jar = jar.remove(removal_cookie(&state.settings.admin));
    Ok((jar, Json(MessageResponse::new("Logged out"))))
}

/// The logged-in admin
pub async fn me(Extension(admin): Extension<AuthAdmin>) -> Json<ApiResponse<AdminResponse>> {
    Json(ApiResponse::ok(AdminResponse::from(admin.admin)))
}
