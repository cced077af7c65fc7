//! Route Configuration
//!
//! Configures all HTTP routes for the API.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    response::IntoResponse,
    routing::{delete, get, patch, post, put},
    Router,
};

use super::handlers;
use crate::infrastructure::metrics;
use crate::presentation::middleware::{
    admin_auth_middleware, create_security_headers_layer, rate_limit_forms, rate_limit_login,
    track_metrics,
};
use crate::presentation::websocket::chat_stream;
use crate::startup::AppState;

/// Multipart framing around an uploaded file.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    let is_production = state.settings.is_production();

    Router::new()
        .nest("/api", api_routes(state.clone()))
        // Health check endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn(track_metrics))
        // Outermost, so every response gets the headers
        .layer(create_security_headers_layer(is_production))
        .with_state(state)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    let metrics = metrics::gather_metrics();
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    )
}

/// `/api` routes
fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(public_routes())
        .merge(public_write_routes(state.clone()))
        .route("/payments/liqpay/callback", post(handlers::payments::liqpay_callback))
        .route("/payments/monobank/callback", post(handlers::payments::monobank_callback))
        .route("/payments/wayforpay/callback", post(handlers::payments::wayforpay_callback))
        .nest("/admin", admin_routes(state))
}

/// Public reads
fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/chat/sessions/{id}", get(handlers::chat::session_status))
        .route("/chat/sessions/{id}/messages", get(handlers::chat::list_messages))
        .route("/chat/sessions/{id}/ws", get(chat_stream))
        .route("/donations/{order_id}", get(handlers::donations::donation_status))
        .route("/translations", get(handlers::content::translations))
        .route("/media", get(handlers::content::list_media))
        .route("/homepage", get(handlers::content::homepage))
        .route("/services", get(handlers::catalog::list_services))
        .route("/reports", get(handlers::reports::report))
        .route("/instagram", get(handlers::instagram::feed))
}

/// Public writes (rate limited)
fn public_write_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/submissions", post(handlers::submissions::create_submission))
        .route("/chat/sessions", post(handlers::chat::open_session))
        .route("/chat/sessions/{id}/messages", post(handlers::chat::send_visitor_message))
        .route("/donations", post(handlers::donations::create_donation))
        .route_layer(middleware::from_fn_with_state(state, rate_limit_forms))
}

/// `/api/admin` routes; everything but login requires the session cookie
fn admin_routes(state: AppState) -> Router<AppState> {
    let upload_limit = state.settings.media.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    let login = Router::new()
        .route("/login", post(handlers::admin::login))
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit_login));

    let protected = Router::new()
        .route("/logout", post(handlers::admin::logout))
        .route("/me", get(handlers::admin::me))
        // Submissions
        .route("/submissions", get(handlers::submissions::list_submissions))
        .route(
            "/submissions/{id}",
            patch(handlers::submissions::update_submission)
                .delete(handlers::submissions::delete_submission),
        )
        // Chat
        .route("/chat/sessions", get(handlers::chat::list_sessions))
        .route("/chat/sessions/{id}/messages", post(handlers::chat::send_operator_message))
        .route("/chat/sessions/{id}/close", post(handlers::chat::close_session))
        // Donations
        .route("/donations", get(handlers::donations::list_donations))
        .route("/donations/stats", get(handlers::donations::donation_stats))
        // Content
        .route("/translations", get(handlers::content::list_texts))
        .route(
            "/translations/{key}",
            put(handlers::content::upsert_text).delete(handlers::content::delete_text),
        )
        .route(
            "/media",
            post(handlers::content::upload_media).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/media/{*key}", delete(handlers::content::delete_media))
        .route("/homepage", post(handlers::content::create_homepage_item))
        .route(
            "/homepage/{id}",
            put(handlers::content::update_homepage_item)
                .delete(handlers::content::delete_homepage_item),
        )
        // Services catalog
        .route(
            "/services",
            get(handlers::catalog::list_all_services).post(handlers::catalog::create_service),
        )
        .route(
            "/services/{id}",
            put(handlers::catalog::update_service).delete(handlers::catalog::delete_service),
        )
        .route("/services/{id}/options", post(handlers::catalog::create_option))
        .route(
            "/service-options/{id}",
            put(handlers::catalog::update_option).delete(handlers::catalog::delete_option),
        )
        // Reports
        .route("/reports/items", post(handlers::reports::create_item))
        .route(
            "/reports/items/{id}",
            put(handlers::reports::update_item).delete(handlers::reports::delete_item),
        )
        .route("/reports/settings/{key}", put(handlers::reports::upsert_setting))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware));

    login.merge(protected)
}
