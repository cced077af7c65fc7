//! Admin API Tests
//!
//! Everything under `/api/admin` except login sits behind the session cookie.

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;
use test_case::test_case;

use crate::common::{assert_error_envelope, json_body, TestApp};

#[test_case("/api/admin/me" ; "current admin")]
#[test_case("/api/admin/submissions" ; "submissions")]
#[test_case("/api/admin/chat/sessions" ; "chat sessions")]
#[test_case("/api/admin/donations" ; "donations")]
#[test_case("/api/admin/donations/stats" ; "donation stats")]
#[test_case("/api/admin/translations" ; "translations")]
#[test_case("/api/admin/services" ; "services")]
#[tokio::test]
async fn admin_routes_require_a_session(uri: &str) {
    let app = TestApp::new().await;

    let response = app.get(uri).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_error_envelope(&json_body(response).await);
}

#[tokio::test]
async fn admin_responses_are_not_cached() {
    let app = TestApp::new().await;

    let response = app.get("/api/admin/me").await;

    assert_eq!(response.headers()["cache-control"], "no-store");
}

#[tokio::test]
async fn empty_cookie_is_rejected() {
    let app = TestApp::new().await;

    let response = app.get_with_cookie("/api/admin/me", "admin_session=").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_requires_a_session() {
    let app = TestApp::new().await;

    let response = app.post_json("/api/admin/logout", json!({})).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_validates_credentials_shape() {
    let app = TestApp::new().await;

    let response = app
        .post_json("/api/admin/login", json!({ "username": "", "password": "" }))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_error_envelope(&json_body(response).await);
}
