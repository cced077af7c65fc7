//! Public API Tests
//!
//! Validation and degraded-mode behavior that answers without a database.

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{assert_error_envelope, json_body, TestApp};

#[tokio::test]
async fn submission_with_empty_name_is_rejected() {
    let app = TestApp::new().await;

    let response = app
        .post_json(
            "/api/submissions",
            json!({ "form_type": "contact", "name": "", "phone": "+380501234567" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_error_envelope(&json_body(response).await);
}

#[tokio::test]
async fn submission_with_blank_name_is_rejected() {
    let app = TestApp::new().await;

    let response = app
        .post_json(
            "/api/submissions",
            json!({ "form_type": "contact", "name": "   ", "phone": "+380501234567" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_error_envelope(&json_body(response).await);
}

#[tokio::test]
async fn chat_with_blank_name_is_rejected() {
    let app = TestApp::new().await;

    let response = app
        .post_json(
            "/api/chat/sessions",
            json!({ "name": "   ", "phone": "+380501234567" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_error_envelope(&json_body(response).await);
}

#[tokio::test]
async fn submission_with_unknown_form_type_is_rejected() {
    let app = TestApp::new().await;

    let response = app
        .post_json(
            "/api/submissions",
            json!({ "form_type": "newsletter", "name": "Olena" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("newsletter"));
}

#[tokio::test]
async fn malformed_json_uses_the_error_envelope() {
    let app = TestApp::new().await;

    let response = app
        .post_raw("/api/submissions", "application/json", "{not json")
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_error_envelope(&json_body(response).await);
}

#[tokio::test]
async fn chat_requires_a_valid_phone() {
    let app = TestApp::new().await;

    let response = app
        .post_json(
            "/api/chat/sessions",
            json!({ "name": "Andrii", "phone": "call me maybe" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_error_envelope(&json_body(response).await);
}

#[tokio::test]
async fn empty_chat_message_is_rejected() {
    let app = TestApp::new().await;

    let response = app
        .post_json(
            "/api/chat/sessions/0190a4c4-6f0e-7cc2-9a3e-1d2b3c4d5e6f/messages",
            json!({ "content": "" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn donation_amount_must_be_positive() {
    let app = TestApp::new().await;

    let response = app
        .post_json("/api/donations", json!({ "amount": 0, "gateway": "liqpay" }))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_error_envelope(&json_body(response).await);
}

#[tokio::test]
async fn donation_gateway_must_be_known() {
    let app = TestApp::new().await;

    let response = app
        .post_json("/api/donations", json!({ "amount": 100, "gateway": "paypal" }))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("paypal"));
}

#[tokio::test]
async fn unconfigured_instagram_feed_is_empty_with_warning() {
    let app = TestApp::new().await;

    let response = app.get("/api/instagram?limit=6").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"], json!([]));
    assert_eq!(body["warning"], "Instagram feed is not configured");
}

#[tokio::test]
async fn chat_stream_requires_a_websocket_upgrade() {
    let app = TestApp::new().await;

    let response = app
        .get("/api/chat/sessions/0190a4c4-6f0e-7cc2-9a3e-1d2b3c4d5e6f/ws")
        .await;

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let app = TestApp::new().await;

    let response = app.get("/api/nope").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
