//! Payment Callback Tests
//!
//! Gateways retry anything but 200, so rejected callbacks still answer 200
//! with `success: false`.

use axum::http::StatusCode;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use pretty_assertions::assert_eq;
use serde_json::json;

use rehab_center::infrastructure::payments::liqpay;

use crate::common::{json_body, test_settings, TestApp};

async fn app_with_liqpay() -> TestApp {
    let mut settings = test_settings();
    settings.payments.liqpay.public_key = Some("sandbox_i000000".into());
    settings.payments.liqpay.private_key = Some("sandbox_secret".into());
    TestApp::with_settings(settings).await
}

#[tokio::test]
async fn liqpay_bad_signature_answers_ok_with_failure() {
    let app = app_with_liqpay().await;

    let response = app
        .post_raw(
            "/api/payments/liqpay/callback",
            "application/x-www-form-urlencoded",
            "data=eyJzdGF0dXMiOiJzdWNjZXNzIn0%3D&signature=forged",
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("signature"));
}

/// The test database is unreachable, so a correctly signed callback fails
/// while looking up the donation.
#[tokio::test]
async fn signed_callback_hides_storage_failures() {
    let app = app_with_liqpay().await;
    let data = STANDARD.encode(
        json!({
            "order_id": "lp-0190a4c46f0e7cc29a3e1d2b3c4d5e6f",
            "payment_id": 2_431_234_567u64,
            "status": "success",
            "amount": 250,
            "currency": "UAH"
        })
        .to_string(),
    );
    let signature = liqpay::sign("sandbox_secret", &data);
    let body = serde_urlencoded::to_string([("data", data), ("signature", signature)]).unwrap();

    let response = app
        .post_raw(
            "/api/payments/liqpay/callback",
            "application/x-www-form-urlencoded",
            &body,
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Internal server error");
}

#[tokio::test]
async fn liqpay_missing_fields_answers_ok_with_failure() {
    let app = app_with_liqpay().await;

    let response = app
        .post_raw(
            "/api/payments/liqpay/callback",
            "application/x-www-form-urlencoded",
            "foo=bar",
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["success"], false);
}

#[tokio::test]
async fn unconfigured_gateway_answers_ok_with_failure() {
    let app = TestApp::new().await;

    let response = app
        .post_json(
            "/api/payments/wayforpay/callback",
            json!({ "orderReference": "wfp-1", "transactionStatus": "Approved" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["success"], false);
}

#[tokio::test]
async fn monobank_without_signature_answers_ok_with_failure() {
    let app = TestApp::new().await;

    let response = app
        .post_json(
            "/api/payments/monobank/callback",
            json!({ "invoiceId": "p2_9ZgpZVsl3", "status": "success" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["success"], false);
}
