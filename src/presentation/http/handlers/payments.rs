//! Payment Gateway Callbacks
//!
//! Gateways retry on anything but 200, so every callback is answered with
//! 200; failures are logged and reported as `success: false` in the body.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::application::dto::response::CallbackResponse;
use crate::application::services::{PaymentError, PaymentService};
use crate::domain::PaymentGateway;
use crate::infrastructure::metrics;
use crate::infrastructure::payments::{CallbackRequest, GatewayError};
use crate::startup::AppState;

/// Monobank signs the raw body and sends the signature here.
const SIGNATURE_HEADER: &str = "x-sign";

/// Shown instead of storage or upstream failures.
const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

pub async fn liqpay_callback(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    handle_callback(state, PaymentGateway::LiqPay, &headers, &body).await
}

pub async fn monobank_callback(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    handle_callback(state, PaymentGateway::Monobank, &headers, &body).await
}

pub async fn wayforpay_callback(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    handle_callback(state, PaymentGateway::WayForPay, &headers, &body).await
}

async fn handle_callback(
    state: AppState,
    gateway: PaymentGateway,
    headers: &HeaderMap,
    body: &[u8],
) -> Response {
    let request = CallbackRequest {
        body,
        signature: headers
            .get(SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok()),
    };

    match state.payment_service().handle_callback(gateway, request).await {
        Ok(outcome) => {
            metrics::record_payment_callback(gateway.as_str(), "ok");
            match outcome.acknowledgement {
                Some(ack) => (StatusCode::OK, Json(ack)).into_response(),
                None => callback_reply(None),
            }
        }
        Err(e) => {
            let label = failure_label(&e);
            tracing::warn!(%gateway, outcome = label, error = %e, "Payment callback rejected");
            metrics::record_payment_callback(gateway.as_str(), label);
            callback_reply(Some(client_message(&e)))
        }
    }
}

fn callback_reply(error: Option<String>) -> Response {
    let body = CallbackResponse {
        success: error.is_none(),
        error,
    };
    (StatusCode::OK, Json(body)).into_response()
}

/// What the gateway gets to see; storage and upstream details stay in the log.
fn client_message(error: &PaymentError) -> String {
    match error {
        PaymentError::Gateway(
            GatewayError::InvalidSignature | GatewayError::Malformed(_) | GatewayError::NotConfigured(_),
        )
        | PaymentError::UnknownOrder(_)
        | PaymentError::NotFound => error.to_string(),
        _ => INTERNAL_ERROR_MESSAGE.to_string(),
    }
}

fn failure_label(error: &PaymentError) -> &'static str {
    match error {
        PaymentError::Gateway(GatewayError::InvalidSignature) => "invalid_signature",
        PaymentError::Gateway(GatewayError::Malformed(_)) => "malformed",
        PaymentError::Gateway(GatewayError::NotConfigured(_)) => "not_configured",
        PaymentError::UnknownOrder(_) | PaymentError::NotFound => "unknown_order",
        _ => "error",
    }
}
