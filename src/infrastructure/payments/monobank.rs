//! Monobank acquiring: invoice creation and webhook verification.
//!
//! Webhooks carry an `X-Sign` header holding a base64 DER-encoded
//! ECDSA (P-256, SHA-256) signature over the raw body. The merchant public
//! key is configured as a base64-encoded PEM document, the same form the
//! `/api/merchant/pubkey` endpoint returns.

use std::collections::BTreeMap;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use p256::ecdsa::{signature::Verifier, Signature, VerifyingKey};
use p256::pkcs8::DecodePublicKey;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::{
    non_empty_scalar, scalar_to_string, CallbackRequest, Checkout, CheckoutRequest, GatewayError,
    GatewayNotification, PaymentProvider, GATEWAY_TIMEOUT,
};
use crate::config::PaymentSettings;
use crate::domain::{DonationStatus, PaymentGateway};

pub struct MonobankProvider {
    http: reqwest::Client,
    token: Option<String>,
    verifying_key: Option<VerifyingKey>,
    api_url: String,
    webhook_url: String,
    redirect_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InvoiceCreated {
    invoice_id: String,
    page_url: String,
}

impl MonobankProvider {
    pub fn new(settings: &PaymentSettings, http: reqwest::Client) -> Self {
        let verifying_key = settings
            .monobank
            .public_key
            .as_deref()
            .and_then(|key| match parse_public_key(key) {
                Ok(key) => Some(key),
                Err(e) => {
                    warn!(error = %e, "Ignoring unusable Monobank public key");
                    None
                }
            });

        Self {
            http,
            token: settings.monobank.token.clone(),
            verifying_key,
            api_url: settings.monobank.api_url.trim_end_matches('/').to_string(),
            webhook_url: settings.public_url("/api/payments/monobank/callback"),
            redirect_url: settings.public_url("/donate/thank-you"),
        }
    }
}

/// Decode a base64 PEM public key into a P-256 verifying key.
pub fn parse_public_key(encoded: &str) -> Result<VerifyingKey, GatewayError> {
    let pem = STANDARD
        .decode(encoded.trim())
        .map_err(|e| GatewayError::Malformed(format!("public key is not base64: {e}")))?;
    let pem = String::from_utf8(pem)
        .map_err(|_| GatewayError::Malformed("public key is not PEM text".into()))?;
    VerifyingKey::from_public_key_pem(&pem)
        .map_err(|e| GatewayError::Malformed(format!("public key is not a P-256 key: {e}")))
}

/// Check a base64 DER signature over `body`.
pub fn verify_signature(key: &VerifyingKey, body: &[u8], x_sign: &str) -> Result<(), GatewayError> {
    let der = STANDARD
        .decode(x_sign.trim())
        .map_err(|_| GatewayError::InvalidSignature)?;
    let signature = Signature::from_der(&der).map_err(|_| GatewayError::InvalidSignature)?;
    key.verify(body, &signature)
        .map_err(|_| GatewayError::InvalidSignature)
}

/// Map a Monobank invoice `status` onto the internal status.
pub fn map_status(status: &str) -> DonationStatus {
    match status {
        "success" => DonationStatus::Success,
        "failure" | "reversed" => DonationStatus::Failure,
        "expired" => DonationStatus::Expired,
        // created, processing, hold
        _ => DonationStatus::Processing,
    }
}

#[async_trait]
impl PaymentProvider for MonobankProvider {
    fn gateway(&self) -> PaymentGateway {
        PaymentGateway::Monobank
    }

    async fn create_checkout(&self, request: &CheckoutRequest<'_>) -> Result<Checkout, GatewayError> {
        let token = self
            .token
            .as_deref()
            .ok_or(GatewayError::NotConfigured(PaymentGateway::Monobank))?;

        let body = json!({
            "amount": request.amount.minor(),
            "ccy": request.currency.iso_numeric(),
            "merchantPaymInfo": {
                "reference": request.order_id,
                "destination": request.description,
            },
            "redirectUrl": format!("{}?order_id={}", self.redirect_url, request.order_id),
            "webHookUrl": self.webhook_url,
        });

        let response = self
            .http
            .post(format!("{}/api/merchant/invoice/create", self.api_url))
            .header("X-Token", token)
            .timeout(GATEWAY_TIMEOUT)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected(format!("HTTP {}: {}", status.as_u16(), text)));
        }

        let created: InvoiceCreated = response.json().await?;
        debug!(order_id = request.order_id, invoice_id = %created.invoice_id, "Monobank invoice created");

        Ok(Checkout {
            checkout_url: created.page_url,
            form_fields: BTreeMap::new(),
            invoice_id: Some(created.invoice_id),
        })
    }

    fn verify_callback(&self, request: CallbackRequest<'_>) -> Result<GatewayNotification, GatewayError> {
        let key = self
            .verifying_key
            .as_ref()
            .ok_or(GatewayError::NotConfigured(PaymentGateway::Monobank))?;
        let x_sign = request.signature.ok_or(GatewayError::InvalidSignature)?;

        verify_signature(key, request.body, x_sign)?;

        let payload: serde_json::Value = serde_json::from_slice(request.body)
            .map_err(|e| GatewayError::Malformed(format!("body is not JSON: {e}")))?;
        let gateway_status = scalar_to_string(payload.get("status"));

        Ok(GatewayNotification {
            order_id: non_empty_scalar(payload.get("reference")),
            invoice_id: non_empty_scalar(payload.get("invoiceId")),
            status: map_status(&gateway_status),
            gateway_status,
            payload,
        })
    }
}
