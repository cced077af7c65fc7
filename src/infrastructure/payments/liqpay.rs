//! LiqPay checkout and callback handling.
//!
//! Both directions use the same envelope: `data` is base64-encoded JSON and
//! `signature = base64(sha1(private_key + data + private_key))`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::json;
use sha1::{Digest, Sha1};

use super::{
    constant_time_eq, non_empty_scalar, scalar_to_string, CallbackRequest, Checkout,
    CheckoutRequest, GatewayError, GatewayNotification, PaymentProvider,
};
use crate::config::PaymentSettings;
use crate::domain::{DonationStatus, PaymentGateway};

pub struct LiqPayProvider {
    public_key: Option<String>,
    private_key: Option<String>,
    checkout_url: String,
    sandbox: bool,
    server_url: String,
    result_url: String,
}

#[derive(Debug, Deserialize)]
struct CallbackForm {
    data: String,
    signature: String,
}

impl LiqPayProvider {
    pub fn new(settings: &PaymentSettings) -> Self {
        Self {
            public_key: settings.liqpay.public_key.clone(),
            private_key: settings.liqpay.private_key.clone(),
            checkout_url: settings.liqpay.checkout_url.clone(),
            sandbox: settings.liqpay.sandbox,
            server_url: settings.public_url("/api/payments/liqpay/callback"),
            result_url: settings.public_url("/donate/thank-you"),
        }
    }

    fn keys(&self) -> Result<(&str, &str), GatewayError> {
        match (&self.public_key, &self.private_key) {
            (Some(public), Some(private)) => Ok((public, private)),
            _ => Err(GatewayError::NotConfigured(PaymentGateway::LiqPay)),
        }
    }
}

/// `base64(sha1(private_key + data + private_key))`
pub fn sign(private_key: &str, data: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(private_key.as_bytes());
    hasher.update(data.as_bytes());
    hasher.update(private_key.as_bytes());
    STANDARD.encode(hasher.finalize())
}

/// Map a LiqPay `status` onto the internal status.
pub fn map_status(status: &str) -> DonationStatus {
    match status {
        "success" | "sandbox" => DonationStatus::Success,
        "failure" | "error" | "reversed" => DonationStatus::Failure,
        "expired" => DonationStatus::Expired,
        _ => DonationStatus::Processing,
    }
}

#[async_trait]
impl PaymentProvider for LiqPayProvider {
    fn gateway(&self) -> PaymentGateway {
        PaymentGateway::LiqPay
    }

    async fn create_checkout(&self, request: &CheckoutRequest<'_>) -> Result<Checkout, GatewayError> {
        let (public_key, private_key) = self.keys()?;

        let mut params = json!({
            "version": 3,
            "public_key": public_key,
            "action": "pay",
            "amount": request.amount.minor() as f64 / 100.0,
            "currency": request.currency.as_str(),
            "description": request.description,
            "order_id": request.order_id,
            "server_url": self.server_url,
            "result_url": format!("{}?order_id={}", self.result_url, request.order_id),
        });
        if self.sandbox {
            params["sandbox"] = json!(1);
        }

        let data = STANDARD.encode(params.to_string());
        let signature = sign(private_key, &data);

        Ok(Checkout {
            checkout_url: self.checkout_url.clone(),
            form_fields: BTreeMap::from([
                ("data".to_string(), data),
                ("signature".to_string(), signature),
            ]),
            invoice_id: None,
        })
    }

    fn verify_callback(&self, request: CallbackRequest<'_>) -> Result<GatewayNotification, GatewayError> {
        let (_, private_key) = self.keys()?;

        let form: CallbackForm = serde_urlencoded::from_bytes(request.body)
            .map_err(|e| GatewayError::Malformed(format!("expected data and signature: {e}")))?;

        let expected = sign(private_key, &form.data);
        if !constant_time_eq(expected.as_bytes(), form.signature.as_bytes()) {
            return Err(GatewayError::InvalidSignature);
        }

        let decoded = STANDARD
            .decode(form.data.as_bytes())
            .map_err(|e| GatewayError::Malformed(format!("data is not base64: {e}")))?;
        let payload: serde_json::Value = serde_json::from_slice(&decoded)
            .map_err(|e| GatewayError::Malformed(format!("data is not JSON: {e}")))?;

        let gateway_status = scalar_to_string(payload.get("status"));

        Ok(GatewayNotification {
            order_id: non_empty_scalar(payload.get("order_id")),
            invoice_id: non_empty_scalar(payload.get("payment_id")),
            status: map_status(&gateway_status),
            gateway_status,
            payload,
        })
    }
}
