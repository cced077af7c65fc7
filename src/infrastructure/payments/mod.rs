//! Payment Gateway Adapters
//!
//! Each gateway speaks its own dialect: how a checkout is started, how the
//! callback is signed and what its status words mean. The adapters hide
//! that behind [`PaymentProvider`], so the payment service only ever sees
//! a [`GatewayNotification`] carrying the internal [`DonationStatus`].
//!
//! Adapters are always constructed, even without credentials; an
//! unconfigured adapter answers every call with
//! [`GatewayError::NotConfigured`].

pub mod liqpay;
pub mod monobank;
pub mod wayforpay;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::PaymentSettings;
use crate::domain::{Amount, Currency, DonationStatus, PaymentGateway};

pub use liqpay::LiqPayProvider;
pub use monobank::MonobankProvider;
pub use wayforpay::WayForPayProvider;

/// Timeout for outbound calls to gateway APIs.
pub const GATEWAY_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("{0} is not configured")]
    NotConfigured(PaymentGateway),

    #[error("callback signature is missing or invalid")]
    InvalidSignature,

    #[error("malformed callback: {0}")]
    Malformed(String),

    #[error("gateway request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("gateway rejected the request: {0}")]
    Rejected(String),
}

/// Data a checkout is created from.
#[derive(Debug, Clone)]
pub struct CheckoutRequest<'a> {
    pub order_id: &'a str,
    pub amount: Amount,
    pub currency: Currency,
    pub description: &'a str,
    pub created_at: DateTime<Utc>,
}

/// Where the donor continues to pay.
#[derive(Debug, Clone, Serialize)]
pub struct Checkout {
    pub checkout_url: String,

    /// Fields to POST to `checkout_url`; empty for a plain redirect
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub form_fields: BTreeMap<String, String>,

    /// Gateway's own id, when it hands one out at creation time
    #[serde(skip)]
    pub invoice_id: Option<String>,
}

/// Raw callback as received over HTTP.
#[derive(Debug, Clone, Copy)]
pub struct CallbackRequest<'a> {
    pub body: &'a [u8],

    /// Signature transported in a header (Monobank `X-Sign`)
    pub signature: Option<&'a str>,
}

/// A verified callback, normalised.
#[derive(Debug, Clone)]
pub struct GatewayNotification {
    pub order_id: Option<String>,
    pub invoice_id: Option<String>,
    /// Status word exactly as the gateway sent it
    pub gateway_status: String,
    pub status: DonationStatus,
    /// Decoded callback body, stored on the donation
    pub payload: serde_json::Value,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    fn gateway(&self) -> PaymentGateway;

    async fn create_checkout(&self, request: &CheckoutRequest<'_>) -> Result<Checkout, GatewayError>;

    /// Check the signature and decode the callback.
    fn verify_callback(&self, request: CallbackRequest<'_>) -> Result<GatewayNotification, GatewayError>;

    /// Body the gateway expects in reply to a callback, if any.
    fn acknowledge(&self, _notification: &GatewayNotification) -> Option<serde_json::Value> {
        None
    }
}

/// One adapter per gateway.
#[derive(Clone)]
pub struct PaymentProviders {
    liqpay: Arc<dyn PaymentProvider>,
    monobank: Arc<dyn PaymentProvider>,
    wayforpay: Arc<dyn PaymentProvider>,
}

impl PaymentProviders {
    pub fn new(
        liqpay: Arc<dyn PaymentProvider>,
        monobank: Arc<dyn PaymentProvider>,
        wayforpay: Arc<dyn PaymentProvider>,
    ) -> Self {
        Self {
            liqpay,
            monobank,
            wayforpay,
        }
    }

    pub fn from_settings(settings: &PaymentSettings, http: reqwest::Client) -> Self {
        Self::new(
            Arc::new(LiqPayProvider::new(settings)),
            Arc::new(MonobankProvider::new(settings, http)),
            Arc::new(WayForPayProvider::new(settings)),
        )
    }

    pub fn get(&self, gateway: PaymentGateway) -> Arc<dyn PaymentProvider> {
        match gateway {
            PaymentGateway::LiqPay => self.liqpay.clone(),
            PaymentGateway::Monobank => self.monobank.clone(),
            PaymentGateway::WayForPay => self.wayforpay.clone(),
        }
    }
}

/// Compare two byte strings in constant time.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Render a JSON scalar the way gateways put it into signature strings.
///
/// Whole floats lose their fraction (`100.00` renders as `100`), as in the
/// gateways' own PHP and JS signers.
pub(crate) fn scalar_to_string(value: Option<&serde_json::Value>) -> String {
    match value {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Number(n)) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{f:.0}"),
            _ => n.to_string(),
        },
        Some(serde_json::Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Like [`scalar_to_string`], but `None` for absent or empty values.
pub(crate) fn non_empty_scalar(value: Option<&serde_json::Value>) -> Option<String> {
    Some(scalar_to_string(value)).filter(|s| !s.is_empty())
}
