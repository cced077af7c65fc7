//! Donation entity and repository trait.
//!
//! Maps to the `donations` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;

/// Payment providers donations can be made through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentGateway {
    LiqPay,
    Monobank,
    WayForPay,
}

impl PaymentGateway {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "liqpay" => Some(Self::LiqPay),
            "monobank" | "mono" => Some(Self::Monobank),
            "wayforpay" => Some(Self::WayForPay),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LiqPay => "liqpay",
            Self::Monobank => "monobank",
            Self::WayForPay => "wayforpay",
        }
    }

    /// Short prefix used in generated order ids.
    pub fn order_prefix(&self) -> &'static str {
        match self {
            Self::LiqPay => "lp",
            Self::Monobank => "mb",
            Self::WayForPay => "wfp",
        }
    }
}

impl std::fmt::Display for PaymentGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Internal donation status every gateway vocabulary is mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DonationStatus {
    Success,
    Failure,
    Processing,
    Expired,
}

impl DonationStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "success" => Some(Self::Success),
            "failure" => Some(Self::Failure),
            "processing" => Some(Self::Processing),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Processing => "processing",
            Self::Expired => "expired",
        }
    }

    /// Whether the gateway will not report anything further.
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::Processing)
    }
}

impl std::fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A payment attempt.
///
/// Maps to the `donations` table:
/// - id: UUID PRIMARY KEY
/// - order_id: VARCHAR(64) UNIQUE NOT NULL (our reference sent to the gateway)
/// - gateway: VARCHAR(16) NOT NULL
/// - amount_minor: BIGINT NOT NULL
/// - currency: CHAR(3) NOT NULL
/// - status: VARCHAR(16) NOT NULL
/// - gateway_invoice_id: VARCHAR(128) NULL (the gateway's own id)
/// - gateway_payload: JSONB NULL (last raw callback)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Donation {
    pub id: Uuid,
    pub order_id: String,
    pub gateway: PaymentGateway,
    pub amount_minor: i64,
    pub currency: String,
    pub status: DonationStatus,
    pub donor_name: Option<String>,
    pub donor_email: Option<String>,
    pub comment: Option<String>,
    pub gateway_invoice_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_payload: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Filters for the admin donation list.
#[derive(Debug, Clone, Default)]
pub struct DonationFilter {
    pub status: Option<DonationStatus>,
    pub gateway: Option<PaymentGateway>,
    pub limit: i64,
    pub offset: i64,
}

/// Count and sum of donations sharing a status and currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DonationTotals {
    pub status: DonationStatus,
    pub currency: String,
    pub count: i64,
    pub amount_minor: i64,
}

/// Status change reported by a gateway, ready to be written.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub status: DonationStatus,
    pub gateway_invoice_id: Option<String>,
    pub payload: serde_json::Value,
}

/// Repository trait for Donation data access.
#[async_trait]
pub trait DonationRepository: Send + Sync {
    /// Insert a new donation.
    async fn create(&self, donation: &Donation) -> Result<Donation, AppError>;

    /// Find by our order id.
    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Donation>, AppError>;

    /// Find by the gateway's invoice/payment id.
    async fn find_by_invoice_id(
        &self,
        gateway: PaymentGateway,
        invoice_id: &str,
    ) -> Result<Option<Donation>, AppError>;

    /// Remember the gateway invoice id right after checkout creation.
    async fn set_invoice_id(&self, id: Uuid, invoice_id: &str) -> Result<(), AppError>;

    /// Overwrite status, invoice id (when known) and raw payload.
    async fn apply_status(&self, id: Uuid, update: &StatusUpdate) -> Result<Donation, AppError>;

    /// List donations, newest first.
    async fn list(&self, filter: &DonationFilter) -> Result<Vec<Donation>, AppError>;

    /// Totals grouped by status and currency.
    async fn totals(&self) -> Result<Vec<DonationTotals>, AppError>;
}
