//! Response DTOs
//!
//! Data structures for API response bodies.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{AdminUser, Donation, DonationStatus, PaymentGateway};

/// Success envelope: `{"success": true, "data": ..., "warning": ...}`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    /// Set when an optional dependency was unavailable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            warning: None,
        }
    }

    pub fn with_warning(data: T, warning: Option<String>) -> Self {
        Self {
            success: true,
            data,
            warning,
        }
    }
}

/// Plain acknowledgement for writes with nothing to return
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Admin account as shown to the panel
#[derive(Debug, Serialize)]
pub struct AdminResponse {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<AdminUser> for AdminResponse {
    fn from(admin: AdminUser) -> Self {
        Self {
            id: admin.id,
            username: admin.username,
            created_at: admin.created_at,
            last_login_at: admin.last_login_at,
        }
    }
}

/// Login result; the token itself travels only in the cookie
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub admin: AdminResponse,
    pub expires_at: DateTime<Utc>,
}

/// Created row id
#[derive(Debug, Serialize)]
pub struct IdResponse {
    pub id: Uuid,
}

/// Public view of a donation; donor details stay in the admin panel
#[derive(Debug, Serialize)]
pub struct DonationStatusResponse {
    pub order_id: String,
    pub gateway: PaymentGateway,
    pub status: DonationStatus,
    pub amount_minor: i64,
    pub currency: String,
    pub updated_at: DateTime<Utc>,
}

impl From<Donation> for DonationStatusResponse {
    fn from(donation: Donation) -> Self {
        Self {
            order_id: donation.order_id,
            gateway: donation.gateway,
            status: donation.status,
            amount_minor: donation.amount_minor,
            currency: donation.currency,
            updated_at: donation.updated_at,
        }
    }
}

/// Body of every payment callback reply
#[derive(Debug, Serialize)]
pub struct CallbackResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
