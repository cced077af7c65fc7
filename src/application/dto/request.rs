//! Request DTOs
//!
//! Data structures for API request bodies and query strings.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

use crate::domain::LocalizedText;
use crate::shared::validation::validate_phone;

/// Admin login request
#[derive(Debug, Deserialize, Validate)]
pub struct AdminLoginRequest {
    #[validate(length(min = 1, max = 64, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, max = 256, message = "Password is required"))]
    pub password: String,
}

/// Start a chat
#[derive(Debug, Deserialize, Validate)]
pub struct OpenChatRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(
        length(min = 5, max = 32, message = "Phone must be 5-32 characters"),
        custom(function = "validate_phone")
    )]
    pub phone: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(max = 2000, message = "Message must be at most 2000 characters"))]
    pub message: Option<String>,
}

/// Send a chat message
#[derive(Debug, Deserialize, Validate)]
pub struct SendChatMessageRequest {
    #[validate(length(min = 1, max = 2000, message = "Message must be 1-2000 characters"))]
    pub content: String,
}

/// Chat history query
#[derive(Debug, Default, Deserialize)]
pub struct ChatMessagesQuery {
    pub after: Option<DateTime<Utc>>,
}

/// Admin chat sessions query
#[derive(Debug, Default, Deserialize)]
pub struct ChatSessionsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

/// Start a donation
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDonationRequest {
    /// Major units, e.g. `250` or `99.50`
    #[validate(range(min = 0.01, max = 1_000_000.0, message = "Amount must be between 0.01 and 1000000"))]
    pub amount: f64,

    /// `UAH` when omitted
    pub currency: Option<String>,

    pub gateway: String,

    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub donor_name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub donor_email: Option<String>,

    #[validate(length(max = 1000, message = "Comment must be at most 1000 characters"))]
    pub comment: Option<String>,
}

/// Admin donation list query
#[derive(Debug, Default, Deserialize)]
pub struct DonationsQuery {
    pub status: Option<String>,
    pub gateway: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Submit a public form
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSubmissionRequest {
    pub form_type: String,

    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(
        length(min = 5, max = 32, message = "Phone must be 5-32 characters"),
        custom(function = "validate_phone")
    )]
    pub phone: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(max = 5000, message = "Message must be at most 5000 characters"))]
    pub message: Option<String>,

    /// Form-specific fields
    #[serde(default)]
    pub extra: serde_json::Value,
}

/// Admin submissions query
#[derive(Debug, Default, Deserialize)]
pub struct SubmissionsQuery {
    pub form_type: Option<String>,
    pub processed: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Toggle the processed flag
#[derive(Debug, Deserialize)]
pub struct UpdateSubmissionRequest {
    pub processed: bool,
}

/// `?lang=` on public content endpoints
#[derive(Debug, Default, Deserialize)]
pub struct LangQuery {
    pub lang: Option<String>,
}

/// Public media list query
#[derive(Debug, Default, Deserialize)]
pub struct MediaQuery {
    /// `image` or `video`
    pub kind: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Create or replace a homepage slot
#[derive(Debug, Deserialize, Validate)]
pub struct HomepageItemRequest {
    #[validate(length(min = 1, max = 64, message = "Section must be 1-64 characters"))]
    pub section: String,

    #[validate(length(min = 1, max = 512, message = "Media key is required"))]
    pub media_key: String,

    #[serde(default)]
    pub position: i32,

    #[serde(default)]
    pub alt: LocalizedText,

    #[validate(url(message = "Invalid link URL"))]
    pub link_url: Option<String>,
}

/// Create or replace a service
#[derive(Debug, Deserialize, Validate)]
pub struct ServiceRequest {
    #[validate(length(min = 1, max = 100, message = "Slug must be 1-100 characters"))]
    pub slug: String,

    pub title: LocalizedText,

    #[serde(default)]
    pub description: LocalizedText,

    pub image_key: Option<String>,

    #[serde(default)]
    pub position: i32,

    #[serde(default = "default_true")]
    pub active: bool,
}

/// Create or replace a service option
#[derive(Debug, Deserialize, Validate)]
pub struct ServiceOptionRequest {
    pub name: LocalizedText,

    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub price_minor: Option<i64>,

    #[validate(range(min = 1, message = "Duration must be positive"))]
    pub duration_minutes: Option<i32>,

    #[serde(default)]
    pub position: i32,
}

/// `?period=&lang=` on the public report
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub period: Option<String>,
    pub lang: Option<String>,
}

/// Create or replace a report line
#[derive(Debug, Deserialize, Validate)]
pub struct ReportItemRequest {
    #[validate(length(equal = 7, message = "Period must look like YYYY-MM"))]
    pub period: String,

    #[validate(length(min = 1, max = 64, message = "Category must be 1-64 characters"))]
    pub category: String,

    #[serde(default)]
    pub description: LocalizedText,

    #[validate(range(min = 0, message = "Amount cannot be negative"))]
    pub amount_minor: i64,

    pub currency: Option<String>,

    #[serde(default)]
    pub position: i32,
}

/// Report setting value
#[derive(Debug, Deserialize)]
pub struct ReportSettingRequest {
    pub value: serde_json::Value,
}

/// `?limit=` on the Instagram feed
#[derive(Debug, Default, Deserialize)]
pub struct InstagramQuery {
    pub limit: Option<u32>,
}

fn default_true() -> bool {
    true
}
