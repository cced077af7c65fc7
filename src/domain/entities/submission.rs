//! Form submission entity and repository trait.
//!
//! Maps to the `form_submissions` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;

/// The public forms of the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormType {
    Contact,
    Consultation,
    Volunteer,
    Partnership,
    Feedback,
}

impl FormType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "contact" => Some(Self::Contact),
            "consultation" => Some(Self::Consultation),
            "volunteer" => Some(Self::Volunteer),
            "partnership" => Some(Self::Partnership),
            "feedback" => Some(Self::Feedback),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contact => "contact",
            Self::Consultation => "consultation",
            Self::Volunteer => "volunteer",
            Self::Partnership => "partnership",
            Self::Feedback => "feedback",
        }
    }

    /// Heading used in bot notifications.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Contact => "Contact request",
            Self::Consultation => "Consultation request",
            Self::Volunteer => "Volunteer application",
            Self::Partnership => "Partnership proposal",
            Self::Feedback => "Feedback",
        }
    }
}

/// A submitted public form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSubmission {
    pub id: Uuid,
    pub form_type: FormType,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
    /// Form-specific fields that have no column of their own
    pub extra: serde_json::Value,
    pub processed: bool,
    pub created_at: DateTime<Utc>,
}

/// Filters for the admin submissions list.
#[derive(Debug, Clone, Default)]
pub struct SubmissionFilter {
    pub form_type: Option<FormType>,
    pub processed: Option<bool>,
    pub limit: i64,
    pub offset: i64,
}

/// Repository trait for form submissions.
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    async fn create(&self, submission: &FormSubmission) -> Result<FormSubmission, AppError>;

    async fn list(&self, filter: &SubmissionFilter) -> Result<Vec<FormSubmission>, AppError>;

    /// Returns false when the submission does not exist.
    async fn set_processed(&self, id: Uuid, processed: bool) -> Result<bool, AppError>;

    /// Returns false when the submission does not exist.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}
