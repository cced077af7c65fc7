//! Public financial report: how donations were spent.
//!
//! Maps to the `report_items` and `report_settings` tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::LocalizedText;
use crate::shared::error::AppError;

/// One expense line of a monthly report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportItem {
    pub id: Uuid,
    /// `YYYY-MM`
    pub period: String,
    pub category: String,
    pub description: LocalizedText,
    pub amount_minor: i64,
    pub currency: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

/// A free-form setting of the report page (goal, published periods...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSetting {
    pub key: String,
    pub value: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

/// Check a `YYYY-MM` period string.
pub fn is_valid_period(period: &str) -> bool {
    let Some((year, month)) = period.split_once('-') else {
        return false;
    };
    year.len() == 4
        && month.len() == 2
        && year.chars().all(|c| c.is_ascii_digit())
        && month
            .parse::<u32>()
            .map(|m| (1..=12).contains(&m))
            .unwrap_or(false)
}

#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// Items of one period, or of all periods when `None`.
    async fn list_items(&self, period: Option<&str>) -> Result<Vec<ReportItem>, AppError>;

    /// Distinct periods, newest first.
    async fn list_periods(&self) -> Result<Vec<String>, AppError>;

    async fn create_item(&self, item: &ReportItem) -> Result<ReportItem, AppError>;

    async fn update_item(&self, item: &ReportItem) -> Result<Option<ReportItem>, AppError>;

    async fn delete_item(&self, id: Uuid) -> Result<bool, AppError>;

    async fn list_settings(&self) -> Result<Vec<ReportSetting>, AppError>;

    async fn upsert_setting(
        &self,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<ReportSetting, AppError>;
}
