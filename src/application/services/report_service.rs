//! Report Service
//!
//! The public spending report and its admin editing.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{
    is_valid_period, Currency, Language, LocalizedText, ReportItem, ReportRepository, ReportSetting,
};

use super::content_service::{is_valid_text_key, ContentError};

/// Report service trait
#[async_trait]
pub trait ReportService: Send + Sync {
    /// Report of one period; the newest period when none is requested.
    async fn report(&self, period: Option<&str>, lang: Language) -> Result<ReportDto, ContentError>;

    async fn create_item(&self, input: ReportItemInput) -> Result<ReportItem, ContentError>;

    async fn update_item(&self, id: Uuid, input: ReportItemInput) -> Result<ReportItem, ContentError>;

    async fn delete_item(&self, id: Uuid) -> Result<(), ContentError>;

    async fn upsert_setting(&self, key: &str, value: serde_json::Value) -> Result<ReportSetting, ContentError>;
}

/// Report line fields set by the admin
#[derive(Debug, Clone)]
pub struct ReportItemInput {
    pub period: String,
    pub category: String,
    pub description: LocalizedText,
    pub amount_minor: i64,
    pub currency: Currency,
    pub position: i32,
}

/// Public report page
#[derive(Debug, Clone, Serialize)]
pub struct ReportDto {
    pub period: Option<String>,
    /// Every period with data, newest first
    pub periods: Vec<String>,
    pub items: Vec<ReportItemDto>,
    /// Sum of the period's items per currency, in minor units
    pub totals: BTreeMap<String, i64>,
    pub settings: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportItemDto {
    pub id: Uuid,
    pub category: String,
    pub description: String,
    pub amount_minor: i64,
    pub currency: String,
    pub position: i32,
}

fn check_item(input: &ReportItemInput) -> Result<(), ContentError> {
    if !is_valid_period(&input.period) {
        return Err(ContentError::Invalid("Period must look like YYYY-MM".into()));
    }
    let category = input.category.trim();
    if category.is_empty() || category.len() > 64 {
        return Err(ContentError::Invalid("Category must be 1-64 characters".into()));
    }
    if input.amount_minor < 0 {
        return Err(ContentError::Invalid("Amount cannot be negative".into()));
    }
    Ok(())
}

/// ReportService implementation
pub struct ReportServiceImpl<R>
where
    R: ReportRepository,
{
    report_repo: Arc<R>,
}

impl<R> ReportServiceImpl<R>
where
    R: ReportRepository,
{
    pub fn new(report_repo: Arc<R>) -> Self {
        Self { report_repo }
    }
}

#[async_trait]
impl<R> ReportService for ReportServiceImpl<R>
where
    R: ReportRepository + 'static,
{
    async fn report(&self, period: Option<&str>, lang: Language) -> Result<ReportDto, ContentError> {
        if let Some(period) = period {
            if !is_valid_period(period) {
                return Err(ContentError::Invalid("Period must look like YYYY-MM".into()));
            }
        }

        let periods = self.report_repo.list_periods().await?;
        let period = period
            .map(str::to_string)
            .or_else(|| periods.first().cloned());

        let items = match &period {
            Some(p) => self.report_repo.list_items(Some(p)).await?,
            None => Vec::new(),
        };

        let mut totals = BTreeMap::new();
        for item in &items {
            *totals.entry(item.currency.clone()).or_insert(0) += item.amount_minor;
        }

        let settings = self
            .report_repo
            .list_settings()
            .await?
            .into_iter()
            .map(|s| (s.key, s.value))
            .collect();

        Ok(ReportDto {
            period,
            periods,
            items: items
                .into_iter()
                .map(|item| ReportItemDto {
                    id: item.id,
                    description: item.description.get(lang).to_string(),
                    category: item.category,
                    amount_minor: item.amount_minor,
                    currency: item.currency,
                    position: item.position,
                })
                .collect(),
            totals,
            settings,
        })
    }

    async fn create_item(&self, input: ReportItemInput) -> Result<ReportItem, ContentError> {
        check_item(&input)?;
        let item = ReportItem {
            id: Uuid::now_v7(),
            period: input.period,
            category: input.category.trim().to_string(),
            description: input.description,
            amount_minor: input.amount_minor,
            currency: input.currency.as_str().to_string(),
            position: input.position,
            created_at: Utc::now(),
        };
        Ok(self.report_repo.create_item(&item).await?)
    }

    async fn update_item(&self, id: Uuid, input: ReportItemInput) -> Result<ReportItem, ContentError> {
        check_item(&input)?;
        let item = ReportItem {
            id,
            period: input.period,
            category: input.category.trim().to_string(),
            description: input.description,
            amount_minor: input.amount_minor,
            currency: input.currency.as_str().to_string(),
            position: input.position,
            created_at: Utc::now(),
        };
        self.report_repo
            .update_item(&item)
            .await?
            .ok_or(ContentError::NotFound("Report item"))
    }

    async fn delete_item(&self, id: Uuid) -> Result<(), ContentError> {
        if !self.report_repo.delete_item(id).await? {
            return Err(ContentError::NotFound("Report item"));
        }
        Ok(())
    }

    async fn upsert_setting(&self, key: &str, value: serde_json::Value) -> Result<ReportSetting, ContentError> {
        if !is_valid_text_key(key) || key.len() > 100 {
            return Err(ContentError::Invalid("Invalid setting key".into()));
        }
        Ok(self.report_repo.upsert_setting(key, &value).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::error::AppError;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryReports {
        items: Mutex<Vec<ReportItem>>,
        settings: Mutex<Vec<ReportSetting>>,
    }

    #[async_trait]
    impl ReportRepository for MemoryReports {
        async fn list_items(&self, period: Option<&str>) -> Result<Vec<ReportItem>, AppError> {
            Ok(self
                .items
                .lock()
                .unwrap()
                .iter()
                .filter(|i| period.is_none_or(|p| i.period == p))
                .cloned()
                .collect())
        }

        async fn list_periods(&self) -> Result<Vec<String>, AppError> {
            let mut periods: Vec<String> =
                self.items.lock().unwrap().iter().map(|i| i.period.clone()).collect();
            periods.sort();
            periods.dedup();
            periods.reverse();
            Ok(periods)
        }

        async fn create_item(&self, item: &ReportItem) -> Result<ReportItem, AppError> {
            self.items.lock().unwrap().push(item.clone());
            Ok(item.clone())
        }

        async fn update_item(&self, item: &ReportItem) -> Result<Option<ReportItem>, AppError> {
            let mut items = self.items.lock().unwrap();
            Ok(items.iter_mut().find(|i| i.id == item.id).map(|i| {
                *i = item.clone();
                item.clone()
            }))
        }

        async fn delete_item(&self, id: Uuid) -> Result<bool, AppError> {
            let mut items = self.items.lock().unwrap();
            let before = items.len();
            items.retain(|i| i.id != id);
            Ok(items.len() != before)
        }

        async fn list_settings(&self) -> Result<Vec<ReportSetting>, AppError> {
            Ok(self.settings.lock().unwrap().clone())
        }

        async fn upsert_setting(
            &self,
            key: &str,
            value: &serde_json::Value,
        ) -> Result<ReportSetting, AppError> {
            let mut settings = self.settings.lock().unwrap();
            settings.retain(|s| s.key != key);
            let setting = ReportSetting {
                key: key.to_string(),
                value: value.clone(),
                updated_at: Utc::now(),
            };
            settings.push(setting.clone());
            Ok(setting)
        }
    }

    fn line(period: &str, category: &str, amount_minor: i64) -> ReportItemInput {
        ReportItemInput {
            period: period.into(),
            category: category.into(),
            description: LocalizedText::new("Ліки", "Medicine", ""),
            amount_minor,
            currency: Currency::Uah,
            position: 0,
        }
    }

    #[tokio::test]
    async fn defaults_to_the_newest_period_and_sums_it() {
        let service = ReportServiceImpl::new(Arc::new(MemoryReports::default()));
        service.create_item(line("2024-01", "food", 1_000)).await.unwrap();
        service.create_item(line("2024-02", "medicine", 2_500)).await.unwrap();
        service.create_item(line("2024-02", "rent", 500)).await.unwrap();
        service
            .upsert_setting("goal", json!({"amount_minor": 100_000}))
            .await
            .unwrap();

        let report = service.report(None, Language::En).await.unwrap();

        assert_eq!(report.period.as_deref(), Some("2024-02"));
        assert_eq!(report.periods, vec!["2024-02".to_string(), "2024-01".to_string()]);
        assert_eq!(report.items.len(), 2);
        assert_eq!(report.items[0].description, "Medicine");
        assert_eq!(report.totals.get("UAH"), Some(&3_000));
        assert_eq!(report.settings["goal"], json!({"amount_minor": 100_000}));
    }

    #[tokio::test]
    async fn empty_report_has_no_period() {
        let service = ReportServiceImpl::new(Arc::new(MemoryReports::default()));
        let report = service.report(None, Language::Uk).await.unwrap();
        assert_eq!(report.period, None);
        assert!(report.items.is_empty());
    }

    #[tokio::test]
    async fn rejects_malformed_periods() {
        let service = ReportServiceImpl::new(Arc::new(MemoryReports::default()));
        assert!(matches!(
            service.report(Some("2024-13"), Language::Uk).await,
            Err(ContentError::Invalid(_))
        ));
        assert!(matches!(
            service.create_item(line("24-01", "food", 1)).await,
            Err(ContentError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn updating_a_missing_item_is_not_found() {
        let service = ReportServiceImpl::new(Arc::new(MemoryReports::default()));
        assert!(matches!(
            service.update_item(Uuid::now_v7(), line("2024-01", "food", 1)).await,
            Err(ContentError::NotFound(_))
        ));
    }
}
