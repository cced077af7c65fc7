//! Report Repository Implementation
//!
//! PostgreSQL implementation of the ReportRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{LocalizedText, ReportItem, ReportRepository, ReportSetting};
use crate::shared::error::AppError;

const ITEM_COLUMNS: &str = "id, period, category, description_uk, description_en, \
                            description_pl, amount_minor, currency, position, created_at";

#[derive(Debug, sqlx::FromRow)]
struct ReportItemRow {
    id: Uuid,
    period: String,
    category: String,
    description_uk: String,
    description_en: String,
    description_pl: String,
    amount_minor: i64,
    currency: String,
    position: i32,
    created_at: DateTime<Utc>,
}

impl ReportItemRow {
    fn into_item(self) -> ReportItem {
        ReportItem {
            id: self.id,
            period: self.period.trim().to_string(),
            category: self.category,
            description: LocalizedText::new(
                self.description_uk,
                self.description_en,
                self.description_pl,
            ),
            amount_minor: self.amount_minor,
            currency: self.currency.trim().to_string(),
            position: self.position,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReportSettingRow {
    key: String,
    value: serde_json::Value,
    updated_at: DateTime<Utc>,
}

impl ReportSettingRow {
    fn into_setting(self) -> ReportSetting {
        ReportSetting {
            key: self.key,
            value: self.value,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct PgReportRepository {
    pool: PgPool,
}

impl PgReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportRepository for PgReportRepository {
    async fn list_items(&self, period: Option<&str>) -> Result<Vec<ReportItem>, AppError> {
        let rows = sqlx::query_as::<_, ReportItemRow>(&format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM report_items
            WHERE ($1::TEXT IS NULL OR period = $1)
            ORDER BY period DESC, position, created_at
            "#
        ))
        .bind(period)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_item()).collect())
    }

    async fn list_periods(&self) -> Result<Vec<String>, AppError> {
        let periods = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT TRIM(period) AS period FROM report_items ORDER BY period DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(periods)
    }

    async fn create_item(&self, item: &ReportItem) -> Result<ReportItem, AppError> {
        let row = sqlx::query_as::<_, ReportItemRow>(&format!(
            r#"
            INSERT INTO report_items ({ITEM_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(item.id)
        .bind(&item.period)
        .bind(&item.category)
        .bind(&item.description.uk)
        .bind(&item.description.en)
        .bind(&item.description.pl)
        .bind(item.amount_minor)
        .bind(&item.currency)
        .bind(item.position)
        .bind(item.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_item())
    }

    async fn update_item(&self, item: &ReportItem) -> Result<Option<ReportItem>, AppError> {
        let row = sqlx::query_as::<_, ReportItemRow>(&format!(
            r#"
            UPDATE report_items
            SET period = $2, category = $3, description_uk = $4, description_en = $5,
                description_pl = $6, amount_minor = $7, currency = $8, position = $9
            WHERE id = $1
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(item.id)
        .bind(&item.period)
        .bind(&item.category)
        .bind(&item.description.uk)
        .bind(&item.description.en)
        .bind(&item.description.pl)
        .bind(item.amount_minor)
        .bind(&item.currency)
        .bind(item.position)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_item()))
    }

    async fn delete_item(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM report_items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_settings(&self) -> Result<Vec<ReportSetting>, AppError> {
        let rows = sqlx::query_as::<_, ReportSettingRow>(
            "SELECT key, value, updated_at FROM report_settings ORDER BY key",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_setting()).collect())
    }

    async fn upsert_setting(
        &self,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<ReportSetting, AppError> {
        let row = sqlx::query_as::<_, ReportSettingRow>(
            r#"
            INSERT INTO report_settings (key, value, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            RETURNING key, value, updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_setting())
    }
}
