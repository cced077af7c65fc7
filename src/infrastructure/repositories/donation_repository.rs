//! Donation Repository Implementation
//!
//! PostgreSQL implementation of the DonationRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{
    Donation, DonationFilter, DonationRepository, DonationStatus, DonationTotals, PaymentGateway,
    StatusUpdate,
};
use crate::shared::error::AppError;

const DONATION_COLUMNS: &str = "id, order_id, gateway, amount_minor, currency, status, \
                                donor_name, donor_email, comment, gateway_invoice_id, \
                                gateway_payload, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct DonationRow {
    id: Uuid,
    order_id: String,
    gateway: String,
    amount_minor: i64,
    currency: String,
    status: String,
    donor_name: Option<String>,
    donor_email: Option<String>,
    comment: Option<String>,
    gateway_invoice_id: Option<String>,
    gateway_payload: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DonationRow {
    fn into_donation(self) -> Result<Donation, AppError> {
        let gateway = PaymentGateway::parse(&self.gateway)
            .ok_or_else(|| AppError::Internal(format!("unknown gateway {:?}", self.gateway)))?;
        let status = DonationStatus::parse(&self.status)
            .ok_or_else(|| AppError::Internal(format!("unknown donation status {:?}", self.status)))?;

        Ok(Donation {
            id: self.id,
            order_id: self.order_id,
            gateway,
            amount_minor: self.amount_minor,
            currency: self.currency.trim().to_string(),
            status,
            donor_name: self.donor_name,
            donor_email: self.donor_email,
            comment: self.comment,
            gateway_invoice_id: self.gateway_invoice_id,
            gateway_payload: self.gateway_payload,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TotalsRow {
    status: String,
    currency: String,
    count: i64,
    amount_minor: i64,
}

/// PostgreSQL donation repository.
#[derive(Clone)]
pub struct PgDonationRepository {
    pool: PgPool,
}

impl PgDonationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DonationRepository for PgDonationRepository {
    async fn create(&self, donation: &Donation) -> Result<Donation, AppError> {
        let row = sqlx::query_as::<_, DonationRow>(&format!(
            r#"
            INSERT INTO donations (
                id, order_id, gateway, amount_minor, currency, status,
                donor_name, donor_email, comment, gateway_invoice_id,
                gateway_payload, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {DONATION_COLUMNS}
            "#
        ))
        .bind(donation.id)
        .bind(&donation.order_id)
        .bind(donation.gateway.as_str())
        .bind(donation.amount_minor)
        .bind(&donation.currency)
        .bind(donation.status.as_str())
        .bind(&donation.donor_name)
        .bind(&donation.donor_email)
        .bind(&donation.comment)
        .bind(&donation.gateway_invoice_id)
        .bind(&donation.gateway_payload)
        .bind(donation.created_at)
        .bind(donation.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("Order id already exists".to_string())
            }
            _ => AppError::Database(e),
        })?;

        row.into_donation()
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Donation>, AppError> {
        let row = sqlx::query_as::<_, DonationRow>(&format!(
            "SELECT {DONATION_COLUMNS} FROM donations WHERE order_id = $1"
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_donation()).transpose()
    }

    async fn find_by_invoice_id(
        &self,
        gateway: PaymentGateway,
        invoice_id: &str,
    ) -> Result<Option<Donation>, AppError> {
        let row = sqlx::query_as::<_, DonationRow>(&format!(
            r#"
            SELECT {DONATION_COLUMNS}
            FROM donations
            WHERE gateway = $1 AND gateway_invoice_id = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
        .bind(gateway.as_str())
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_donation()).transpose()
    }

    async fn set_invoice_id(&self, id: Uuid, invoice_id: &str) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE donations SET gateway_invoice_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(invoice_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn apply_status(&self, id: Uuid, update: &StatusUpdate) -> Result<Donation, AppError> {
        let row = sqlx::query_as::<_, DonationRow>(&format!(
            r#"
            UPDATE donations
            SET status = $2,
                gateway_invoice_id = COALESCE($3, gateway_invoice_id),
                gateway_payload = $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {DONATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(update.status.as_str())
        .bind(&update.gateway_invoice_id)
        .bind(&update.payload)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Donation not found".to_string()))?;

        row.into_donation()
    }

    async fn list(&self, filter: &DonationFilter) -> Result<Vec<Donation>, AppError> {
        let rows = sqlx::query_as::<_, DonationRow>(&format!(
            r#"
            SELECT {DONATION_COLUMNS}
            FROM donations
            WHERE ($1::TEXT IS NULL OR status = $1)
              AND ($2::TEXT IS NULL OR gateway = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.gateway.map(|g| g.as_str()))
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_donation()).collect()
    }

    async fn totals(&self) -> Result<Vec<DonationTotals>, AppError> {
        let rows = sqlx::query_as::<_, TotalsRow>(
            r#"
            SELECT status, TRIM(currency) AS currency,
                   COUNT(*) AS count,
                   COALESCE(SUM(amount_minor), 0)::BIGINT AS amount_minor
            FROM donations
            GROUP BY status, currency
            ORDER BY status, currency
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| {
                let status = DonationStatus::parse(&r.status).ok_or_else(|| {
                    AppError::Internal(format!("unknown donation status {:?}", r.status))
                })?;
                Ok(DonationTotals {
                    status,
                    currency: r.currency,
                    count: r.count,
                    amount_minor: r.amount_minor,
                })
            })
            .collect()
    }
}
