//! Submission Repository Implementation
//!
//! PostgreSQL implementation of the SubmissionRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{FormSubmission, FormType, SubmissionFilter, SubmissionRepository};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct SubmissionRow {
    id: Uuid,
    form_type: String,
    name: String,
    phone: Option<String>,
    email: Option<String>,
    message: Option<String>,
    extra: serde_json::Value,
    processed: bool,
    created_at: DateTime<Utc>,
}

impl SubmissionRow {
    fn into_submission(self) -> Result<FormSubmission, AppError> {
        let form_type = FormType::parse(&self.form_type)
            .ok_or_else(|| AppError::Internal(format!("unknown form type {:?}", self.form_type)))?;

        Ok(FormSubmission {
            id: self.id,
            form_type,
            name: self.name,
            phone: self.phone,
            email: self.email,
            message: self.message,
            extra: self.extra,
            processed: self.processed,
            created_at: self.created_at,
        })
    }
}

#[derive(Clone)]
pub struct PgSubmissionRepository {
    pool: PgPool,
}

impl PgSubmissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubmissionRepository for PgSubmissionRepository {
    async fn create(&self, submission: &FormSubmission) -> Result<FormSubmission, AppError> {
        let row = sqlx::query_as::<_, SubmissionRow>(
            r#"
            INSERT INTO form_submissions (
                id, form_type, name, phone, email, message, extra, processed, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, form_type, name, phone, email, message, extra, processed, created_at
            "#,
        )
        .bind(submission.id)
        .bind(submission.form_type.as_str())
        .bind(&submission.name)
        .bind(&submission.phone)
        .bind(&submission.email)
        .bind(&submission.message)
        .bind(&submission.extra)
        .bind(submission.processed)
        .bind(submission.created_at)
        .fetch_one(&self.pool)
        .await?;

        row.into_submission()
    }

    async fn list(&self, filter: &SubmissionFilter) -> Result<Vec<FormSubmission>, AppError> {
        let rows = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT id, form_type, name, phone, email, message, extra, processed, created_at
            FROM form_submissions
            WHERE ($1::TEXT IS NULL OR form_type = $1)
              AND ($2::BOOLEAN IS NULL OR processed = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.form_type.map(|t| t.as_str()))
        .bind(filter.processed)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_submission()).collect()
    }

    async fn set_processed(&self, id: Uuid, processed: bool) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE form_submissions SET processed = $2 WHERE id = $1")
            .bind(id)
            .bind(processed)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM form_submissions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
