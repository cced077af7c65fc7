//! Service Catalog Repository Implementation
//!
//! PostgreSQL implementation of the ServiceRepository trait.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{LocalizedText, Service, ServiceOption, ServiceRepository, ServiceWithOptions};
use crate::shared::error::AppError;

const SERVICE_COLUMNS: &str = "id, slug, title_uk, title_en, title_pl, description_uk, \
                               description_en, description_pl, image_key, position, active, \
                               created_at, updated_at";

const OPTION_COLUMNS: &str =
    "id, service_id, name_uk, name_en, name_pl, price_minor, duration_minutes, position";

#[derive(Debug, sqlx::FromRow)]
struct ServiceRow {
    id: Uuid,
    slug: String,
    title_uk: String,
    title_en: String,
    title_pl: String,
    description_uk: String,
    description_en: String,
    description_pl: String,
    image_key: Option<String>,
    position: i32,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ServiceRow {
    fn into_service(self) -> Service {
        Service {
            id: self.id,
            slug: self.slug,
            title: LocalizedText::new(self.title_uk, self.title_en, self.title_pl),
            description: LocalizedText::new(
                self.description_uk,
                self.description_en,
                self.description_pl,
            ),
            image_key: self.image_key,
            position: self.position,
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ServiceOptionRow {
    id: Uuid,
    service_id: Uuid,
    name_uk: String,
    name_en: String,
    name_pl: String,
    price_minor: Option<i64>,
    duration_minutes: Option<i32>,
    position: i32,
}

impl ServiceOptionRow {
    fn into_option(self) -> ServiceOption {
        ServiceOption {
            id: self.id,
            service_id: self.service_id,
            name: LocalizedText::new(self.name_uk, self.name_en, self.name_pl),
            price_minor: self.price_minor,
            duration_minutes: self.duration_minutes,
            position: self.position,
        }
    }
}

fn slug_conflict(e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict("A service with this slug already exists".to_string())
        }
        _ => AppError::Database(e),
    }
}

#[derive(Clone)]
pub struct PgServiceRepository {
    pool: PgPool,
}

impl PgServiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ServiceRepository for PgServiceRepository {
    async fn list_with_options(&self, only_active: bool) -> Result<Vec<ServiceWithOptions>, AppError> {
        let services = sqlx::query_as::<_, ServiceRow>(&format!(
            r#"
            SELECT {SERVICE_COLUMNS}
            FROM services
            WHERE ($1 = FALSE OR active = TRUE)
            ORDER BY position, created_at
            "#
        ))
        .bind(only_active)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = services.iter().map(|s| s.id).collect();
        let options = sqlx::query_as::<_, ServiceOptionRow>(&format!(
            r#"
            SELECT {OPTION_COLUMNS}
            FROM service_options
            WHERE service_id = ANY($1)
            ORDER BY position, id
            "#
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_service: HashMap<Uuid, Vec<ServiceOption>> = HashMap::new();
        for option in options {
            let option = option.into_option();
            by_service.entry(option.service_id).or_default().push(option);
        }

        Ok(services
            .into_iter()
            .map(|row| {
                let options = by_service.remove(&row.id).unwrap_or_default();
                ServiceWithOptions {
                    service: row.into_service(),
                    options,
                }
            })
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Service>, AppError> {
        let row = sqlx::query_as::<_, ServiceRow>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM services WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_service()))
    }

    async fn create(&self, service: &Service) -> Result<Service, AppError> {
        let row = sqlx::query_as::<_, ServiceRow>(&format!(
            r#"
            INSERT INTO services ({SERVICE_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {SERVICE_COLUMNS}
            "#
        ))
        .bind(service.id)
        .bind(&service.slug)
        .bind(&service.title.uk)
        .bind(&service.title.en)
        .bind(&service.title.pl)
        .bind(&service.description.uk)
        .bind(&service.description.en)
        .bind(&service.description.pl)
        .bind(&service.image_key)
        .bind(service.position)
        .bind(service.active)
        .bind(service.created_at)
        .bind(service.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(slug_conflict)?;

        Ok(row.into_service())
    }

    async fn update(&self, service: &Service) -> Result<Option<Service>, AppError> {
        let row = sqlx::query_as::<_, ServiceRow>(&format!(
            r#"
            UPDATE services
            SET slug = $2, title_uk = $3, title_en = $4, title_pl = $5,
                description_uk = $6, description_en = $7, description_pl = $8,
                image_key = $9, position = $10, active = $11, updated_at = NOW()
            WHERE id = $1
            RETURNING {SERVICE_COLUMNS}
            "#
        ))
        .bind(service.id)
        .bind(&service.slug)
        .bind(&service.title.uk)
        .bind(&service.title.en)
        .bind(&service.title.pl)
        .bind(&service.description.uk)
        .bind(&service.description.en)
        .bind(&service.description.pl)
        .bind(&service.image_key)
        .bind(service.position)
        .bind(service.active)
        .fetch_optional(&self.pool)
        .await
        .map_err(slug_conflict)?;

        Ok(row.map(|r| r.into_service()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM services WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_option(&self, option: &ServiceOption) -> Result<ServiceOption, AppError> {
        let row = sqlx::query_as::<_, ServiceOptionRow>(&format!(
            r#"
            INSERT INTO service_options ({OPTION_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {OPTION_COLUMNS}
            "#
        ))
        .bind(option.id)
        .bind(option.service_id)
        .bind(&option.name.uk)
        .bind(&option.name.en)
        .bind(&option.name.pl)
        .bind(option.price_minor)
        .bind(option.duration_minutes)
        .bind(option.position)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_option())
    }

    async fn find_option(&self, id: Uuid) -> Result<Option<ServiceOption>, AppError> {
        let row = sqlx::query_as::<_, ServiceOptionRow>(&format!(
            "SELECT {OPTION_COLUMNS} FROM service_options WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_option()))
    }

    async fn update_option(&self, option: &ServiceOption) -> Result<Option<ServiceOption>, AppError> {
        let row = sqlx::query_as::<_, ServiceOptionRow>(&format!(
            r#"
            UPDATE service_options
            SET name_uk = $2, name_en = $3, name_pl = $4,
                price_minor = $5, duration_minutes = $6, position = $7
            WHERE id = $1
            RETURNING {OPTION_COLUMNS}
            "#
        ))
        .bind(option.id)
        .bind(&option.name.uk)
        .bind(&option.name.en)
        .bind(&option.name.pl)
        .bind(option.price_minor)
        .bind(option.duration_minutes)
        .bind(option.position)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_option()))
    }

    async fn delete_option(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM service_options WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
