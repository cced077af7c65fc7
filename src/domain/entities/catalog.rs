//! Rehabilitation services offered by the center and their priced options.
//!
//! Maps to the `services` and `service_options` tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::LocalizedText;
use crate::shared::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub slug: String,
    pub title: LocalizedText,
    pub description: LocalizedText,
    pub image_key: Option<String>,
    pub position: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A bookable variant of a service (e.g. "10 sessions").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceOption {
    pub id: Uuid,
    pub service_id: Uuid,
    pub name: LocalizedText,
    pub price_minor: Option<i64>,
    pub duration_minutes: Option<i32>,
    pub position: i32,
}

/// A service with its options, as listed on the site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceWithOptions {
    #[serde(flatten)]
    pub service: Service,
    pub options: Vec<ServiceOption>,
}

#[async_trait]
pub trait ServiceRepository: Send + Sync {
    /// Services ordered by position with their options ordered by position.
    async fn list_with_options(&self, only_active: bool) -> Result<Vec<ServiceWithOptions>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Service>, AppError>;

    async fn create(&self, service: &Service) -> Result<Service, AppError>;

    async fn update(&self, service: &Service) -> Result<Option<Service>, AppError>;

    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;

    async fn create_option(&self, option: &ServiceOption) -> Result<ServiceOption, AppError>;

    async fn find_option(&self, id: Uuid) -> Result<Option<ServiceOption>, AppError>;

    async fn update_option(&self, option: &ServiceOption) -> Result<Option<ServiceOption>, AppError>;

    async fn delete_option(&self, id: Uuid) -> Result<bool, AppError>;
}
