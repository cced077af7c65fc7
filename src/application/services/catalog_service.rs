//! Catalog Service
//!
//! The services price list: public localized view and admin editing.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{
    Language, LocalizedText, Service, ServiceOption, ServiceRepository, ServiceWithOptions,
};
use crate::infrastructure::storage;

use super::content_service::ContentError;

/// Catalog service trait
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Active services with options, in one language.
    async fn list_services(&self, lang: Language) -> Result<Vec<ServiceDto>, ContentError>;

    /// Every service with all languages, including inactive ones.
    async fn list_all(&self) -> Result<Vec<ServiceWithOptions>, ContentError>;

    async fn create_service(&self, input: ServiceInput) -> Result<Service, ContentError>;

    async fn update_service(&self, id: Uuid, input: ServiceInput) -> Result<Service, ContentError>;

    async fn delete_service(&self, id: Uuid) -> Result<(), ContentError>;

    async fn create_option(&self, service_id: Uuid, input: ServiceOptionInput) -> Result<ServiceOption, ContentError>;

    async fn update_option(&self, id: Uuid, input: ServiceOptionInput) -> Result<ServiceOption, ContentError>;

    async fn delete_option(&self, id: Uuid) -> Result<(), ContentError>;
}

/// Service fields set by the admin
#[derive(Debug, Clone)]
pub struct ServiceInput {
    pub slug: String,
    pub title: LocalizedText,
    pub description: LocalizedText,
    pub image_key: Option<String>,
    pub position: i32,
    pub active: bool,
}

/// Option fields set by the admin
#[derive(Debug, Clone)]
pub struct ServiceOptionInput {
    pub name: LocalizedText,
    pub price_minor: Option<i64>,
    pub duration_minutes: Option<i32>,
    pub position: i32,
}

/// Service as shown on the site
#[derive(Debug, Clone, Serialize)]
pub struct ServiceDto {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub position: i32,
    pub options: Vec<ServiceOptionDto>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceOptionDto {
    pub id: Uuid,
    pub name: String,
    pub price_minor: Option<i64>,
    /// Price in major units, e.g. `"1200.00"`
    pub price: Option<String>,
    pub duration_minutes: Option<i32>,
}

/// Slugs are lowercase ASCII words joined by hyphens.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= 100
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Minor units as a two-decimal string.
fn format_minor(minor: i64) -> String {
    format!("{}.{:02}", minor / 100, minor % 100)
}

fn check_service(input: &ServiceInput) -> Result<(), ContentError> {
    if !is_valid_slug(&input.slug) {
        return Err(ContentError::Invalid(
            "Slug must be lowercase letters, digits and hyphens".into(),
        ));
    }
    if input.title.uk.trim().is_empty() {
        return Err(ContentError::Invalid("Ukrainian title is required".into()));
    }
    Ok(())
}

fn check_option(input: &ServiceOptionInput) -> Result<(), ContentError> {
    if input.name.is_empty() {
        return Err(ContentError::Invalid("Option name is required".into()));
    }
    if input.price_minor.is_some_and(|p| p < 0) {
        return Err(ContentError::Invalid("Price cannot be negative".into()));
    }
    if input.duration_minutes.is_some_and(|d| d <= 0) {
        return Err(ContentError::Invalid("Duration must be positive".into()));
    }
    Ok(())
}

/// CatalogService implementation
pub struct CatalogServiceImpl<R>
where
    R: ServiceRepository,
{
    service_repo: Arc<R>,
    cdn_base_url: String,
}

impl<R> CatalogServiceImpl<R>
where
    R: ServiceRepository,
{
    pub fn new(service_repo: Arc<R>, cdn_base_url: impl Into<String>) -> Self {
        Self {
            service_repo,
            cdn_base_url: cdn_base_url.into(),
        }
    }

    fn localize(&self, entry: ServiceWithOptions, lang: Language) -> ServiceDto {
        let ServiceWithOptions { service, options } = entry;
        ServiceDto {
            id: service.id,
            title: service.title.get(lang).to_string(),
            description: service.description.get(lang).to_string(),
            image_url: service
                .image_key
                .as_deref()
                .map(|key| storage::public_url(&self.cdn_base_url, key)),
            slug: service.slug,
            position: service.position,
            options: options
                .into_iter()
                .map(|o| ServiceOptionDto {
                    id: o.id,
                    name: o.name.get(lang).to_string(),
                    price: o.price_minor.map(format_minor),
                    price_minor: o.price_minor,
                    duration_minutes: o.duration_minutes,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl<R> CatalogService for CatalogServiceImpl<R>
where
    R: ServiceRepository + 'static,
{
    async fn list_services(&self, lang: Language) -> Result<Vec<ServiceDto>, ContentError> {
        let services = self.service_repo.list_with_options(true).await?;
        Ok(services.into_iter().map(|s| self.localize(s, lang)).collect())
    }

    async fn list_all(&self) -> Result<Vec<ServiceWithOptions>, ContentError> {
        Ok(self.service_repo.list_with_options(false).await?)
    }

    async fn create_service(&self, input: ServiceInput) -> Result<Service, ContentError> {
        check_service(&input)?;
        let now = Utc::now();
        let service = Service {
            id: Uuid::now_v7(),
            slug: input.slug,
            title: input.title,
            description: input.description,
            image_key: input.image_key,
            position: input.position,
            active: input.active,
            created_at: now,
            updated_at: now,
        };
        Ok(self.service_repo.create(&service).await?)
    }

    async fn update_service(&self, id: Uuid, input: ServiceInput) -> Result<Service, ContentError> {
        check_service(&input)?;
        let existing = self
            .service_repo
            .find_by_id(id)
            .await?
            .ok_or(ContentError::NotFound("Service"))?;

        let service = Service {
            slug: input.slug,
            title: input.title,
            description: input.description,
            image_key: input.image_key,
            position: input.position,
            active: input.active,
            updated_at: Utc::now(),
            ..existing
        };
        self.service_repo
            .update(&service)
            .await?
            .ok_or(ContentError::NotFound("Service"))
    }

    async fn delete_service(&self, id: Uuid) -> Result<(), ContentError> {
        if !self.service_repo.delete(id).await? {
            return Err(ContentError::NotFound("Service"));
        }
        Ok(())
    }

    async fn create_option(&self, service_id: Uuid, input: ServiceOptionInput) -> Result<ServiceOption, ContentError> {
        check_option(&input)?;
        if self.service_repo.find_by_id(service_id).await?.is_none() {
            return Err(ContentError::NotFound("Service"));
        }

        let option = ServiceOption {
            id: Uuid::now_v7(),
            service_id,
            name: input.name,
            price_minor: input.price_minor,
            duration_minutes: input.duration_minutes,
            position: input.position,
        };
        Ok(self.service_repo.create_option(&option).await?)
    }

    async fn update_option(&self, id: Uuid, input: ServiceOptionInput) -> Result<ServiceOption, ContentError> {
        check_option(&input)?;
        let existing = self
            .service_repo
            .find_option(id)
            .await?
            .ok_or(ContentError::NotFound("Service option"))?;

        let option = ServiceOption {
            name: input.name,
            price_minor: input.price_minor,
            duration_minutes: input.duration_minutes,
            position: input.position,
            ..existing
        };
        self.service_repo
            .update_option(&option)
            .await?
            .ok_or(ContentError::NotFound("Service option"))
    }

    async fn delete_option(&self, id: Uuid) -> Result<(), ContentError> {
        if !self.service_repo.delete_option(id).await? {
            return Err(ContentError::NotFound("Service option"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::error::AppError;
    use std::sync::Mutex;
    use test_case::test_case;

    #[derive(Default)]
    struct MemoryServices {
        services: Mutex<Vec<Service>>,
        options: Mutex<Vec<ServiceOption>>,
    }

    #[async_trait]
    impl ServiceRepository for MemoryServices {
        async fn list_with_options(&self, only_active: bool) -> Result<Vec<ServiceWithOptions>, AppError> {
            let options = self.options.lock().unwrap().clone();
            let mut services: Vec<Service> = self
                .services
                .lock()
                .unwrap()
                .iter()
                .filter(|s| !only_active || s.active)
                .cloned()
                .collect();
            services.sort_by_key(|s| s.position);
            Ok(services
                .into_iter()
                .map(|service| ServiceWithOptions {
                    options: options.iter().filter(|o| o.service_id == service.id).cloned().collect(),
                    service,
                })
                .collect())
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<Service>, AppError> {
            Ok(self.services.lock().unwrap().iter().find(|s| s.id == id).cloned())
        }

        async fn create(&self, service: &Service) -> Result<Service, AppError> {
            let mut services = self.services.lock().unwrap();
            if services.iter().any(|s| s.slug == service.slug) {
                return Err(AppError::Conflict("Slug already exists".into()));
            }
            services.push(service.clone());
            Ok(service.clone())
        }

        async fn update(&self, service: &Service) -> Result<Option<Service>, AppError> {
            let mut services = self.services.lock().unwrap();
            Ok(services.iter_mut().find(|s| s.id == service.id).map(|s| {
                *s = service.clone();
                service.clone()
            }))
        }

        async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
            let mut services = self.services.lock().unwrap();
            let before = services.len();
            services.retain(|s| s.id != id);
            self.options.lock().unwrap().retain(|o| o.service_id != id);
            Ok(services.len() != before)
        }

        async fn create_option(&self, option: &ServiceOption) -> Result<ServiceOption, AppError> {
            self.options.lock().unwrap().push(option.clone());
            Ok(option.clone())
        }

        async fn find_option(&self, id: Uuid) -> Result<Option<ServiceOption>, AppError> {
            Ok(self.options.lock().unwrap().iter().find(|o| o.id == id).cloned())
        }

        async fn update_option(&self, option: &ServiceOption) -> Result<Option<ServiceOption>, AppError> {
            let mut options = self.options.lock().unwrap();
            Ok(options.iter_mut().find(|o| o.id == option.id).map(|o| {
                *o = option.clone();
                option.clone()
            }))
        }

        async fn delete_option(&self, id: Uuid) -> Result<bool, AppError> {
            let mut options = self.options.lock().unwrap();
            let before = options.len();
            options.retain(|o| o.id != id);
            Ok(options.len() != before)
        }
    }

    fn service() -> CatalogServiceImpl<MemoryServices> {
        CatalogServiceImpl::new(Arc::new(MemoryServices::default()), "https://cdn.rehab.example")
    }

    fn input(slug: &str, active: bool) -> ServiceInput {
        ServiceInput {
            slug: slug.into(),
            title: LocalizedText::new("Фізіотерапія", "Physiotherapy", ""),
            description: LocalizedText::default(),
            image_key: Some("media/2024/01/physio.jpg".into()),
            position: 1,
            active,
        }
    }

    #[test_case("physiotherapy", true)]
    #[test_case("speech-therapy-2", true)]
    #[test_case("Physio", false)]
    #[test_case("-physio", false)]
    #[test_case("physio therapy", false)]
    fn validates_slugs(slug: &str, expected: bool) {
        assert_eq!(is_valid_slug(slug), expected);
    }

    #[tokio::test]
    async fn public_list_is_localized_and_hides_inactive() {
        let catalog = service();
        let physio = catalog.create_service(input("physio", true)).await.unwrap();
        catalog.create_service(input("hidden", false)).await.unwrap();
        catalog
            .create_option(
                physio.id,
                ServiceOptionInput {
                    name: LocalizedText::new("10 сеансів", "10 sessions", ""),
                    price_minor: Some(1_200_000),
                    duration_minutes: Some(45),
                    position: 0,
                },
            )
            .await
            .unwrap();

        let list = catalog.list_services(Language::Pl).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].title, "Фізіотерапія");
        assert_eq!(
            list[0].image_url.as_deref(),
            Some("https://cdn.rehab.example/media/2024/01/physio.jpg")
        );
        assert_eq!(list[0].options[0].name, "10 сеансів");
        assert_eq!(list[0].options[0].price.as_deref(), Some("12000.00"));

        assert_eq!(catalog.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn rejects_invalid_input() {
        let catalog = service();
        assert!(matches!(
            catalog.create_service(input("Bad Slug", true)).await,
            Err(ContentError::Invalid(_))
        ));

        let physio = catalog.create_service(input("physio", true)).await.unwrap();
        let negative = catalog
            .create_option(
                physio.id,
                ServiceOptionInput {
                    name: LocalizedText::new("Сеанс", "", ""),
                    price_minor: Some(-1),
                    duration_minutes: None,
                    position: 0,
                },
            )
            .await;
        assert!(matches!(negative, Err(ContentError::Invalid(_))));
    }

    #[tokio::test]
    async fn options_need_an_existing_service() {
        let catalog = service();
        let result = catalog
            .create_option(
                Uuid::now_v7(),
                ServiceOptionInput {
                    name: LocalizedText::new("Сеанс", "", ""),
                    price_minor: None,
                    duration_minutes: None,
                    position: 0,
                },
            )
            .await;
        assert!(matches!(result, Err(ContentError::NotFound("Service"))));
    }

    #[tokio::test]
    async fn update_keeps_creation_time() {
        let catalog = service();
        let created = catalog.create_service(input("physio", true)).await.unwrap();

        let mut changed = input("physio", false);
        changed.position = 7;
        let updated = catalog.update_service(created.id, changed).await.unwrap();

        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.position, 7);
        assert!(!updated.active);
    }

    #[tokio::test]
    async fn duplicate_slug_is_a_conflict() {
        let catalog = service();
        catalog.create_service(input("physio", true)).await.unwrap();
        let result = catalog.create_service(input("physio", true)).await;
        assert!(matches!(
            result,
            Err(ContentError::Repository(AppError::Conflict(_)))
        ));
    }
}
