//! Submission Service
//!
//! Public forms: stored first, then forwarded to the messaging bot.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::{FormSubmission, FormType, SubmissionFilter, SubmissionRepository};
use crate::infrastructure::notifications::{Notification, Notifier};
use crate::shared::error::AppError;

/// Largest page of submissions the admin list returns.
pub const MAX_PAGE: i64 = 100;

/// Submission service trait
#[async_trait]
pub trait SubmissionService: Send + Sync {
    async fn create_submission(&self, request: CreateSubmissionDto) -> Result<SubmissionReceiptDto, SubmissionError>;

    async fn list_submissions(&self, filter: SubmissionFilter) -> Result<Vec<FormSubmission>, SubmissionError>;

    async fn mark_processed(&self, id: Uuid, processed: bool) -> Result<(), SubmissionError>;

    async fn delete_submission(&self, id: Uuid) -> Result<(), SubmissionError>;
}

/// Create submission request
#[derive(Debug, Clone)]
pub struct CreateSubmissionDto {
    pub form_type: FormType,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
    pub extra: serde_json::Value,
}

/// Stored submission, with a warning when the team was not notified
#[derive(Debug, Clone)]
pub struct SubmissionReceiptDto {
    pub submission: FormSubmission,
    pub warning: Option<String>,
}

/// Warning for submissions the bot did not pick up.
pub const NOT_NOTIFIED_WARNING: &str =
    "Submission saved, but the team could not be notified right away";

/// Submission service errors
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("Submission not found")]
    NotFound,

    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Repository(#[from] AppError),
}

impl From<SubmissionError> for AppError {
    fn from(error: SubmissionError) -> Self {
        match error {
            SubmissionError::NotFound => AppError::NotFound("Submission not found".into()),
            SubmissionError::Invalid(message) => AppError::Validation(message),
            SubmissionError::Repository(e) => e,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// SubmissionService implementation
pub struct SubmissionServiceImpl<R>
where
    R: SubmissionRepository,
{
    submission_repo: Arc<R>,
    notifier: Notifier,
}

impl<R> SubmissionServiceImpl<R>
where
    R: SubmissionRepository,
{
    pub fn new(submission_repo: Arc<R>, notifier: Notifier) -> Self {
        Self {
            submission_repo,
            notifier,
        }
    }
}

#[async_trait]
impl<R> SubmissionService for SubmissionServiceImpl<R>
where
    R: SubmissionRepository + 'static,
{
    #[instrument(skip(self, request), fields(form_type = request.form_type.as_str()))]
    async fn create_submission(&self, request: CreateSubmissionDto) -> Result<SubmissionReceiptDto, SubmissionError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(SubmissionError::Invalid("Name must not be blank".into()));
        }

        let extra = match request.extra {
            serde_json::Value::Null => serde_json::Value::Object(Default::default()),
            other => other,
        };

        let submission = FormSubmission {
            id: Uuid::now_v7(),
            form_type: request.form_type,
            name: name.to_string(),
            phone: non_blank(request.phone),
            email: non_blank(request.email),
            message: non_blank(request.message),
            extra,
            processed: false,
            created_at: Utc::now(),
        };
        let submission = self.submission_repo.create(&submission).await?;
        info!(submission_id = %submission.id, "Form submission stored");

        let notified = self.notifier.notify(Notification::FormSubmitted {
            title: submission.form_type.title().to_string(),
            name: submission.name.clone(),
            phone: submission.phone.clone(),
            email: submission.email.clone(),
            message: submission.message.clone(),
        });

        Ok(SubmissionReceiptDto {
            submission,
            warning: (!notified).then(|| NOT_NOTIFIED_WARNING.to_string()),
        })
    }

    async fn list_submissions(&self, mut filter: SubmissionFilter) -> Result<Vec<FormSubmission>, SubmissionError> {
        filter.limit = filter.limit.clamp(1, MAX_PAGE);
        filter.offset = filter.offset.max(0);
        Ok(self.submission_repo.list(&filter).await?)
    }

    async fn mark_processed(&self, id: Uuid, processed: bool) -> Result<(), SubmissionError> {
        if !self.submission_repo.set_processed(id, processed).await? {
            return Err(SubmissionError::NotFound);
        }
        Ok(())
    }

    async fn delete_submission(&self, id: Uuid) -> Result<(), SubmissionError> {
        if !self.submission_repo.delete(id).await? {
            return Err(SubmissionError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::notifications::{NotificationSender, NotifyError};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemorySubmissions {
        rows: Mutex<Vec<FormSubmission>>,
        last_filter: Mutex<Option<SubmissionFilter>>,
    }

    #[async_trait]
    impl SubmissionRepository for MemorySubmissions {
        async fn create(&self, submission: &FormSubmission) -> Result<FormSubmission, AppError> {
            self.rows.lock().unwrap().push(submission.clone());
            Ok(submission.clone())
        }

        async fn list(&self, filter: &SubmissionFilter) -> Result<Vec<FormSubmission>, AppError> {
            *self.last_filter.lock().unwrap() = Some(filter.clone());
            Ok(self.rows.lock().unwrap().clone())
        }

        async fn set_processed(&self, id: Uuid, processed: bool) -> Result<bool, AppError> {
            let mut rows = self.rows.lock().unwrap();
            match rows.iter_mut().find(|s| s.id == id) {
                Some(s) => {
                    s.processed = processed;
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|s| s.id != id);
            Ok(rows.len() != before)
        }
    }

    fn request() -> CreateSubmissionDto {
        CreateSubmissionDto {
            form_type: FormType::Consultation,
            name: "  Marta ".into(),
            phone: Some("+380671234567".into()),
            email: Some("   ".into()),
            message: None,
            extra: serde_json::Value::Null,
        }
    }

    #[tokio::test]
    async fn stores_trimmed_submission() {
        let repo = Arc::new(MemorySubmissions::default());
        let service = SubmissionServiceImpl::new(repo.clone(), Notifier::disabled());

        let receipt = service.create_submission(request()).await.unwrap();
        let stored = receipt.submission;

        assert_eq!(stored.name, "Marta");
        assert_eq!(stored.email, None);
        assert!(stored.extra.is_object());
        assert!(!stored.processed);
        assert_eq!(repo.rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn submission_without_bot_carries_a_warning() {
        let service =
            SubmissionServiceImpl::new(Arc::new(MemorySubmissions::default()), Notifier::disabled());

        let receipt = service.create_submission(request()).await.unwrap();

        assert_eq!(receipt.warning.as_deref(), Some(NOT_NOTIFIED_WARNING));
    }

    struct QuietSender;

    #[async_trait]
    impl NotificationSender for QuietSender {
        async fn send(&self, _text: &str) -> Result<(), NotifyError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn queued_notification_leaves_no_warning() {
        let (notifier, _worker) = Notifier::spawn(Arc::new(QuietSender), 4);
        let service = SubmissionServiceImpl::new(Arc::new(MemorySubmissions::default()), notifier);

        let receipt = service.create_submission(request()).await.unwrap();

        assert_eq!(receipt.warning, None);
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let repo = Arc::new(MemorySubmissions::default());
        let service = SubmissionServiceImpl::new(repo.clone(), Notifier::disabled());

        let result = service
            .create_submission(CreateSubmissionDto {
                name: "   ".into(),
                ..request()
            })
            .await;

        assert!(matches!(result, Err(SubmissionError::Invalid(_))));
        assert!(repo.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn mark_processed_and_delete_report_missing_rows() {
        let repo = Arc::new(MemorySubmissions::default());
        let service = SubmissionServiceImpl::new(repo.clone(), Notifier::disabled());
        let stored = service.create_submission(request()).await.unwrap().submission;

        service.mark_processed(stored.id, true).await.unwrap();
        assert!(repo.rows.lock().unwrap()[0].processed);

        service.delete_submission(stored.id).await.unwrap();
        assert!(matches!(
            service.delete_submission(stored.id).await,
            Err(SubmissionError::NotFound)
        ));
        assert!(matches!(
            service.mark_processed(stored.id, false).await,
            Err(SubmissionError::NotFound)
        ));
    }

    #[tokio::test]
    async fn list_clamps_paging() {
        let repo = Arc::new(MemorySubmissions::default());
        let service = SubmissionServiceImpl::new(repo.clone(), Notifier::disabled());

        service
            .list_submissions(SubmissionFilter {
                limit: 10_000,
                offset: -5,
                ..Default::default()
            })
            .await
            .unwrap();

        let filter = repo.last_filter.lock().unwrap().clone().unwrap();
        assert_eq!(filter.limit, MAX_PAGE);
        assert_eq!(filter.offset, 0);
    }
}
