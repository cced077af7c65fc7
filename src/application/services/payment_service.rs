//! Payment Service
//!
//! Creates donations, hands donors over to a gateway checkout and
//! reconciles gateway callbacks with the stored donation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::{
    Amount, AmountError, Currency, Donation, DonationFilter, DonationRepository, DonationStatus,
    DonationTotals, PaymentGateway, StatusUpdate,
};
use crate::infrastructure::notifications::{Notification, Notifier};
use crate::infrastructure::payments::{
    CallbackRequest, Checkout, CheckoutRequest, GatewayError, PaymentProviders,
};
use crate::shared::error::AppError;

/// Payment service trait
#[async_trait]
pub trait PaymentService: Send + Sync {
    /// Insert a donation and start a checkout with its gateway.
    async fn create_donation(&self, request: CreateDonationDto) -> Result<DonationCheckoutDto, PaymentError>;

    /// Current state of a donation, polled by the thank-you page.
    async fn donation_status(&self, order_id: &str) -> Result<Donation, PaymentError>;

    /// Verify a gateway callback and apply it to the donation.
    async fn handle_callback(
        &self,
        gateway: PaymentGateway,
        request: CallbackRequest<'_>,
    ) -> Result<CallbackOutcome, PaymentError>;

    async fn list_donations(&self, filter: DonationFilter) -> Result<Vec<Donation>, PaymentError>;

    async fn donation_stats(&self) -> Result<Vec<DonationTotals>, PaymentError>;
}

/// Create donation request
#[derive(Debug, Clone)]
pub struct CreateDonationDto {
    pub amount: Amount,
    pub currency: Currency,
    pub gateway: PaymentGateway,
    pub donor_name: Option<String>,
    pub donor_email: Option<String>,
    pub comment: Option<String>,
}

/// A created donation and where to pay for it
#[derive(Debug, Clone, Serialize)]
pub struct DonationCheckoutDto {
    pub order_id: String,
    pub gateway: PaymentGateway,
    pub status: DonationStatus,
    pub amount: String,
    pub currency: String,
    pub checkout: Checkout,
}

/// What a callback changed
#[derive(Debug, Clone)]
pub struct CallbackOutcome {
    pub donation: Donation,
    pub previous_status: DonationStatus,
    /// Reply body the gateway expects, if any
    pub acknowledgement: Option<serde_json::Value>,
}

impl CallbackOutcome {
    pub fn became_successful(&self) -> bool {
        self.previous_status != DonationStatus::Success
            && self.donation.status == DonationStatus::Success
    }
}

/// Payment service errors
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Donation not found")]
    NotFound,

    #[error("No donation matches order {0}")]
    UnknownOrder(String),

    #[error(transparent)]
    InvalidAmount(#[from] AmountError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Repository(#[from] AppError),
}

impl From<PaymentError> for AppError {
    fn from(error: PaymentError) -> Self {
        match error {
            PaymentError::NotFound => AppError::NotFound("Donation not found".into()),
            e @ PaymentError::UnknownOrder(_) => AppError::NotFound(e.to_string()),
            PaymentError::InvalidAmount(e) => AppError::Validation(e.to_string()),
            PaymentError::Gateway(GatewayError::NotConfigured(gateway)) => {
                AppError::BadRequest(format!("Payments through {} are not available", gateway))
            }
            PaymentError::Gateway(e @ GatewayError::InvalidSignature) => {
                AppError::Unauthorized(e.to_string())
            }
            PaymentError::Gateway(e @ GatewayError::Malformed(_)) => {
                AppError::BadRequest(e.to_string())
            }
            PaymentError::Gateway(e) => AppError::Upstream(e.to_string()),
            PaymentError::Repository(e) => e,
        }
    }
}

/// `{gateway prefix}-{uuid v7 without dashes}`; fits the 64 character column
/// and sorts by creation time.
pub fn generate_order_id(gateway: PaymentGateway) -> String {
    format!("{}-{}", gateway.order_prefix(), Uuid::now_v7().simple())
}

/// PaymentService implementation
pub struct PaymentServiceImpl<D>
where
    D: DonationRepository,
{
    donation_repo: Arc<D>,
    providers: PaymentProviders,
    notifier: Notifier,
}

impl<D> PaymentServiceImpl<D>
where
    D: DonationRepository,
{
    pub fn new(donation_repo: Arc<D>, providers: PaymentProviders, notifier: Notifier) -> Self {
        Self {
            donation_repo,
            providers,
            notifier,
        }
    }

    async fn find_for_callback(
        &self,
        gateway: PaymentGateway,
        order_id: Option<&str>,
        invoice_id: Option<&str>,
    ) -> Result<Option<Donation>, PaymentError> {
        if let Some(order_id) = order_id {
            if let Some(donation) = self.donation_repo.find_by_order_id(order_id).await? {
                return Ok(Some(donation));
            }
        }
        if let Some(invoice_id) = invoice_id {
            return Ok(self
                .donation_repo
                .find_by_invoice_id(gateway, invoice_id)
                .await?);
        }
        Ok(None)
    }
}

#[async_trait]
impl<D> PaymentService for PaymentServiceImpl<D>
where
    D: DonationRepository + 'static,
{
    #[instrument(skip(self, request), fields(gateway = %request.gateway, amount = request.amount.minor()))]
    async fn create_donation(&self, request: CreateDonationDto) -> Result<DonationCheckoutDto, PaymentError> {
        let now = Utc::now();
        let donation = Donation {
            id: Uuid::now_v7(),
            order_id: generate_order_id(request.gateway),
            gateway: request.gateway,
            amount_minor: request.amount.minor(),
            currency: request.currency.as_str().to_string(),
            status: DonationStatus::Processing,
            donor_name: request.donor_name,
            donor_email: request.donor_email,
            comment: request.comment,
            gateway_invoice_id: None,
            gateway_payload: None,
            created_at: now,
            updated_at: now,
        };
        let donation = self.donation_repo.create(&donation).await?;

        let provider = self.providers.get(request.gateway);
        let checkout = provider
            .create_checkout(&CheckoutRequest {
                order_id: &donation.order_id,
                amount: request.amount,
                currency: request.currency,
                description: "Charitable donation to the rehabilitation center",
                created_at: donation.created_at,
            })
            .await;

        let checkout = match checkout {
            Ok(checkout) => checkout,
            Err(e) => {
                warn!(order_id = %donation.order_id, error = %e, "Checkout creation failed");
                self.donation_repo
                    .apply_status(
                        donation.id,
                        &StatusUpdate {
                            status: DonationStatus::Failure,
                            gateway_invoice_id: None,
                            payload: json!({ "error": e.to_string() }),
                        },
                    )
                    .await?;
                return Err(e.into());
            }
        };

        if let Some(invoice_id) = &checkout.invoice_id {
            self.donation_repo
                .set_invoice_id(donation.id, invoice_id)
                .await?;
        }

        info!(order_id = %donation.order_id, "Donation created");
        Ok(DonationCheckoutDto {
            order_id: donation.order_id,
            gateway: donation.gateway,
            status: donation.status,
            amount: request.amount.to_decimal_string(),
            currency: donation.currency,
            checkout,
        })
    }

    async fn donation_status(&self, order_id: &str) -> Result<Donation, PaymentError> {
        self.donation_repo
            .find_by_order_id(order_id)
            .await?
            .ok_or(PaymentError::NotFound)
    }

    #[instrument(skip(self, request))]
    async fn handle_callback(
        &self,
        gateway: PaymentGateway,
        request: CallbackRequest<'_>,
    ) -> Result<CallbackOutcome, PaymentError> {
        let provider = self.providers.get(gateway);
        let notification = provider.verify_callback(request)?;

        let donation = self
            .find_for_callback(
                gateway,
                notification.order_id.as_deref(),
                notification.invoice_id.as_deref(),
            )
            .await?
            .filter(|d| d.gateway == gateway)
            .ok_or_else(|| {
                PaymentError::UnknownOrder(
                    notification
                        .order_id
                        .clone()
                        .or_else(|| notification.invoice_id.clone())
                        .unwrap_or_default(),
                )
            })?;

        let previous_status = donation.status;
        let updated = self
            .donation_repo
            .apply_status(
                donation.id,
                &StatusUpdate {
                    status: notification.status,
                    gateway_invoice_id: notification.invoice_id.clone(),
                    payload: notification.payload.clone(),
                },
            )
            .await?;

        info!(
            order_id = %updated.order_id,
            gateway_status = %notification.gateway_status,
            from = %previous_status,
            to = %updated.status,
            "Donation status reconciled"
        );

        let outcome = CallbackOutcome {
            acknowledgement: provider.acknowledge(&notification),
            donation: updated,
            previous_status,
        };

        if outcome.became_successful() {
            let amount = Amount::from_minor(outcome.donation.amount_minor)
                .map(|a| a.to_decimal_string())
                .unwrap_or_else(|_| outcome.donation.amount_minor.to_string());
            self.notifier.notify(Notification::DonationSucceeded {
                order_id: outcome.donation.order_id.clone(),
                gateway: gateway.to_string(),
                amount,
                currency: outcome.donation.currency.clone(),
                donor_name: outcome.donation.donor_name.clone(),
            });
        }

        Ok(outcome)
    }

    async fn list_donations(&self, filter: DonationFilter) -> Result<Vec<Donation>, PaymentError> {
        Ok(self.donation_repo.list(&filter).await?)
    }

    async fn donation_stats(&self) -> Result<Vec<DonationTotals>, PaymentError> {
        Ok(self.donation_repo.totals().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::notifications::{NotificationSender, NotifyError};
    use crate::infrastructure::payments::{GatewayNotification, PaymentProvider};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct MemoryDonations {
        rows: Mutex<Vec<Donation>>,
    }

    impl MemoryDonations {
        fn get(&self, order_id: &str) -> Donation {
            self.rows
                .lock()
                .unwrap()
                .iter()
                .find(|d| d.order_id == order_id)
                .cloned()
                .unwrap()
        }
    }

    #[async_trait]
    impl DonationRepository for MemoryDonations {
        async fn create(&self, donation: &Donation) -> Result<Donation, AppError> {
            self.rows.lock().unwrap().push(donation.clone());
            Ok(donation.clone())
        }

        async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Donation>, AppError> {
            Ok(self.rows.lock().unwrap().iter().find(|d| d.order_id == order_id).cloned())
        }

        async fn find_by_invoice_id(
            &self,
            gateway: PaymentGateway,
            invoice_id: &str,
        ) -> Result<Option<Donation>, AppError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|d| d.gateway == gateway && d.gateway_invoice_id.as_deref() == Some(invoice_id))
                .cloned())
        }

        async fn set_invoice_id(&self, id: Uuid, invoice_id: &str) -> Result<(), AppError> {
            let mut rows = self.rows.lock().unwrap();
            if let Some(d) = rows.iter_mut().find(|d| d.id == id) {
                d.gateway_invoice_id = Some(invoice_id.to_string());
            }
            Ok(())
        }

        async fn apply_status(&self, id: Uuid, update: &StatusUpdate) -> Result<Donation, AppError> {
            let mut rows = self.rows.lock().unwrap();
            let d = rows
                .iter_mut()
                .find(|d| d.id == id)
                .ok_or_else(|| AppError::NotFound("Donation not found".into()))?;
            d.status = update.status;
            if let Some(invoice) = &update.gateway_invoice_id {
                d.gateway_invoice_id = Some(invoice.clone());
            }
            d.gateway_payload = Some(update.payload.clone());
            Ok(d.clone())
        }

        async fn list(&self, _filter: &DonationFilter) -> Result<Vec<Donation>, AppError> {
            Ok(self.rows.lock().unwrap().clone())
        }

        async fn totals(&self) -> Result<Vec<DonationTotals>, AppError> {
            Ok(Vec::new())
        }
    }

    /// Gateway whose callbacks are plain JSON `{order, invoice, status}`
    /// and whose checkout hands out a fixed invoice id.
    struct FakeGateway {
        gateway: PaymentGateway,
        fail_checkout: bool,
    }

    #[async_trait]
    impl PaymentProvider for FakeGateway {
        fn gateway(&self) -> PaymentGateway {
            self.gateway
        }

        async fn create_checkout(&self, request: &CheckoutRequest<'_>) -> Result<Checkout, GatewayError> {
            if self.fail_checkout {
                return Err(GatewayError::Rejected("invalid merchant".into()));
            }
            Ok(Checkout {
                checkout_url: format!("https://pay.example/{}", request.order_id),
                form_fields: Default::default(),
                invoice_id: Some(format!("inv-{}", request.order_id)),
            })
        }

        fn verify_callback(&self, request: CallbackRequest<'_>) -> Result<GatewayNotification, GatewayError> {
            if request.signature != Some("ok") {
                return Err(GatewayError::InvalidSignature);
            }
            let payload: serde_json::Value = serde_json::from_slice(request.body)
                .map_err(|e| GatewayError::Malformed(e.to_string()))?;
            let status = payload["status"].as_str().unwrap_or_default().to_string();
            Ok(GatewayNotification {
                order_id: payload["order"].as_str().map(String::from),
                invoice_id: payload["invoice"].as_str().map(String::from),
                status: DonationStatus::parse(&status).unwrap_or(DonationStatus::Processing),
                gateway_status: status,
                payload,
            })
        }

        fn acknowledge(&self, notification: &GatewayNotification) -> Option<serde_json::Value> {
            Some(json!({ "ack": notification.order_id }))
        }
    }

    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl NotificationSender for RecordingSender {
        async fn send(&self, text: &str) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn providers(fail_checkout: bool) -> PaymentProviders {
        let fake = |gateway| -> Arc<dyn PaymentProvider> {
            Arc::new(FakeGateway {
                gateway,
                fail_checkout,
            })
        };
        PaymentProviders::new(
            fake(PaymentGateway::LiqPay),
            fake(PaymentGateway::Monobank),
            fake(PaymentGateway::WayForPay),
        )
    }

    fn donation_request(gateway: PaymentGateway) -> CreateDonationDto {
        CreateDonationDto {
            amount: Amount::from_minor(25_000).unwrap(),
            currency: Currency::Uah,
            gateway,
            donor_name: Some("Taras".into()),
            donor_email: None,
            comment: None,
        }
    }

    fn callback(body: &serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(body).unwrap()
    }

    #[tokio::test]
    async fn creates_processing_donation_with_invoice() {
        let repo = Arc::new(MemoryDonations::default());
        let service = PaymentServiceImpl::new(repo.clone(), providers(false), Notifier::disabled());

        let created = service
            .create_donation(donation_request(PaymentGateway::Monobank))
            .await
            .unwrap();

        assert!(created.order_id.starts_with("mb-"));
        assert_eq!(created.status, DonationStatus::Processing);
        assert_eq!(created.amount, "250.00");

        let stored = repo.get(&created.order_id);
        assert_eq!(stored.gateway_invoice_id, Some(format!("inv-{}", created.order_id)));
    }

    #[tokio::test]
    async fn failed_checkout_marks_donation_failed() {
        let repo = Arc::new(MemoryDonations::default());
        let service = PaymentServiceImpl::new(repo.clone(), providers(true), Notifier::disabled());

        let result = service
            .create_donation(donation_request(PaymentGateway::LiqPay))
            .await;

        assert!(matches!(result, Err(PaymentError::Gateway(GatewayError::Rejected(_)))));
        let rows = repo.rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, DonationStatus::Failure);
    }

    #[tokio::test]
    async fn callback_updates_by_order_id_and_is_idempotent() {
        let repo = Arc::new(MemoryDonations::default());
        let service = PaymentServiceImpl::new(repo.clone(), providers(false), Notifier::disabled());
        let created = service
            .create_donation(donation_request(PaymentGateway::LiqPay))
            .await
            .unwrap();

        let body = callback(&json!({"order": created.order_id, "invoice": "p-1", "status": "success"}));
        let request = CallbackRequest {
            body: &body,
            signature: Some("ok"),
        };

        let first = service
            .handle_callback(PaymentGateway::LiqPay, request)
            .await
            .unwrap();
        let second = service
            .handle_callback(PaymentGateway::LiqPay, request)
            .await
            .unwrap();

        assert!(first.became_successful());
        assert!(!second.became_successful());
        assert_eq!(first.donation.status, second.donation.status);
        assert_eq!(second.donation.gateway_invoice_id.as_deref(), Some("p-1"));
        assert_eq!(first.acknowledgement, Some(json!({ "ack": created.order_id })));
    }

    #[tokio::test]
    async fn callback_falls_back_to_invoice_id() {
        let repo = Arc::new(MemoryDonations::default());
        let service = PaymentServiceImpl::new(repo.clone(), providers(false), Notifier::disabled());
        let created = service
            .create_donation(donation_request(PaymentGateway::Monobank))
            .await
            .unwrap();

        let body = callback(&json!({
            "invoice": format!("inv-{}", created.order_id),
            "status": "expired",
        }));
        let outcome = service
            .handle_callback(
                PaymentGateway::Monobank,
                CallbackRequest {
                    body: &body,
                    signature: Some("ok"),
                },
            )
            .await
            .unwrap();

        assert_eq!(outcome.donation.order_id, created.order_id);
        assert_eq!(repo.get(&created.order_id).status, DonationStatus::Expired);
    }

    #[tokio::test]
    async fn callback_for_another_gateway_is_unknown() {
        let repo = Arc::new(MemoryDonations::default());
        let service = PaymentServiceImpl::new(repo.clone(), providers(false), Notifier::disabled());
        let created = service
            .create_donation(donation_request(PaymentGateway::LiqPay))
            .await
            .unwrap();

        let body = callback(&json!({"order": created.order_id, "status": "success"}));
        let result = service
            .handle_callback(
                PaymentGateway::WayForPay,
                CallbackRequest {
                    body: &body,
                    signature: Some("ok"),
                },
            )
            .await;

        assert!(matches!(result, Err(PaymentError::UnknownOrder(_))));
        assert_eq!(repo.get(&created.order_id).status, DonationStatus::Processing);
    }

    #[tokio::test]
    async fn bad_signature_leaves_donation_untouched() {
        let repo = Arc::new(MemoryDonations::default());
        let service = PaymentServiceImpl::new(repo.clone(), providers(false), Notifier::disabled());
        let created = service
            .create_donation(donation_request(PaymentGateway::LiqPay))
            .await
            .unwrap();

        let body = callback(&json!({"order": created.order_id, "status": "success"}));
        let result = service
            .handle_callback(
                PaymentGateway::LiqPay,
                CallbackRequest {
                    body: &body,
                    signature: Some("forged"),
                },
            )
            .await;

        assert!(matches!(result, Err(PaymentError::Gateway(GatewayError::InvalidSignature))));
        assert_eq!(repo.get(&created.order_id).status, DonationStatus::Processing);
    }

    #[tokio::test]
    async fn success_transition_notifies_once() {
        let sender = Arc::new(RecordingSender::default());
        let (notifier, _worker) = Notifier::spawn(sender.clone(), 8);
        let repo = Arc::new(MemoryDonations::default());
        let service = PaymentServiceImpl::new(repo, providers(false), notifier);
        let created = service
            .create_donation(donation_request(PaymentGateway::WayForPay))
            .await
            .unwrap();

        let body = callback(&json!({"order": created.order_id, "status": "success"}));
        let request = CallbackRequest {
            body: &body,
            signature: Some("ok"),
        };
        service.handle_callback(PaymentGateway::WayForPay, request).await.unwrap();
        service.handle_callback(PaymentGateway::WayForPay, request).await.unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("250.00 UAH"));
    }

    #[tokio::test]
    async fn unknown_order_status_is_not_found() {
        let service = PaymentServiceImpl::new(
            Arc::new(MemoryDonations::default()),
            providers(false),
            Notifier::disabled(),
        );
        assert!(matches!(
            service.donation_status("lp-missing").await,
            Err(PaymentError::NotFound)
        ));
    }

    #[test]
    fn order_ids_carry_the_gateway_prefix() {
        let id = generate_order_id(PaymentGateway::WayForPay);
        assert!(id.starts_with("wfp-"));
        assert_eq!(id.len(), 4 + 32);
    }
}
