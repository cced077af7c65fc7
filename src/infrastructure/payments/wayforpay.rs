//! WayForPay purchase form and service URL callbacks.
//!
//! Signatures are `hex(hmac_md5(secret_key, fields.join(";")))`. The
//! callback must be answered with a signed `accept` body, otherwise
//! WayForPay keeps retrying it.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use md5::Md5;
use serde_json::json;

use super::{
    constant_time_eq, non_empty_scalar, scalar_to_string, CallbackRequest, Checkout,
    CheckoutRequest, GatewayError, GatewayNotification, PaymentProvider,
};
use crate::config::PaymentSettings;
use crate::domain::{DonationStatus, PaymentGateway};

type HmacMd5 = Hmac<Md5>;

/// Callback fields covered by `merchantSignature`, in signing order.
const CALLBACK_SIGNED_FIELDS: [&str; 8] = [
    "merchantAccount",
    "orderReference",
    "amount",
    "currency",
    "authCode",
    "cardPan",
    "transactionStatus",
    "reasonCode",
];

pub struct WayForPayProvider {
    merchant_account: Option<String>,
    secret_key: Option<String>,
    merchant_domain: String,
    checkout_url: String,
    service_url: String,
    return_url: String,
}

impl WayForPayProvider {
    pub fn new(settings: &PaymentSettings) -> Self {
        Self {
            merchant_account: settings.wayforpay.merchant_account.clone(),
            secret_key: settings.wayforpay.secret_key.clone(),
            merchant_domain: settings.wayforpay.merchant_domain.clone(),
            checkout_url: settings.wayforpay.checkout_url.clone(),
            service_url: settings.public_url("/api/payments/wayforpay/callback"),
            return_url: settings.public_url("/donate/thank-you"),
        }
    }

    fn credentials(&self) -> Result<(&str, &str), GatewayError> {
        match (&self.merchant_account, &self.secret_key) {
            (Some(account), Some(secret)) => Ok((account, secret)),
            _ => Err(GatewayError::NotConfigured(PaymentGateway::WayForPay)),
        }
    }
}

/// `hex(hmac_md5(secret, parts.join(";")))`
pub fn sign(secret: &str, parts: &[&str]) -> String {
    let mut mac = HmacMd5::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(parts.join(";").as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Map a WayForPay `transactionStatus` onto the internal status.
pub fn map_status(status: &str) -> DonationStatus {
    match status {
        "Approved" => DonationStatus::Success,
        "Declined" | "Refunded" | "Voided" | "RefundInProcessing" => DonationStatus::Failure,
        "Expired" => DonationStatus::Expired,
        // InProcessing, WaitingAuthComplete, Pending, ...
        _ => DonationStatus::Processing,
    }
}

/// WayForPay posts JSON either as the raw body or as the only key of an
/// url-encoded form.
fn decode_body(body: &[u8]) -> Result<serde_json::Value, GatewayError> {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
        if value.is_object() {
            return Ok(value);
        }
    }

    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
        .map_err(|e| GatewayError::Malformed(format!("unreadable body: {e}")))?;

    match pairs.as_slice() {
        [(key, value)] => {
            let json = if value.is_empty() {
                key.clone()
            } else {
                format!("{key}={value}")
            };
            serde_json::from_str(&json)
                .map_err(|e| GatewayError::Malformed(format!("form key is not JSON: {e}")))
        }
        _ => Err(GatewayError::Malformed(
            "expected a JSON body or a single form field".into(),
        )),
    }
}

#[async_trait]
impl PaymentProvider for WayForPayProvider {
    fn gateway(&self) -> PaymentGateway {
        PaymentGateway::WayForPay
    }

    async fn create_checkout(&self, request: &CheckoutRequest<'_>) -> Result<Checkout, GatewayError> {
        let (account, secret) = self.credentials()?;

        let order_date = request.created_at.timestamp().to_string();
        let amount = request.amount.to_compact_string();
        let currency = request.currency.as_str();

        let signature = sign(
            secret,
            &[
                account,
                &self.merchant_domain,
                request.order_id,
                &order_date,
                &amount,
                currency,
                request.description,
                "1",
                &amount,
            ],
        );

        let fields = [
            ("merchantAccount", account.to_string()),
            ("merchantDomainName", self.merchant_domain.clone()),
            ("merchantTransactionSecureType", "AUTO".to_string()),
            ("merchantSignature", signature),
            ("orderReference", request.order_id.to_string()),
            ("orderDate", order_date),
            ("amount", amount.clone()),
            ("currency", currency.to_string()),
            ("productName[]", request.description.to_string()),
            ("productCount[]", "1".to_string()),
            ("productPrice[]", amount),
            ("serviceUrl", self.service_url.clone()),
            (
                "returnUrl",
                format!("{}?order_id={}", self.return_url, request.order_id),
            ),
        ];

        Ok(Checkout {
            checkout_url: self.checkout_url.clone(),
            form_fields: fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect::<BTreeMap<_, _>>(),
            invoice_id: None,
        })
    }

    fn verify_callback(&self, request: CallbackRequest<'_>) -> Result<GatewayNotification, GatewayError> {
        let (_, secret) = self.credentials()?;
        let payload = decode_body(request.body)?;

        let values: Vec<String> = CALLBACK_SIGNED_FIELDS
            .iter()
            .map(|field| scalar_to_string(payload.get(*field)))
            .collect();
        let parts: Vec<&str> = values.iter().map(String::as_str).collect();
        let expected = sign(secret, &parts);

        let received = scalar_to_string(payload.get("merchantSignature"));
        if !constant_time_eq(expected.as_bytes(), received.to_ascii_lowercase().as_bytes()) {
            return Err(GatewayError::InvalidSignature);
        }

        let gateway_status = scalar_to_string(payload.get("transactionStatus"));

        Ok(GatewayNotification {
            order_id: non_empty_scalar(payload.get("orderReference")),
            invoice_id: None,
            status: map_status(&gateway_status),
            gateway_status,
            payload,
        })
    }

    fn acknowledge(&self, notification: &GatewayNotification) -> Option<serde_json::Value> {
        let secret = self.secret_key.as_deref()?;
        let order_reference = notification.order_id.clone().unwrap_or_default();
        Some(accept_response(secret, &order_reference, Utc::now().timestamp()))
    }
}

/// The signed `accept` reply for a callback.
pub fn accept_response(secret: &str, order_reference: &str, time: i64) -> serde_json::Value {
    let time_str = time.to_string();
    json!({
        "orderReference": order_reference,
        "status": "accept",
        "time": time,
        "signature": sign(secret, &[order_reference, "accept", &time_str]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LiqPaySettings, MonobankSettings, WayForPaySettings};
    use crate::domain::{Amount, Currency};
    use chrono::TimeZone;
    use test_case::test_case;

    fn provider() -> WayForPayProvider {
        WayForPayProvider::new(&PaymentSettings {
            public_base_url: "https://rehab.example".into(),
            liqpay: LiqPaySettings {
                public_key: None,
                private_key: None,
                checkout_url: String::new(),
                sandbox: false,
            },
            monobank: MonobankSettings {
                token: None,
                public_key: None,
                api_url: String::new(),
            },
            wayforpay: WayForPaySettings {
                merchant_account: Some("test_merch_n1".into()),
                secret_key: Some("secret".into()),
                merchant_domain: "rehab.example".into(),
                checkout_url: "https://secure.wayforpay.com/pay".into(),
            },
        })
    }

    fn signed_callback(status: &str) -> serde_json::Value {
        let mut body = json!({
            "merchantAccount": "test_merch_n1",
            "orderReference": "wfp-1",
            "amount": 150.5,
            "currency": "UAH",
            "authCode": "541963",
            "cardPan": "41****8217",
            "transactionStatus": status,
            "reasonCode": 1100,
        });
        let signature = sign(
            "secret",
            &["test_merch_n1", "wfp-1", "150.5", "UAH", "541963", "41****8217", status, "1100"],
        );
        body["merchantSignature"] = json!(signature);
        body
    }

    #[test]
    fn signature_matches_reference_vector() {
        let signature = sign(
            "flk3409refn54t54t*FNJRET",
            &[
                "test_merch_n1",
                "www.market.ua",
                "DH783023",
                "1415379863",
                "1547.36",
                "UAH",
                "Product",
                "1",
                "1547.36",
            ],
        );
        assert_eq!(signature, "f45a96f84daeba1487c95e28ec5339b3");
    }

    #[test_case("Approved", DonationStatus::Success)]
    #[test_case("Declined", DonationStatus::Failure)]
    #[test_case("Refunded", DonationStatus::Failure)]
    #[test_case("Voided", DonationStatus::Failure)]
    #[test_case("RefundInProcessing", DonationStatus::Failure)]
    #[test_case("Expired", DonationStatus::Expired)]
    #[test_case("InProcessing", DonationStatus::Processing)]
    #[test_case("WaitingAuthComplete", DonationStatus::Processing)]
    fn maps_status_vocabulary(status: &str, expected: DonationStatus) {
        assert_eq!(map_status(status), expected);
    }

    #[tokio::test]
    async fn purchase_form_is_signed() {
        let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let checkout = provider()
            .create_checkout(&CheckoutRequest {
                order_id: "wfp-1",
                amount: Amount::from_minor(15050).unwrap(),
                currency: Currency::Uah,
                description: "Donation",
                created_at,
            })
            .await
            .unwrap();

        let fields = &checkout.form_fields;
        let order_date = created_at.timestamp().to_string();
        assert_eq!(fields["amount"], "150.5");
        assert_eq!(fields["orderDate"], order_date);
        assert_eq!(
            fields["merchantSignature"],
            sign(
                "secret",
                &["test_merch_n1", "rehab.example", "wfp-1", &order_date, "150.5", "UAH", "Donation", "1", "150.5"]
            )
        );
    }

    #[test]
    fn verifies_raw_json_callback() {
        let body = signed_callback("Approved").to_string();
        let notification = provider()
            .verify_callback(CallbackRequest {
                body: body.as_bytes(),
                signature: None,
            })
            .unwrap();

        assert_eq!(notification.status, DonationStatus::Success);
        assert_eq!(notification.order_id.as_deref(), Some("wfp-1"));
        assert_eq!(notification.invoice_id, None);
    }

    #[test]
    fn verifies_whole_amount_sent_with_decimals() {
        let signature = sign(
            "secret",
            &["test_merch_n1", "wfp-2", "100", "UAH", "541963", "41****8217", "Approved", "1100"],
        );
        let body = format!(
            r#"{{"merchantAccount":"test_merch_n1","orderReference":"wfp-2","amount":100.00,"currency":"UAH","authCode":"541963","cardPan":"41****8217","transactionStatus":"Approved","reasonCode":1100,"merchantSignature":"{signature}"}}"#
        );

        let notification = provider()
            .verify_callback(CallbackRequest {
                body: body.as_bytes(),
                signature: None,
            })
            .unwrap();

        assert_eq!(notification.status, DonationStatus::Success);
        assert_eq!(notification.order_id.as_deref(), Some("wfp-2"));
    }

    #[test]
    fn verifies_json_posted_as_form_key() {
        let json = signed_callback("Declined").to_string();
        let body = serde_urlencoded::to_string([(json.as_str(), "")]).unwrap();

        let notification = provider()
            .verify_callback(CallbackRequest {
                body: body.as_bytes(),
                signature: None,
            })
            .unwrap();

        assert_eq!(notification.status, DonationStatus::Failure);
    }

    #[test]
    fn rejects_forged_status() {
        let mut body = signed_callback("Declined");
        body["transactionStatus"] = json!("Approved");
        let body = body.to_string();

        let result = provider().verify_callback(CallbackRequest {
            body: body.as_bytes(),
            signature: None,
        });

        assert!(matches!(result, Err(GatewayError::InvalidSignature)));
    }

    #[test]
    fn accept_response_is_signed() {
        let response = accept_response("secret", "wfp-1", 1_700_000_000);
        assert_eq!(response["status"], "accept");
        assert_eq!(response["time"], 1_700_000_000);
        assert_eq!(response["signature"], "9b65b59eded8db5486f62314974081d6");
    }
}
