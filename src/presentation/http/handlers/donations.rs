//! Donation Handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::request::{CreateDonationRequest, DonationsQuery};
use crate::application::dto::response::{ApiResponse, DonationStatusResponse};
use crate::application::services::{CreateDonationDto, DonationCheckoutDto, PaymentService};
use crate::domain::{Amount, Currency, Donation, DonationFilter, DonationStatus, DonationTotals, PaymentGateway};
use crate::presentation::http::extractors::ValidatedJson;
use crate::shared::error::AppError;
use crate::startup::AppState;

fn parse_gateway(value: &str) -> Result<PaymentGateway, AppError> {
    PaymentGateway::parse(value).ok_or_else(|| {
        AppError::Validation(format!(
            "Unknown gateway '{}', expected liqpay, monobank or wayforpay",
            value
        ))
    })
}

fn parse_currency(value: Option<&str>) -> Result<Currency, AppError> {
    match value {
        None => Ok(Currency::Uah),
        Some(code) => Currency::parse(code).ok_or_else(|| {
            AppError::Validation(format!(
                "Unsupported currency '{}', expected UAH, USD, EUR or PLN",
                code
            ))
        }),
    }
}

/// Start a donation and return the gateway checkout
pub async fn create_donation(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<CreateDonationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<DonationCheckoutDto>>), AppError> {
    let request = CreateDonationDto {
        amount: Amount::from_major(body.amount).map_err(|e| AppError::Validation(e.to_string()))?,
        currency: parse_currency(body.currency.as_deref())?,
        gateway: parse_gateway(&body.gateway)?,
        donor_name: body.donor_name,
        donor_email: body.donor_email,
        comment: body.comment,
    };

    let checkout = state.payment_service().create_donation(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(checkout))))
}

/// Poll a donation by order id
pub async fn donation_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<ApiResponse<DonationStatusResponse>>, AppError> {
    let donation = state.payment_service().donation_status(&order_id).await?;
    Ok(Json(ApiResponse::ok(DonationStatusResponse::from(donation))))
}

/// List donations (admin)
pub async fn list_donations(
    State(state): State<AppState>,
    Query(query): Query<DonationsQuery>,
) -> Result<Json<ApiResponse<Vec<Donation>>>, AppError> {
    let status = query
        .status
        .as_deref()
        .map(|s| {
            DonationStatus::parse(s)
                .ok_or_else(|| AppError::Validation(format!("Unknown donation status '{}'", s)))
        })
        .transpose()?;

    let filter = DonationFilter {
        status,
        gateway: query.gateway.as_deref().map(parse_gateway).transpose()?,
        limit: query.limit.unwrap_or(50),
        offset: query.offset.unwrap_or(0),
    };

    let donations = state.payment_service().list_donations(filter).await?;
    Ok(Json(ApiResponse::ok(donations)))
}

/// Totals per status and currency (admin)
pub async fn donation_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<DonationTotals>>>, AppError> {
    let totals = state.payment_service().donation_stats().await?;
    Ok(Json(ApiResponse::ok(totals)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn currency_defaults_to_hryvnia() {
        assert_eq!(parse_currency(None).unwrap(), Currency::Uah);
    }

    #[test_case("usd" ; "lowercase")]
    #[test_case("USD" ; "uppercase")]
    fn currency_codes_are_case_insensitive(code: &str) {
        assert_eq!(parse_currency(Some(code)).unwrap(), Currency::Usd);
    }

    #[test]
    fn unknown_currency_is_rejected() {
        assert!(matches!(parse_currency(Some("BTC")), Err(AppError::Validation(_))));
    }

    #[test]
    fn unknown_gateway_is_rejected() {
        assert!(matches!(parse_gateway("paypal"), Err(AppError::Validation(_))));
    }
}
