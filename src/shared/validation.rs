//! Validation Utilities

use validator::{Validate, ValidationErrors};

use super::error::{AppError, FieldError};

/// Convert validation errors to AppError
pub fn validation_error(errors: ValidationErrors) -> AppError {
    let mut field_errors: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| FieldError {
                field: field.to_string(),
                message: e
                    .message
                    .clone()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string()),
            })
        })
        .collect();

    // HashMap iteration order is unstable; keep responses deterministic.
    field_errors.sort_by(|a, b| a.field.cmp(&b.field));

    AppError::InvalidFields(field_errors)
}

/// Run `validator` rules on a request body.
pub fn validate<T: Validate>(value: &T) -> Result<(), AppError> {
    value.validate().map_err(validation_error)
}

/// Loose phone check: digits plus the usual separators, 5 to 20 digits.
pub fn validate_phone(phone: &str) -> Result<(), validator::ValidationError> {
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')'));

    if allowed && (5..=20).contains(&digits) {
        Ok(())
    } else {
        let mut err = validator::ValidationError::new("phone");
        err.message = Some("Invalid phone number".into());
        Err(err)
    }
}
