//! Amounts of money in minor units.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest single donation accepted, in minor units (1,000,000.00).
pub const MAX_AMOUNT_MINOR: i64 = 100_000_000;

/// Currencies the payment gateways accept for donations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Uah,
    Usd,
    Eur,
    Pln,
}

impl Currency {
    pub fn parse(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "UAH" => Some(Self::Uah),
            "USD" => Some(Self::Usd),
            "EUR" => Some(Self::Eur),
            "PLN" => Some(Self::Pln),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uah => "UAH",
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Pln => "PLN",
        }
    }

    /// ISO 4217 numeric code, as Monobank expects it.
    pub fn iso_numeric(&self) -> u16 {
        match self {
            Self::Uah => 980,
            Self::Usd => 840,
            Self::Eur => 978,
            Self::Pln => 985,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A positive amount in minor units (kopecks, cents, grosze).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(i64);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Amount must be greater than zero")]
    NotPositive,
    #[error("Amount exceeds the maximum allowed donation")]
    TooLarge,
    #[error("Amount must be a number with at most two decimal places")]
    Malformed,
}

impl Amount {
    pub fn from_minor(minor: i64) -> Result<Self, AmountError> {
        if minor <= 0 {
            Err(AmountError::NotPositive)
        } else if minor > MAX_AMOUNT_MINOR {
            Err(AmountError::TooLarge)
        } else {
            Ok(Self(minor))
        }
    }

    /// Convert a decimal major-unit amount (as sent by the donation form)
    /// into minor units. More than two decimal places is rejected.
    pub fn from_major(major: f64) -> Result<Self, AmountError> {
        if !major.is_finite() {
            return Err(AmountError::Malformed);
        }
        let scaled = major * 100.0;
        let minor = scaled.round();
        if (scaled - minor).abs() > 1e-6 {
            return Err(AmountError::Malformed);
        }
        Self::from_minor(minor as i64)
    }

    pub fn minor(&self) -> i64 {
        self.0
    }

    /// Major units with exactly two decimals, e.g. `"150.50"`.
    pub fn to_decimal_string(&self) -> String {
        format!("{}.{:02}", self.0 / 100, self.0 % 100)
    }

    /// Major units with trailing zero decimals dropped, e.g. `"150"` or
    /// `"150.5"`. WayForPay signs amounts in this form.
    pub fn to_compact_string(&self) -> String {
        let whole = self.0 / 100;
        let frac = self.0 % 100;
        if frac == 0 {
            whole.to_string()
        } else if frac % 10 == 0 {
            format!("{}.{}", whole, frac / 10)
        } else {
            format!("{}.{:02}", whole, frac)
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_decimal_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(150.0, 15000)]
    #[test_case(150.5, 15050)]
    #[test_case(0.01, 1)]
    #[test_case(19.99, 1999)]
    fn converts_major_to_minor(major: f64, minor: i64) {
        assert_eq!(Amount::from_major(major).unwrap().minor(), minor);
    }

    #[test]
    fn rejects_non_positive_fractional_and_huge_amounts() {
        assert_eq!(Amount::from_major(0.0), Err(AmountError::NotPositive));
        assert_eq!(Amount::from_major(-5.0), Err(AmountError::NotPositive));
        assert_eq!(Amount::from_major(1.234), Err(AmountError::Malformed));
        assert_eq!(Amount::from_major(f64::NAN), Err(AmountError::Malformed));
        assert_eq!(Amount::from_major(2_000_000.0), Err(AmountError::TooLarge));
    }

    #[test]
    fn formats_decimal_and_compact_forms() {
        let amount = Amount::from_minor(15050).unwrap();
        assert_eq!(amount.to_decimal_string(), "150.50");
        assert_eq!(amount.to_compact_string(), "150.5");
        assert_eq!(Amount::from_minor(15000).unwrap().to_compact_string(), "150");
        assert_eq!(Amount::from_minor(15005).unwrap().to_compact_string(), "150.05");
    }

    #[test]
    fn currency_codes_round_trip() {
        for currency in [Currency::Uah, Currency::Usd, Currency::Eur, Currency::Pln] {
            assert_eq!(Currency::parse(currency.as_str()), Some(currency));
        }
        assert_eq!(Currency::parse("uah"), Some(Currency::Uah));
        assert_eq!(Currency::Uah.iso_numeric(), 980);
    }
}
