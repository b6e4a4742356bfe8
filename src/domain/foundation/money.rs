//! Money value objects.
//!
//! Amounts are integer minor units. The JSON boundary speaks major-unit
//! decimals; conversion happens once, in `from_major` / `as_major`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Supported settlement currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Inr,
    Usd,
    Eur,
    Gbp,
}

impl Currency {
    /// ISO 4217 code.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Inr => "INR",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
        }
    }

    /// Granularity, in minor units, that charged totals are rounded to.
    ///
    /// INR totals are whole rupees; the rest are charged to the cent.
    pub fn rounding_step(&self) -> i64 {
        match self {
            Currency::Inr => 100,
            Currency::Usd | Currency::Eur | Currency::Gbp => 1,
        }
    }

    pub fn minor_per_major(&self) -> i64 {
        100
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INR" => Ok(Currency::Inr),
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "GBP" => Ok(Currency::Gbp),
            other => Err(ValidationError::invalid_format(
                "currency",
                format!("unsupported currency '{}'", other),
            )),
        }
    }
}

/// An amount in a specific currency, stored as minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    minor: i64,
    currency: Currency,
}

impl Money {
    pub fn from_minor(minor: i64, currency: Currency) -> Self {
        Self { minor, currency }
    }

    pub fn zero(currency: Currency) -> Self {
        Self::from_minor(0, currency)
    }

    /// Converts a major-unit decimal (e.g. `499.0`) to minor units.
    ///
    /// Rejects negative, NaN and infinite input.
    pub fn from_major(major: f64, currency: Currency) -> Result<Self, ValidationError> {
        if !major.is_finite() || major < 0.0 {
            return Err(ValidationError::invalid_format(
                "amount",
                "must be a non-negative number",
            ));
        }
        let minor = (major * currency.minor_per_major() as f64).round();
        if minor > i64::MAX as f64 {
            return Err(ValidationError::invalid_format("amount", "too large"));
        }
        Ok(Self::from_minor(minor as i64, currency))
    }

    pub fn minor(&self) -> i64 {
        self.minor
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn as_major(&self) -> f64 {
        self.minor as f64 / self.currency.minor_per_major() as f64
    }

    pub fn is_zero(&self) -> bool {
        self.minor == 0
    }

    /// Subtracts `other`, flooring at zero. Currencies must match.
    pub fn saturating_sub(&self, other: Money) -> Money {
        debug_assert_eq!(self.currency, other.currency);
        Money::from_minor((self.minor - other.minor).max(0), self.currency)
    }

    /// Rounds half-up to the currency's rounding step.
    pub fn rounded(&self) -> Money {
        let step = self.currency.rounding_step();
        Money::from_minor(round_half_up(self.minor as i128, step as i128) as i64 * step, self.currency)
    }

    /// Relative difference against `other`, as a fraction of `self`.
    ///
    /// A zero reference only matches another zero.
    pub fn relative_difference(&self, other: Money) -> f64 {
        if self.minor == 0 {
            return if other.minor == 0 { 0.0 } else { f64::INFINITY };
        }
        ((self.minor - other.minor).abs() as f64) / (self.minor.abs() as f64)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} {}", self.as_major(), self.currency)
    }
}

/// Divides `numerator` by `divisor`, rounding halves away from zero for
/// non-negative input. `divisor` must be positive.
pub(crate) fn round_half_up(numerator: i128, divisor: i128) -> i128 {
    (numerator * 2 + divisor) / (divisor * 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_parses_case_insensitively() {
        assert_eq!("inr".parse::<Currency>().unwrap(), Currency::Inr);
        assert_eq!(" Usd ".parse::<Currency>().unwrap(), Currency::Usd);
        assert!("JPY".parse::<Currency>().is_err());
    }

    #[test]
    fn currency_serializes_as_iso_code() {
        assert_eq!(serde_json::to_string(&Currency::Gbp).unwrap(), "\"GBP\"");
        let c: Currency = serde_json::from_str("\"EUR\"").unwrap();
        assert_eq!(c, Currency::Eur);
    }

    #[test]
    fn from_major_converts_to_minor_units() {
        let m = Money::from_major(499.0, Currency::Inr).unwrap();
        assert_eq!(m.minor(), 49_900);
        let m = Money::from_major(9.99, Currency::Usd).unwrap();
        assert_eq!(m.minor(), 999);
    }

    #[test]
    fn from_major_rejects_negative_and_nan() {
        assert!(Money::from_major(-1.0, Currency::Usd).is_err());
        assert!(Money::from_major(f64::NAN, Currency::Usd).is_err());
    }

    #[test]
    fn inr_rounds_to_whole_rupees() {
        assert_eq!(Money::from_minor(39_920, Currency::Inr).rounded().minor(), 39_900);
        assert_eq!(Money::from_minor(39_950, Currency::Inr).rounded().minor(), 40_000);
    }

    #[test]
    fn usd_rounding_is_identity() {
        assert_eq!(Money::from_minor(1_234, Currency::Usd).rounded().minor(), 1_234);
    }

    #[test]
    fn relative_difference_is_fraction_of_reference() {
        let a = Money::from_minor(10_000, Currency::Usd);
        let b = Money::from_minor(10_050, Currency::Usd);
        assert!((a.relative_difference(b) - 0.005).abs() < 1e-9);
    }

    #[test]
    fn saturating_sub_floors_at_zero() {
        let a = Money::from_minor(100, Currency::Usd);
        let b = Money::from_minor(500, Currency::Usd);
        assert!(a.saturating_sub(b).is_zero());
    }

    #[test]
    fn round_half_up_rounds_halves_upward() {
        assert_eq!(round_half_up(5, 10), 1);
        assert_eq!(round_half_up(4, 10), 0);
        assert_eq!(round_half_up(15, 10), 2);
    }
}
