//! Coupon entity.
//!
//! Codes are case-insensitive and stored uppercase.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{Currency, Timestamp, ValidationError};

/// How a coupon discounts an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CouponKind {
    /// Percent off the base amount, 1..=100.
    Percentage { percent: u8 },
    /// Fixed amount off, in minor units of the order currency.
    FixedAmount { amount: i64 },
}

/// Why a coupon could not be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponRejection {
    InvalidCode,
    NotActive,
    UsageLimitReached,
    MinimumOrderNotMet,
    CurrencyMismatch,
}

impl CouponRejection {
    pub fn reason(&self) -> &'static str {
        match self {
            CouponRejection::InvalidCode => "invalid code",
            CouponRejection::NotActive => "expired/not active",
            CouponRejection::UsageLimitReached => "usage limit reached",
            CouponRejection::MinimumOrderNotMet => "minimum order not met",
            CouponRejection::CurrencyMismatch => "not valid for this currency",
        }
    }
}

impl fmt::Display for CouponRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// A redeemable coupon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub code: String,
    pub kind: CouponKind,
    /// Cap on the discount, in minor units.
    pub max_discount: Option<i64>,
    /// Smallest base amount the coupon applies to, in minor units.
    pub min_order_amount: Option<i64>,
    /// Restricts the coupon to one currency when set.
    pub currency: Option<Currency>,
    pub start_date: Timestamp,
    pub expires_at: Timestamp,
    pub usage_limit: Option<u32>,
    pub used_count: u32,
    pub is_active: bool,
}

impl Coupon {
    /// Canonical form of a user-entered code.
    pub fn normalize_code(code: &str) -> String {
        code.trim().to_uppercase()
    }

    /// Builds an active, unused coupon.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for an empty code, a percentage outside
    /// 1..=100, a non-positive fixed amount, or an empty date window.
    pub fn new(
        code: &str,
        kind: CouponKind,
        start_date: Timestamp,
        expires_at: Timestamp,
    ) -> Result<Self, ValidationError> {
        let code = Self::normalize_code(code);
        if code.is_empty() {
            return Err(ValidationError::empty_field("code"));
        }
        match kind {
            CouponKind::Percentage { percent } if !(1..=100).contains(&percent) => {
                return Err(ValidationError::out_of_range("value", 1, 100, percent as i64));
            }
            CouponKind::FixedAmount { amount } if amount <= 0 => {
                return Err(ValidationError::out_of_range("value", 1, i64::MAX, amount));
            }
            _ => {}
        }
        if !start_date.is_before(&expires_at) {
            return Err(ValidationError::invalid_format(
                "expiresAt",
                "must be after startDate",
            ));
        }

        Ok(Self {
            code,
            kind,
            max_discount: None,
            min_order_amount: None,
            currency: None,
            start_date,
            expires_at,
            usage_limit: None,
            used_count: 0,
            is_active: true,
        })
    }

    pub fn with_max_discount(mut self, minor: i64) -> Self {
        self.max_discount = Some(minor);
        self
    }

    pub fn with_min_order(mut self, minor: i64) -> Self {
        self.min_order_amount = Some(minor);
        self
    }

    pub fn with_usage_limit(mut self, limit: u32) -> Self {
        self.usage_limit = Some(limit);
        self
    }

    pub fn for_currency(mut self, currency: Currency) -> Self {
        self.currency = Some(currency);
        self
    }

    /// Checks activity, date window and usage limit, in that order.
    pub fn check_usable(&self, now: Timestamp) -> Result<(), CouponRejection> {
        if !self.is_active || now.is_before(&self.start_date) || now.is_after(&self.expires_at) {
            return Err(CouponRejection::NotActive);
        }
        if let Some(limit) = self.usage_limit {
            if self.used_count >= limit {
                return Err(CouponRejection::UsageLimitReached);
            }
        }
        Ok(())
    }
}
