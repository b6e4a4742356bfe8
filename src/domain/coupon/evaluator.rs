//! Coupon evaluation.
//!
//! Discounts are computed in hundredths of a minor unit so the single
//! rounding step happens on the final amount. The reported discount is
//! `base - final`, so the two always add back up to the base exactly.

use serde::Serialize;

use crate::domain::foundation::{round_half_up, Money, Timestamp};

use super::{Coupon, CouponKind, CouponRejection};

/// Result of applying a coupon to a base amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiscountBreakdown {
    pub base: Money,
    pub discount: Money,
    pub total: Money,
}

/// Stateless coupon rules.
pub struct CouponEvaluator;

impl CouponEvaluator {
    /// Resolves a looked-up coupon into a usable one.
    ///
    /// Priority: missing, then inactive/outside window, then usage limit.
    pub fn validate(coupon: Option<Coupon>, now: Timestamp) -> Result<Coupon, CouponRejection> {
        let coupon = coupon.ok_or(CouponRejection::InvalidCode)?;
        coupon.check_usable(now)?;
        Ok(coupon)
    }

    /// Computes the discount and rounded total for `base`.
    ///
    /// # Errors
    ///
    /// - `CurrencyMismatch` if the coupon is restricted to another currency
    /// - `MinimumOrderNotMet` if `base` is below the coupon minimum
    pub fn apply(coupon: &Coupon, base: Money) -> Result<DiscountBreakdown, CouponRejection> {
        let currency = base.currency();
        if let Some(restricted) = coupon.currency {
            if restricted != currency {
                return Err(CouponRejection::CurrencyMismatch);
            }
        }
        if let Some(min) = coupon.min_order_amount {
            if base.minor() < min {
                return Err(CouponRejection::MinimumOrderNotMet);
            }
        }

        let base_minor = base.minor() as i128;
        let base_hundredths = base_minor * 100;

        let mut discount_hundredths = match coupon.kind {
            CouponKind::Percentage { percent } => base_minor * percent as i128,
            CouponKind::FixedAmount { amount } => (amount as i128).min(base_minor) * 100,
        };
        if let Some(max) = coupon.max_discount {
            discount_hundredths = discount_hundredths.min(max.max(0) as i128 * 100);
        }
        let discount_hundredths = discount_hundredths.clamp(0, base_hundredths);

        let step = currency.rounding_step() as i128;
        let final_hundredths = base_hundredths - discount_hundredths;
        let total_minor = (round_half_up(final_hundredths, 100 * step) * step).clamp(0, base_minor);

        let total = Money::from_minor(total_minor as i64, currency);
        Ok(DiscountBreakdown {
            base,
            discount: Money::from_minor((base_minor - total_minor) as i64, currency),
            total,
        })
    }
}
