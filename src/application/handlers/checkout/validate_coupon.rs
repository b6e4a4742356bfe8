//! ValidateCouponHandler - Query handler for coupon checks and previews.

use std::sync::Arc;

use crate::domain::cart::CheckoutError;
use crate::domain::coupon::{Coupon, CouponEvaluator, DiscountBreakdown};
use crate::domain::foundation::{Money, Timestamp};
use crate::ports::CouponRepository;

/// Query to check a coupon, optionally against an amount.
#[derive(Debug, Clone)]
pub struct ValidateCouponQuery {
    pub code: String,
    /// When present, the discount is previewed against this amount.
    pub amount: Option<Money>,
}

#[derive(Debug, Clone)]
pub struct ValidateCouponResult {
    pub coupon: Coupon,
    pub preview: Option<DiscountBreakdown>,
}

pub struct ValidateCouponHandler {
    coupons: Arc<dyn CouponRepository>,
}

impl ValidateCouponHandler {
    pub fn new(coupons: Arc<dyn CouponRepository>) -> Self {
        Self { coupons }
    }

    pub async fn handle(&self, query: ValidateCouponQuery) -> Result<ValidateCouponResult, CheckoutError> {
        let code = query.code.trim();
        if code.is_empty() {
            return Err(CheckoutError::validation("code", "is required"));
        }

        let found = self.coupons.find_by_code(code).await?;
        let coupon = CouponEvaluator::validate(found, Timestamp::now())
            .map_err(|reason| CheckoutError::coupon_rejected(code, reason))?;

        let preview = match query.amount {
            Some(amount) => Some(
                CouponEvaluator::apply(&coupon, amount)
                    .map_err(|reason| CheckoutError::coupon_rejected(code, reason))?,
            ),
            None => None,
        };

        Ok(ValidateCouponResult { coupon, preview })
    }
}
