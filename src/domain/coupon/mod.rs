//! Coupon domain module.
//!
//! - `coupon` - Coupon entity and rejection reasons
//! - `evaluator` - Validation order and discount arithmetic

mod coupon;
mod evaluator;

pub use coupon::{Coupon, CouponKind, CouponRejection};
pub use evaluator::{CouponEvaluator, DiscountBreakdown};
