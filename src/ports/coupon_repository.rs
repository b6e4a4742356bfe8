//! Coupon repository port.

use async_trait::async_trait;

use crate::domain::coupon::Coupon;
use crate::domain::foundation::DomainError;

/// Port for coupon lookup and redemption tracking.
#[async_trait]
pub trait CouponRepository: Send + Sync {
    /// Finds a coupon by code. Codes are matched case-insensitively.
    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, DomainError>;

    /// Increments the usage count of a coupon.
    ///
    /// Called once per cart, when it completes. Returns `false` if the
    /// coupon is unknown or its usage limit was reached in the meantime.
    async fn record_redemption(&self, code: &str) -> Result<bool, DomainError>;
}
