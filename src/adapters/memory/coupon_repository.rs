//! In-memory coupon repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::coupon::Coupon;
use crate::domain::foundation::DomainError;
use crate::ports::CouponRepository;

#[derive(Debug, Clone, Default)]
pub struct InMemoryCouponRepository {
    coupons: Arc<RwLock<HashMap<String, Coupon>>>,
}

impl InMemoryCouponRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_coupons(coupons: impl IntoIterator<Item = Coupon>) -> Self {
        let map = coupons
            .into_iter()
            .map(|c| (Coupon::normalize_code(&c.code), c))
            .collect();
        Self {
            coupons: Arc::new(RwLock::new(map)),
        }
    }

    pub async fn insert(&self, coupon: Coupon) {
        self.coupons
            .write()
            .await
            .insert(Coupon::normalize_code(&coupon.code), coupon);
    }
}

#[async_trait]
impl CouponRepository for InMemoryCouponRepository {
    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, DomainError> {
        let coupons = self.coupons.read().await;
        Ok(coupons.get(&Coupon::normalize_code(code)).cloned())
    }

    async fn record_redemption(&self, code: &str) -> Result<bool, DomainError> {
        let mut coupons = self.coupons.write().await;
        let Some(coupon) = coupons.get_mut(&Coupon::normalize_code(code)) else {
            return Ok(false);
        };
        if let Some(limit) = coupon.usage_limit {
            if coupon.used_count >= limit {
                return Ok(false);
            }
        }
        coupon.used_count += 1;
        Ok(true)
    }
}
