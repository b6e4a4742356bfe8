//! In-memory cart repository.
//!
//! Used by tests and local development. A single write lock covers each
//! conditional write, so compare-and-swap is atomic.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::cart::{Cart, PaymentStatus};
use crate::domain::foundation::{CartId, DomainError, ErrorCode, Timestamp};
use crate::ports::{CartRepository, CasOutcome};

#[derive(Debug, Clone, Default)]
pub struct InMemoryCartRepository {
    carts: Arc<RwLock<HashMap<CartId, Cart>>>,
}

impl InMemoryCartRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored carts.
    pub async fn count(&self) -> usize {
        self.carts.read().await.len()
    }
}

#[async_trait]
impl CartRepository for InMemoryCartRepository {
    async fn save(&self, cart: &Cart) -> Result<(), DomainError> {
        let mut carts = self.carts.write().await;
        if carts.contains_key(&cart.id) {
            return Err(DomainError::new(
                ErrorCode::DatabaseError,
                format!("Cart {} already exists", cart.id),
            ));
        }
        carts.insert(cart.id, cart.clone());
        Ok(())
    }

    async fn update(&self, cart: &Cart) -> Result<(), DomainError> {
        let mut carts = self.carts.write().await;
        let stored = carts.get_mut(&cart.id).ok_or_else(|| {
            DomainError::new(ErrorCode::CartNotFound, format!("Cart not found: {}", cart.id))
        })?;
        stored.user_id = cart.user_id.clone();
        stored.coupon = cart.coupon.clone();
        stored.payment.gateway_order_id = cart.payment.gateway_order_id.clone();
        stored.updated_at = cart.updated_at;
        Ok(())
    }

    async fn find_by_id(&self, id: &CartId) -> Result<Option<Cart>, DomainError> {
        Ok(self.carts.read().await.get(id).cloned())
    }

    async fn find_by_signup_token(&self, token: &str) -> Result<Option<Cart>, DomainError> {
        let carts = self.carts.read().await;
        Ok(carts
            .values()
            .find(|c| c.signup_token.as_deref() == Some(token))
            .cloned())
    }

    async fn compare_and_swap_status(
        &self,
        expected: PaymentStatus,
        cart: &Cart,
    ) -> Result<CasOutcome, DomainError> {
        let mut carts = self.carts.write().await;
        let Some(stored) = carts.get_mut(&cart.id) else {
            return Ok(CasOutcome::NotFound);
        };
        if stored.payment.status != expected {
            return Ok(CasOutcome::Rejected(stored.clone()));
        }

        stored.payment.status = cart.payment.status;
        stored.payment.transaction_id = cart.payment.transaction_id.clone();
        stored.payment.payment_method = cart.payment.payment_method.clone();
        stored.payment.gateway_order_id = cart.payment.gateway_order_id.clone();
        stored.subscription.is_active = cart.subscription.is_active;
        stored.subscription.start_date = cart.subscription.start_date;
        stored.subscription.end_date = cart.subscription.end_date;
        if stored.signup_token.is_none() && cart.signup_token.is_some() {
            stored.signup_token = cart.signup_token.clone();
            stored.token_expiry = cart.token_expiry;
        }
        stored.updated_at = cart.updated_at;
        Ok(CasOutcome::Applied(stored.clone()))
    }

    async fn mark_signup_completed(&self, id: &CartId, at: Timestamp) -> Result<bool, DomainError> {
        let mut carts = self.carts.write().await;
        match carts.get_mut(id) {
            Some(cart) if !cart.is_signup_completed => {
                cart.is_signup_completed = true;
                cart.signup_completed_at = Some(at);
                cart.updated_at = at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
