//! LoadCartHandler - Query handler for resuming a checkout.
//!
//! A cart can be resumed until it completes; afterwards it is read-only.

use std::sync::Arc;

use crate::domain::cart::{Cart, CheckoutError};
use crate::domain::foundation::CartId;
use crate::ports::CartRepository;

/// Query to reload a cart for another payment attempt.
#[derive(Debug, Clone)]
pub struct LoadCartQuery {
    pub cart_id: CartId,
}

pub struct LoadCartHandler {
    carts: Arc<dyn CartRepository>,
}

impl LoadCartHandler {
    pub fn new(carts: Arc<dyn CartRepository>) -> Self {
        Self { carts }
    }

    pub async fn handle(&self, query: LoadCartQuery) -> Result<Cart, CheckoutError> {
        let cart = self
            .carts
            .find_by_id(&query.cart_id)
            .await?
            .ok_or(CheckoutError::CartNotFound(query.cart_id))?;
        cart.ensure_resumable()?;
        Ok(cart)
    }
}
