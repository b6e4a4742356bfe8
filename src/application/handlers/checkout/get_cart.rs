//! GetCartHandler - Query handler for a cart by id.

use std::sync::Arc;

use crate::domain::cart::{Cart, CheckoutError};
use crate::domain::foundation::CartId;
use crate::ports::CartRepository;

/// Query for a cart by id.
#[derive(Debug, Clone)]
pub struct GetCartQuery {
    pub cart_id: CartId,
}

pub struct GetCartHandler {
    carts: Arc<dyn CartRepository>,
}

impl GetCartHandler {
    pub fn new(carts: Arc<dyn CartRepository>) -> Self {
        Self { carts }
    }

    pub async fn handle(&self, query: GetCartQuery) -> Result<Cart, CheckoutError> {
        self.carts
            .find_by_id(&query.cart_id)
            .await?
            .ok_or(CheckoutError::CartNotFound(query.cart_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryCartRepository;
    use crate::domain::cart::{new_cart, PlanName};

    #[tokio::test]
    async fn returns_stored_cart() {
        let carts = InMemoryCartRepository::new();
        let cart = new_cart(PlanName::Basic, 49_900);
        carts.save(&cart).await.unwrap();
        let handler = GetCartHandler::new(Arc::new(carts));

        let found = handler.handle(GetCartQuery { cart_id: cart.id }).await.unwrap();

        assert_eq!(found, cart);
    }

    #[tokio::test]
    async fn missing_cart_is_not_found() {
        let handler = GetCartHandler::new(Arc::new(InMemoryCartRepository::new()));
        let id = CartId::new();

        let err = handler.handle(GetCartQuery { cart_id: id }).await.unwrap_err();

        assert_eq!(err, CheckoutError::CartNotFound(id));
    }
}
