//! CreateGatewayOrderHandler - Command handler for opening a gateway order.
//!
//! A failed or cancelled cart is moved back to pending first, through the
//! same conditional write as every other status change.

use std::sync::Arc;

use crate::domain::cart::{Cart, CheckoutError, PaymentChange, PaymentStatus};
use crate::domain::foundation::{CartId, Timestamp};
use crate::ports::{
    CartRepository, CasOutcome, GatewayOrder, GatewayOrderRequest, GatewayRegistry,
};

#[derive(Debug, Clone)]
pub struct CreateGatewayOrderCommand {
    pub cart_id: CartId,
}

#[derive(Debug, Clone)]
pub struct CreateGatewayOrderResult {
    pub cart: Cart,
    pub order: GatewayOrder,
}

pub struct CreateGatewayOrderHandler {
    carts: Arc<dyn CartRepository>,
    gateways: GatewayRegistry,
}

impl CreateGatewayOrderHandler {
    pub fn new(carts: Arc<dyn CartRepository>, gateways: GatewayRegistry) -> Self {
        Self { carts, gateways }
    }

    pub async fn handle(
        &self,
        cmd: CreateGatewayOrderCommand,
    ) -> Result<CreateGatewayOrderResult, CheckoutError> {
        // 1. Load and make sure there is something to pay
        let cart = self
            .carts
            .find_by_id(&cmd.cart_id)
            .await?
            .ok_or(CheckoutError::CartNotFound(cmd.cart_id))?;
        cart.ensure_resumable()?;
        if !cart.requires_payment() {
            return Err(CheckoutError::validation("cartId", "cart does not require payment"));
        }

        // 2. Retrying after a failure re-opens the cart
        let mut cart = self.reopen(cart).await?;

        // 3. Open the order; failure leaves the cart as it was
        let request = GatewayOrderRequest {
            cart_id: cart.id,
            payment_id: cart.payment.payment_id.clone(),
            amount: cart.payment.total_amount,
            description: format!(
                "{} plan ({})",
                cart.subscription.plan, cart.subscription.billing_cycle
            ),
            customer_email: cart.user.email.clone(),
        };
        let gateway = self.gateways.get(cart.payment.gateway);
        let order = gateway.create_order(&request).await.map_err(|e| {
            tracing::warn!(
                cart_id = %cart.id,
                gateway = %cart.payment.gateway,
                error = %e,
                retryable = e.is_retryable(),
                "Gateway order creation failed"
            );
            CheckoutError::gateway(e.message)
        })?;

        // 4. Remember the gateway's reference
        cart.record_gateway_order(order.id.clone(), Timestamp::now())?;
        self.carts.update(&cart).await?;

        tracing::info!(cart_id = %cart.id, order_id = %order.id, "Gateway order opened");
        Ok(CreateGatewayOrderResult { cart, order })
    }

    async fn reopen(&self, cart: Cart) -> Result<Cart, CheckoutError> {
        if cart.payment.status == PaymentStatus::Pending {
            return Ok(cart);
        }
        let expected = cart.payment.status;
        let mut next = cart.clone();
        next.apply_payment(PaymentChange::to(PaymentStatus::Pending), Timestamp::now())?;

        match self.carts.compare_and_swap_status(expected, &next).await? {
            CasOutcome::Applied(stored) => {
                tracing::info!(cart_id = %stored.id, from = %expected, "Cart reopened for retry");
                Ok(stored)
            }
            CasOutcome::Rejected(latest) => {
                latest.ensure_resumable()?;
                Ok(latest)
            }
            CasOutcome::NotFound => Err(CheckoutError::CartNotFound(cart.id)),
        }
    }
}
