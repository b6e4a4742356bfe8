//! UpdateCartPaymentHandler - Command handler for payment status changes.
//!
//! Every status write is conditional on the status it was computed from.
//! Losing a race means re-reading and re-deciding; a repeat of the status
//! that won is a no-op.

use std::sync::Arc;

use crate::domain::cart::{Cart, CheckoutError, PaymentChange, PaymentStatus, Transition};
use crate::domain::foundation::{CartId, Timestamp};
use crate::ports::{CartRepository, CasOutcome};

use super::{CompletionEffects, SoftFailures};

/// Conditional write attempts before giving up.
const MAX_CAS_ATTEMPTS: usize = 3;

/// Command to change a cart's payment status.
#[derive(Debug, Clone)]
pub struct UpdateCartPaymentCommand {
    pub cart_id: CartId,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub payment_method: Option<String>,
}

impl UpdateCartPaymentCommand {
    pub fn new(cart_id: CartId, change: PaymentChange) -> Self {
        Self {
            cart_id,
            status: change.status,
            transaction_id: change.transaction_id,
            payment_method: change.payment_method,
        }
    }

    fn change(&self) -> PaymentChange {
        PaymentChange {
            status: self.status,
            transaction_id: self.transaction_id.clone(),
            payment_method: self.payment_method.clone(),
        }
    }
}

/// Result of a payment update.
#[derive(Debug, Clone)]
pub struct UpdateCartPaymentResult {
    /// The cart as stored after the update.
    pub cart: Cart,
    pub transition: Transition,
    pub soft: SoftFailures,
}

/// Handler for payment status changes.
pub struct UpdateCartPaymentHandler {
    carts: Arc<dyn CartRepository>,
    effects: CompletionEffects,
}

impl UpdateCartPaymentHandler {
    pub fn new(carts: Arc<dyn CartRepository>, effects: CompletionEffects) -> Self {
        Self { carts, effects }
    }

    pub async fn handle(
        &self,
        cmd: UpdateCartPaymentCommand,
    ) -> Result<UpdateCartPaymentResult, CheckoutError> {
        let mut current = self
            .carts
            .find_by_id(&cmd.cart_id)
            .await?
            .ok_or(CheckoutError::CartNotFound(cmd.cart_id))?;

        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let now = Timestamp::now();
            let expected = current.payment.status;

            // 1. Decide against the latest known state
            let mut next = current.clone();
            let transition = next.apply_payment(cmd.change(), now)?;
            if transition == Transition::Unchanged {
                tracing::debug!(cart_id = %cmd.cart_id, status = %expected, "Payment status unchanged");
                return Ok(UpdateCartPaymentResult {
                    cart: current,
                    transition,
                    soft: SoftFailures::default(),
                });
            }

            // 2. Token travels with the status write
            self.effects.mint_if_absent(&mut next, now)?;

            // 3. Conditional write
            match self.carts.compare_and_swap_status(expected, &next).await? {
                CasOutcome::Applied(stored) => {
                    tracing::info!(
                        cart_id = %stored.id,
                        from = %expected,
                        to = %stored.payment.status,
                        "Payment status updated"
                    );
                    let soft = if stored.is_completed() {
                        self.effects.after_completion(&stored).await
                    } else {
                        SoftFailures::default()
                    };
                    return Ok(UpdateCartPaymentResult {
                        cart: stored,
                        transition,
                        soft,
                    });
                }
                CasOutcome::Rejected(latest) => {
                    tracing::debug!(
                        cart_id = %cmd.cart_id,
                        attempt,
                        expected = %expected,
                        actual = %latest.payment.status,
                        "Concurrent payment update, re-evaluating"
                    );
                    current = latest;
                }
                CasOutcome::NotFound => return Err(CheckoutError::CartNotFound(cmd.cart_id)),
            }
        }

        tracing::warn!(cart_id = %cmd.cart_id, "Payment update kept losing to concurrent writes");
        Err(CheckoutError::infrastructure(
            "cart is being updated concurrently, retry later",
        ))
    }
}
