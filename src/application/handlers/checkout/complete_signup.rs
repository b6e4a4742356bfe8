//! CompleteSignupHandler - Command handler for the signup handoff.

use std::sync::Arc;

use crate::domain::cart::{Cart, CheckoutError};
use crate::domain::foundation::Timestamp;
use crate::domain::signup::{SignupTokenError, SignupTokenService};
use crate::ports::CartRepository;

/// Command to mark a cart's signup as done.
#[derive(Debug, Clone)]
pub struct CompleteSignupCommand {
    pub signup_token: String,
}

/// Handler for completing signup.
pub struct CompleteSignupHandler {
    carts: Arc<dyn CartRepository>,
    tokens: Arc<SignupTokenService>,
}

impl CompleteSignupHandler {
    pub fn new(carts: Arc<dyn CartRepository>, tokens: Arc<SignupTokenService>) -> Self {
        Self { carts, tokens }
    }

    pub async fn handle(&self, cmd: CompleteSignupCommand) -> Result<Cart, CheckoutError> {
        let token = cmd.signup_token.trim();
        if token.is_empty() {
            return Err(CheckoutError::validation("signupToken", "is required"));
        }
        let now = Timestamp::now();

        // 1. Lookup ignores status; the token itself only exists on completed carts
        let mut cart = self
            .carts
            .find_by_signup_token(token)
            .await?
            .ok_or(CheckoutError::SignupTokenNotFound)?;

        // 2. Token must be ours and bound to this cart
        verify_binding(&self.tokens, token, &cart, now)?;

        // 3. Expiry, then already-completed
        cart.complete_signup(now)?;

        // 4. Flip the flag only if nobody beat us to it
        if !self.carts.mark_signup_completed(&cart.id, now).await? {
            return Err(CheckoutError::SignupAlreadyCompleted(cart.id));
        }

        tracing::info!(cart_id = %cart.id, "Signup completed");
        Ok(cart)
    }
}

/// Checks signature, expiry and cart binding of a stored token.
pub(super) fn verify_binding(
    tokens: &SignupTokenService,
    token: &str,
    cart: &Cart,
    now: Timestamp,
) -> Result<(), CheckoutError> {
    let claims = tokens.verify(token, now).map_err(|e| match e {
        SignupTokenError::Expired => CheckoutError::TokenExpired,
        other => {
            tracing::warn!(cart_id = %cart.id, error = %other, "Signup token failed verification");
            CheckoutError::InvalidToken
        }
    })?;
    if claims.cart_id != cart.id {
        tracing::warn!(cart_id = %cart.id, claimed = %claims.cart_id, "Signup token bound to another cart");
        return Err(CheckoutError::InvalidToken);
    }
    Ok(())
}
