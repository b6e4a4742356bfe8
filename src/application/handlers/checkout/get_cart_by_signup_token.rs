//! GetCartBySignupTokenHandler - Query handler for token lookups.
//!
//! Two callers, two rules:
//!
//! - Partners reading a purchase see completed carts only
//! - The signup flow sees any cart holding the token, but is told when
//!   the token expired or was already used

use std::sync::Arc;

use crate::domain::cart::{Cart, CheckoutError};
use crate::domain::foundation::Timestamp;
use crate::domain::signup::SignupTokenService;
use crate::ports::CartRepository;

use super::complete_signup::verify_binding;

/// Which caller is asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupLookup {
    /// Completed carts only.
    CompletedOnly,
    /// Any status; rejects used or expired tokens.
    ForSignup,
}

/// Query for a cart by signup token.
#[derive(Debug, Clone)]
pub struct GetCartBySignupTokenQuery {
    pub token: String,
    pub lookup: SignupLookup,
}

pub struct GetCartBySignupTokenHandler {
    carts: Arc<dyn CartRepository>,
    tokens: Arc<SignupTokenService>,
}

impl GetCartBySignupTokenHandler {
    pub fn new(carts: Arc<dyn CartRepository>, tokens: Arc<SignupTokenService>) -> Self {
        Self { carts, tokens }
    }

    pub async fn handle(&self, query: GetCartBySignupTokenQuery) -> Result<Cart, CheckoutError> {
        let token = query.token.trim();
        if token.is_empty() {
            return Err(CheckoutError::validation("token", "is required"));
        }

        let cart = self
            .carts
            .find_by_signup_token(token)
            .await?
            .ok_or(CheckoutError::SignupTokenNotFound)?;

        match query.lookup {
            SignupLookup::CompletedOnly => {
                if !cart.is_completed() {
                    return Err(CheckoutError::SignupTokenNotFound);
                }
            }
            SignupLookup::ForSignup => {
                if cart.is_signup_completed {
                    return Err(CheckoutError::SignupAlreadyCompleted(cart.id));
                }
                let now = Timestamp::now();
                verify_binding(&self.tokens, token, &cart, now)?;
                if cart.is_token_expired(now) {
                    return Err(CheckoutError::TokenExpired);
                }
            }
        }
        Ok(cart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryCartRepository;
    use crate::domain::cart::{new_cart, PaymentChange, PaymentStatus, PlanName};
    use secrecy::SecretString;

    fn service(ttl_hours: i64) -> Arc<SignupTokenService> {
        Arc::new(SignupTokenService::new(SecretString::new("s3cret".to_string())).with_ttl_hours(ttl_hours))
    }

    async fn completed(carts: &InMemoryCartRepository, tokens: &SignupTokenService) -> Cart {
        let now = Timestamp::now();
        let mut cart = new_cart(PlanName::Basic, 49_900);
        cart.apply_payment(PaymentChange::to(PaymentStatus::Completed).with_transaction("pay_9"), now)
            .unwrap();
        cart.attach_signup_token(tokens.issue(&cart.user.email, cart.subscription.plan, cart.id, now).unwrap())
            .unwrap();
        carts.save(&cart).await.unwrap();
        cart
    }

    fn query(cart: &Cart, lookup: SignupLookup) -> GetCartBySignupTokenQuery {
        GetCartBySignupTokenQuery {
            token: cart.signup_token.clone().unwrap(),
            lookup,
        }
    }

    #[tokio::test]
    async fn partner_lookup_finds_completed_cart() {
        let carts = InMemoryCartRepository::new();
        let tokens = service(24);
        let cart = completed(&carts, &tokens).await;
        let handler = GetCartBySignupTokenHandler::new(Arc::new(carts), tokens);

        let found = handler.handle(query(&cart, SignupLookup::CompletedOnly)).await.unwrap();

        assert_eq!(found.id, cart.id);
    }

    #[tokio::test]
    async fn signup_lookup_rejects_used_token() {
        let carts = InMemoryCartRepository::new();
        let tokens = service(24);
        let cart = completed(&carts, &tokens).await;
        carts.mark_signup_completed(&cart.id, Timestamp::now()).await.unwrap();
        let handler = GetCartBySignupTokenHandler::new(Arc::new(carts), tokens);

        let err = handler.handle(query(&cart, SignupLookup::ForSignup)).await.unwrap_err();

        assert_eq!(err, CheckoutError::SignupAlreadyCompleted(cart.id));
    }

    #[tokio::test]
    async fn signup_lookup_rejects_expired_token() {
        let carts = InMemoryCartRepository::new();
        let tokens = service(0);
        let cart = completed(&carts, &tokens).await;
        let handler = GetCartBySignupTokenHandler::new(Arc::new(carts), tokens);

        let err = handler.handle(query(&cart, SignupLookup::ForSignup)).await.unwrap_err();

        assert_eq!(err, CheckoutError::TokenExpired);
    }

    #[tokio::test]
    async fn partner_lookup_still_sees_used_token() {
        let carts = InMemoryCartRepository::new();
        let tokens = service(24);
        let cart = completed(&carts, &tokens).await;
        carts.mark_signup_completed(&cart.id, Timestamp::now()).await.unwrap();
        let handler = GetCartBySignupTokenHandler::new(Arc::new(carts), tokens);

        let found = handler.handle(query(&cart, SignupLookup::CompletedOnly)).await.unwrap();

        assert!(found.is_signup_completed);
    }

    #[tokio::test]
    async fn unknown_token_is_not_found() {
        let handler = GetCartBySignupTokenHandler::new(Arc::new(InMemoryCartRepository::new()), service(24));

        let err = handler
            .handle(GetCartBySignupTokenQuery {
                token: "missing".into(),
                lookup: SignupLookup::ForSignup,
            })
            .await
            .unwrap_err();

        assert_eq!(err, CheckoutError::SignupTokenNotFound);
    }
}
