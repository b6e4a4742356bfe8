//! Shared application state for the HTTP layer.

use std::sync::Arc;

use secrecy::SecretString;

use crate::application::handlers::checkout::{
    CompleteSignupHandler, CompletionEffects, CreateCartHandler, CreateGatewayOrderHandler,
    GetCartBySignupTokenHandler, GetCartHandler, LoadCartHandler, UpdateCartPaymentHandler,
    ValidateCouponHandler,
};
use crate::application::handlers::gateway::ProcessGatewayEventHandler;
use crate::domain::signup::SignupTokenService;
use crate::ports::{CartRepository, CouponRepository, GatewayRegistry, PlanCatalog};

/// Where the browser goes after a redirect payment.
#[derive(Debug, Clone)]
pub struct RedirectUrls {
    /// Storefront page shown after a successful payment.
    pub success: String,
    /// Checkout page, reopened with `error=payment_failed`.
    pub checkout: String,
}

/// Shared application state containing all dependencies.
///
/// Cloned for each request; every dependency is behind an `Arc`.
#[derive(Clone)]
pub struct CheckoutAppState {
    pub carts: Arc<dyn CartRepository>,
    pub coupons: Arc<dyn CouponRepository>,
    pub catalog: Arc<dyn PlanCatalog>,
    pub gateways: GatewayRegistry,
    pub tokens: Arc<SignupTokenService>,
    pub effects: CompletionEffects,
    /// Bearer key for the partner endpoints.
    pub partner_key: Arc<SecretString>,
    pub redirects: RedirectUrls,
    /// Public Razorpay key id handed to the browser checkout.
    pub razorpay_key_id: String,
}

impl CheckoutAppState {
    /// Create handlers on demand from the shared state.
    pub fn create_cart_handler(&self) -> CreateCartHandler {
        CreateCartHandler::new(
            self.carts.clone(),
            self.catalog.clone(),
            self.coupons.clone(),
            self.effects.clone(),
        )
    }

    pub fn get_cart_handler(&self) -> GetCartHandler {
        GetCartHandler::new(self.carts.clone())
    }

    pub fn load_cart_handler(&self) -> LoadCartHandler {
        LoadCartHandler::new(self.carts.clone())
    }

    pub fn signup_lookup_handler(&self) -> GetCartBySignupTokenHandler {
        GetCartBySignupTokenHandler::new(self.carts.clone(), self.tokens.clone())
    }

    pub fn update_cart_payment_handler(&self) -> UpdateCartPaymentHandler {
        UpdateCartPaymentHandler::new(self.carts.clone(), self.effects.clone())
    }

    pub fn complete_signup_handler(&self) -> CompleteSignupHandler {
        CompleteSignupHandler::new(self.carts.clone(), self.tokens.clone())
    }

    pub fn validate_coupon_handler(&self) -> ValidateCouponHandler {
        ValidateCouponHandler::new(self.coupons.clone())
    }

    pub fn create_gateway_order_handler(&self) -> CreateGatewayOrderHandler {
        CreateGatewayOrderHandler::new(self.carts.clone(), self.gateways.clone())
    }

    pub fn gateway_event_handler(&self) -> ProcessGatewayEventHandler {
        ProcessGatewayEventHandler::new(
            self.carts.clone(),
            self.gateways.clone(),
            Arc::new(self.update_cart_payment_handler()),
        )
    }
}
