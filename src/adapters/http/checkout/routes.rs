//! Axum router configuration for cart, signup and coupon endpoints.

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use crate::adapters::http::middleware::partner_auth;
use crate::adapters::http::state::CheckoutAppState;

use super::handlers::{
    complete_signup, create_cart, get_cart_by_signup, get_signup, load_cart, update_cart,
    validate_coupon,
};

/// Browser-facing endpoints.
///
/// # Routes
/// - `POST /cart/create` - Create a cart
/// - `GET /cart/load` - Resume a pending cart
/// - `POST /coupon/validate` - Check a coupon code
pub fn public_routes() -> Router<CheckoutAppState> {
    Router::new()
        .route("/cart/create", post(create_cart))
        .route("/cart/load", get(load_cart))
        .route("/coupon/validate", post(validate_coupon))
}

/// Endpoints for the partner signup service, behind the partner key.
///
/// # Routes
/// - `GET /cart` - Completed cart by `?signup=` token
/// - `PATCH /cart/update` - Payment status change
/// - `GET /signup` - Cart by `?token=` for the signup form
/// - `PATCH /signup/complete` - Finish the signup handoff
pub fn partner_routes(state: &CheckoutAppState) -> Router<CheckoutAppState> {
    Router::new()
        .route("/cart", get(get_cart_by_signup))
        .route("/cart/update", patch(update_cart))
        .route("/signup", get(get_signup))
        .route("/signup/complete", patch(complete_signup))
        .route_layer(middleware::from_fn_with_state(
            state.partner_key.clone(),
            partner_auth,
        ))
}

/// All cart, signup and coupon routes.
pub fn checkout_routes(state: &CheckoutAppState) -> Router<CheckoutAppState> {
    Router::new()
        .merge(public_routes())
        .merge(partner_routes(state))
}
