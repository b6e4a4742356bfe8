//! Axum router configuration for payment endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use crate::adapters::http::state::CheckoutAppState;

use super::handlers::{
    create_order, paypal_return, paypal_webhook, razorpay_webhook, verify_razorpay,
};

/// Browser-facing payment routes.
///
/// # Routes
/// - `POST /payments/order` - Open a gateway order
/// - `POST /payments/razorpay/verify` - Razorpay Checkout confirmation
/// - `GET /payments/paypal/return` - PayPal approval redirect
pub fn payment_routes() -> Router<CheckoutAppState> {
    Router::new()
        .route("/payments/order", post(create_order))
        .route("/payments/razorpay/verify", post(verify_razorpay))
        .route("/payments/paypal/return", get(paypal_return))
}

/// Gateway webhook routes.
///
/// No partner auth: each delivery is verified by its signature.
///
/// # Routes
/// - `POST /webhooks/razorpay`
/// - `POST /webhooks/paypal`
pub fn webhook_routes() -> Router<CheckoutAppState> {
    Router::new()
        .route("/webhooks/razorpay", post(razorpay_webhook))
        .route("/webhooks/paypal", post(paypal_webhook))
}
