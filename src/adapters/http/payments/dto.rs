//! HTTP DTOs for gateway order, confirmation and callback endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::checkout::UpdateCartPaymentResult;
use crate::domain::cart::{Gateway, PaymentStatus};
use crate::domain::foundation::CartId;

use crate::adapters::http::checkout::dto::SoftFailureFields;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to open a gateway order for a cart.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub cart_id: String,
}

/// Razorpay Checkout success callback, relayed by the browser.
///
/// Accepts the field names Razorpay's handler produces as well.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RazorpayVerifyRequest {
    pub cart_id: String,
    #[serde(alias = "razorpay_order_id")]
    pub razorpay_order_id: String,
    #[serde(alias = "razorpay_payment_id")]
    pub razorpay_payment_id: String,
    #[serde(alias = "razorpay_signature")]
    pub razorpay_signature: String,
}

/// PayPal return URL query: `token` is PayPal's order id.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaypalReturnParams {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub cart_id: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Gateway order the browser checkout continues with.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub success: bool,
    pub cart_id: CartId,
    pub gateway: Gateway,
    pub order_id: String,
    /// PayPal approval page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_url: Option<String>,
    pub amount: f64,
    /// Amount in minor units, as Razorpay Checkout expects it.
    pub amount_minor: i64,
    pub currency: String,
    /// Public Razorpay key id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
}

/// Outcome of a verified payment callback.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResultResponse {
    pub success: bool,
    pub cart_id: CartId,
    pub status: PaymentStatus,
    /// Handed to the browser so it can continue to signup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signup_token: Option<String>,
    #[serde(flatten)]
    pub soft: SoftFailureFields,
}

impl PaymentResultResponse {
    pub fn new(result: UpdateCartPaymentResult, include_token: bool) -> Self {
        let signup_token = if include_token && result.cart.is_completed() {
            result.cart.signup_token.clone()
        } else {
            None
        };
        Self {
            success: true,
            cart_id: result.cart.id,
            status: result.cart.payment.status,
            signup_token,
            soft: result.soft.into(),
        }
    }
}
