//! Gateway result normalization.
//!
//! Turns Razorpay and PayPal callbacks (webhooks, redirects, client
//! confirmations) into a single `PaymentUpdate`.

mod errors;
mod event;
mod paypal_payload;
mod razorpay_payload;
mod signature;

pub use errors::GatewayError;
pub use event::{GatewayEvent, PaymentOutcome, PaymentUpdate, WebhookHeaders};
pub use paypal_payload::PaypalWebhook;
pub use razorpay_payload::{RazorpayWebhook, CART_ID_NOTE};
pub use signature::{constant_time_compare, sign_hex, RazorpaySignatureVerifier};

/// Header carrying the Razorpay webhook signature.
pub const RAZORPAY_SIGNATURE_HEADER: &str = "x-razorpay-signature";
