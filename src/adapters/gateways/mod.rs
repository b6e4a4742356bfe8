//! Payment gateway adapters.
//!
//! - `razorpay` - Razorpay Orders API with local HMAC verification
//! - `paypal` - PayPal Orders v2 API with remote webhook verification
//! - `mock` - Configurable gateway for tests and local development

mod mock;
mod paypal;
mod razorpay;

pub use mock::MockPaymentGateway;
pub use paypal::{PaypalConfig, PaypalGateway};
pub use razorpay::{RazorpayConfig, RazorpayGateway};
