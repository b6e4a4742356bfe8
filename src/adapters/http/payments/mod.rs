//! HTTP adapter for gateway orders and callbacks.
//!
//! - `POST /payments/order` - Open a gateway order for a pending cart
//! - `POST /payments/razorpay/verify` - Signed client confirmation
//! - `GET /payments/paypal/return` - Capture after PayPal approval
//! - `POST /webhooks/razorpay`, `POST /webhooks/paypal` - Gateway webhooks

pub mod dto;
pub mod handlers;
pub mod routes;

pub use routes::{payment_routes, webhook_routes};
