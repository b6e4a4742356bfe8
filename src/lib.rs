//! Checkout Core - cart and checkout lifecycle service.
//!
//! Turns a plan selection into a paid (or free) subscription: carts move
//! through payment states driven by Razorpay and PayPal callbacks, coupons
//! discount the total, and a signed signup token hands the purchase off to
//! an external signup flow.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
