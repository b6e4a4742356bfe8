//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Storage Ports
//!
//! - `CartRepository` - Cart persistence with conditional status writes
//! - `CouponRepository` - Coupon lookup and redemption counting
//! - `PlanCatalog` - Read-only plan pricing
//!
//! ## External Service Ports
//!
//! - `PaymentGateway` - Razorpay / PayPal order, capture and webhook verification
//! - `WelcomeEmailSender` - Post-purchase email

mod cart_repository;
mod coupon_repository;
mod email_sender;
mod payment_gateway;
mod plan_catalog;

pub use cart_repository::{CartRepository, CasOutcome};
pub use coupon_repository::CouponRepository;
pub use email_sender::{EmailError, WelcomeEmail, WelcomeEmailSender};
pub use payment_gateway::{
    CaptureResult, GatewayOrder, GatewayOrderRequest, GatewayRegistry, PaymentGateway,
    PaymentGatewayError, PaymentGatewayErrorCode,
};
pub use plan_catalog::PlanCatalog;
