//! Cart domain module.
//!
//! The checkout state machine: cart aggregate, payment status transitions,
//! and the plan/gateway vocabulary they use.
//!
//! # Module Structure
//!
//! - `aggregate` - Cart aggregate entity
//! - `status` - PaymentStatus state machine
//! - `billing_cycle` - Monthly/yearly period arithmetic
//! - `plan` - Plan catalog entries and gateways
//! - `user_details` - Purchaser snapshot and validation
//! - `errors` - CheckoutError

mod aggregate;
mod billing_cycle;
mod errors;
mod plan;
mod status;
pub(crate) mod user_details;

pub use aggregate::{
    AppliedCoupon, Cart, IssuedSignupToken, NewCart, PaymentChange, PaymentRecord, Subscription,
    Transition,
};
pub use billing_cycle::BillingCycle;
pub use errors::CheckoutError;
pub use plan::{Gateway, Plan, PlanName, PlanPrice};
pub use status::PaymentStatus;
pub use user_details::{Address, UserDetails};

#[cfg(test)]
pub(crate) use aggregate::tests::new_cart;
