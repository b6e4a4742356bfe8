//! Domain layer - Core business logic and entities.
//!
//! Pure domain model with no infrastructure dependencies.

pub mod cart;
pub mod coupon;
pub mod foundation;
pub mod gateway;
pub mod signup;
