//! HTTP adapter for cart, signup and coupon endpoints.
//!
//! - `POST /cart/create` - Create a cart
//! - `GET /cart/load` - Resume a pending cart
//! - `GET /cart?signup=` - Partner lookup of a completed cart
//! - `PATCH /cart/update` - Partner payment status update
//! - `GET /signup?token=` - Partner lookup for the signup form
//! - `PATCH /signup/complete` - Finish the signup handoff
//! - `POST /coupon/validate` - Check a coupon

pub mod dto;
pub mod handlers;
pub mod routes;

pub use routes::checkout_routes;
