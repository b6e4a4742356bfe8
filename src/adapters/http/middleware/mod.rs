//! HTTP middleware for axum.
//!
//! - `partner_auth` - Bearer key check for partner-facing endpoints

pub mod partner_auth;

pub use partner_auth::{partner_auth, PartnerKey};
