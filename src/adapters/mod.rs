//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `email` - Welcome email (Resend, recording mock)
//! - `gateways` - Razorpay, PayPal and a mock gateway
//! - `http` - axum REST API
//! - `memory` - In-memory repositories and plan catalog
//! - `postgres` - PostgreSQL repositories

pub mod email;
pub mod gateways;
pub mod http;
pub mod memory;
pub mod postgres;
