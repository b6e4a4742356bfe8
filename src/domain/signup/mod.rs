//! Signup handoff module.

mod token;

pub use token::{SignupClaims, SignupTokenError, SignupTokenService, DEFAULT_TOKEN_TTL_HOURS};
