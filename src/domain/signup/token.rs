//! Signup handoff tokens.
//!
//! A token is an HS256 JWT binding `{email, plan, cart_id}` with an expiry.
//! It is a bearer capability: whoever holds it may complete signup for
//! that cart once.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::cart::{IssuedSignupToken, PlanName};
use crate::domain::foundation::{CartId, Timestamp};

/// Default lifetime of a signup token.
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// Claims carried by a signup token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupClaims {
    pub email: String,
    pub plan: PlanName,
    pub cart_id: CartId,
    pub iat: i64,
    pub exp: i64,
    /// Random id so two tokens for the same cart never collide.
    pub jti: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignupTokenError {
    #[error("signup token has expired")]
    Expired,

    #[error("signup token is invalid: {0}")]
    Invalid(String),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Issues and verifies signup tokens.
pub struct SignupTokenService {
    secret: SecretString,
    ttl_hours: i64,
}

impl SignupTokenService {
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret,
            ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
        }
    }

    pub fn with_ttl_hours(mut self, hours: i64) -> Self {
        self.ttl_hours = hours;
        self
    }

    pub fn ttl_hours(&self) -> i64 {
        self.ttl_hours
    }

    /// Issues a token valid for the configured TTL starting at `now`.
    pub fn issue(
        &self,
        email: &str,
        plan: PlanName,
        cart_id: CartId,
        now: Timestamp,
    ) -> Result<IssuedSignupToken, SignupTokenError> {
        let expires_at = now.add_hours(self.ttl_hours);
        let claims = SignupClaims {
            email: email.to_string(),
            plan,
            cart_id,
            iat: now.as_unix_secs(),
            exp: expires_at.as_unix_secs(),
            jti: Uuid::new_v4().simple().to_string(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.expose_secret().as_bytes()),
        )
        .map_err(|e| SignupTokenError::Signing(e.to_string()))?;

        // Stored expiry matches the claim's second-resolution `exp`.
        let expires_at = Timestamp::from_unix_secs(claims.exp).unwrap_or(expires_at);
        Ok(IssuedSignupToken { token, expires_at })
    }

    /// Verifies signature and expiry against `now`.
    ///
    /// Expiry is checked here rather than by the JWT library so callers
    /// control the clock. No leeway is applied.
    pub fn verify(&self, token: &str, now: Timestamp) -> Result<SignupClaims, SignupTokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        let claims = decode::<SignupClaims>(
            token,
            &DecodingKey::from_secret(self.secret.expose_secret().as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| SignupTokenError::Invalid(e.to_string()))?;

        if now.as_unix_secs() >= claims.exp {
            return Err(SignupTokenError::Expired);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> SignupTokenService {
        SignupTokenService::new(SecretString::new("test-signup-secret".to_string()))
    }

    #[test]
    fn issued_token_verifies_with_same_secret() {
        let svc = service();
        let cart_id = CartId::new();
        let now = Timestamp::now();
        let issued = svc.issue("asha@example.com", PlanName::Pro, cart_id, now).unwrap();

        let claims = svc.verify(&issued.token, now).unwrap();
        assert_eq!(claims.email, "asha@example.com");
        assert_eq!(claims.plan, PlanName::Pro);
        assert_eq!(claims.cart_id, cart_id);
    }

    #[test]
    fn token_expires_after_ttl() {
        let svc = service();
        let now = Timestamp::now();
        let issued = svc.issue("a@b.co", PlanName::Basic, CartId::new(), now).unwrap();

        assert!(svc.verify(&issued.token, now.add_hours(23)).is_ok());
        assert_eq!(
            svc.verify(&issued.token, now.add_hours(25)),
            Err(SignupTokenError::Expired)
        );
    }

    #[test]
    fn expiry_is_twenty_four_hours_by_default() {
        let svc = service();
        let now = Timestamp::now();
        let issued = svc.issue("a@b.co", PlanName::Basic, CartId::new(), now).unwrap();
        let minutes = issued.expires_at.duration_since(&now).num_minutes();
        assert!((24 * 60 - 1..=24 * 60).contains(&minutes));
    }

    #[test]
    fn token_from_other_secret_is_invalid() {
        let other = SignupTokenService::new(SecretString::new("other".to_string()));
        let issued = other
            .issue("a@b.co", PlanName::Basic, CartId::new(), Timestamp::now())
            .unwrap();
        assert!(matches!(
            service().verify(&issued.token, Timestamp::now()),
            Err(SignupTokenError::Invalid(_))
        ));
    }

    #[test]
    fn garbage_is_invalid() {
        assert!(matches!(
            service().verify("not.a.jwt", Timestamp::now()),
            Err(SignupTokenError::Invalid(_))
        ));
    }

    #[test]
    fn two_tokens_for_same_cart_differ() {
        let svc = service();
        let cart_id = CartId::new();
        let now = Timestamp::now();
        let a = svc.issue("a@b.co", PlanName::Basic, cart_id, now).unwrap();
        let b = svc.issue("a@b.co", PlanName::Basic, cart_id, now).unwrap();
        assert_ne!(a.token, b.token);
    }
}
