//! Razorpay signature verification.
//!
//! Two HMAC-SHA256 schemes, both hex encoded:
//!
//! - Webhooks: `X-Razorpay-Signature = HMAC(body, webhook_secret)`
//! - Checkout callback: `razorpay_signature = HMAC("{order_id}|{payment_id}", key_secret)`

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::GatewayError;

/// Verifier for Razorpay-signed payloads.
pub struct RazorpaySignatureVerifier {
    key_secret: SecretString,
    webhook_secret: SecretString,
}

impl RazorpaySignatureVerifier {
    pub fn new(key_secret: SecretString, webhook_secret: SecretString) -> Self {
        Self {
            key_secret,
            webhook_secret,
        }
    }

    /// Verifies a webhook body against its `X-Razorpay-Signature` header.
    ///
    /// # Errors
    ///
    /// - `MissingSignature` - header empty
    /// - `InvalidSignature` - not hex, or does not match
    pub fn verify_webhook(&self, body: &[u8], signature_hex: &str) -> Result<(), GatewayError> {
        let expected = hmac_sha256(self.webhook_secret.expose_secret().as_bytes(), body)?;
        check(&expected, signature_hex)
    }

    /// Verifies the signature returned by Razorpay Checkout to the browser.
    pub fn verify_client_confirmation(
        &self,
        order_id: &str,
        payment_id: &str,
        signature_hex: &str,
    ) -> Result<(), GatewayError> {
        let message = format!("{}|{}", order_id, payment_id);
        let expected = hmac_sha256(self.key_secret.expose_secret().as_bytes(), message.as_bytes())?;
        check(&expected, signature_hex)
    }
}

fn check(expected: &[u8], signature_hex: &str) -> Result<(), GatewayError> {
    let signature_hex = signature_hex.trim();
    if signature_hex.is_empty() {
        return Err(GatewayError::MissingSignature);
    }
    let provided = hex::decode(signature_hex).map_err(|_| GatewayError::InvalidSignature)?;
    if !constant_time_compare(expected, &provided) {
        return Err(GatewayError::InvalidSignature);
    }
    Ok(())
}

fn hmac_sha256(key: &[u8], message: &[u8]) -> Result<Vec<u8>, GatewayError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .map_err(|e| GatewayError::ParseError(format!("hmac key: {}", e)))?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Performs constant-time comparison of two byte slices.
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Hex HMAC-SHA256, for signing fixtures and mock gateways.
pub fn sign_hex(secret: &str, message: &[u8]) -> String {
    match hmac_sha256(secret.as_bytes(), message) {
        Ok(bytes) => hex::encode(bytes),
        Err(_) => String::new(),
    }
}
