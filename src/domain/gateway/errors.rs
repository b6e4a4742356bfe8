//! Gateway callback error types.
//!
//! Status codes decide whether the gateway redelivers: 2xx acknowledges,
//! 4xx drops, 5xx retries.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that occur while processing a gateway callback.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Signature header absent.
    #[error("Missing signature")]
    MissingSignature,

    /// Signature did not verify.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Payload or header could not be parsed.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Required field missing from the payload.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// The referenced cart does not exist.
    #[error("Cart not found")]
    CartNotFound,

    /// Event type is not one we act on.
    #[error("Event ignored: {0}")]
    Ignored(String),

    /// The update conflicts with the cart's state (duplicate or late delivery).
    #[error("Conflicting update: {0}")]
    Conflict(String),

    /// Gateway API call failed.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Storage failed.
    #[error("Database error: {0}")]
    Database(String),
}

impl GatewayError {
    /// Returns true if the gateway should redeliver.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::Database(_) | GatewayError::Upstream(_))
    }

    /// True for outcomes that are acknowledged as success.
    pub fn is_acknowledged(&self) -> bool {
        matches!(self, GatewayError::Ignored(_) | GatewayError::Conflict(_))
    }

    /// Maps the error to an HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::MissingSignature | GatewayError::InvalidSignature => {
                StatusCode::UNAUTHORIZED
            }

            GatewayError::ParseError(_) | GatewayError::MissingField(_) => StatusCode::BAD_REQUEST,

            GatewayError::CartNotFound => StatusCode::NOT_FOUND,

            // Duplicates and unknown events are acknowledged
            GatewayError::Ignored(_) | GatewayError::Conflict(_) => StatusCode::OK,

            GatewayError::Upstream(_) => StatusCode::BAD_GATEWAY,

            GatewayError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::MissingSignature => "MISSING_SIGNATURE",
            GatewayError::InvalidSignature => "INVALID_SIGNATURE",
            GatewayError::ParseError(_) => "PARSE_ERROR",
            GatewayError::MissingField(_) => "MISSING_FIELD",
            GatewayError::CartNotFound => "CART_NOT_FOUND",
            GatewayError::Ignored(_) => "IGNORED",
            GatewayError::Conflict(_) => "CONFLICT",
            GatewayError::Upstream(_) => "GATEWAY_ERROR",
            GatewayError::Database(_) => "DATABASE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ══════════════════════════════════════════════════════════════
    // Status Code Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn signature_failures_are_unauthorized() {
        assert_eq!(GatewayError::InvalidSignature.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(GatewayError::MissingSignature.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn ignored_and_conflict_are_acknowledged() {
        let ignored = GatewayError::Ignored("subscription.charged".into());
        let conflict = GatewayError::Conflict("completed -> cancelled".into());
        assert_eq!(ignored.status_code(), StatusCode::OK);
        assert_eq!(conflict.status_code(), StatusCode::OK);
        assert!(ignored.is_acknowledged());
        assert!(conflict.is_acknowledged());
    }

    #[test]
    fn malformed_payloads_are_bad_requests() {
        assert_eq!(
            GatewayError::MissingField("notes.cart_id").status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn upstream_and_database_are_retryable() {
        assert!(GatewayError::Upstream("timeout".into()).is_retryable());
        assert!(GatewayError::Database("down".into()).is_retryable());
        assert!(!GatewayError::InvalidSignature.is_retryable());
    }

    #[test]
    fn display_includes_detail() {
        let err = GatewayError::MissingField("custom_id");
        assert_eq!(format!("{}", err), "Missing field: custom_id");
    }
}
