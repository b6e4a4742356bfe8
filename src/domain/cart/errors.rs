//! Checkout-specific error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | CartNotFound / SignupTokenNotFound / PlanNotFound | 404 |
//! | InvalidTransition | 409 |
//! | AlreadyCompleted / SignupAlreadyCompleted | 400 (404 on signup completion) |
//! | TokenExpired / InvalidToken | 401 |
//! | CouponRejected (unknown code) | 404 |
//! | CouponRejected / ValidationFailed | 400 |
//! | Gateway | 502 |
//! | Infrastructure | 500 |

use crate::domain::coupon::CouponRejection;
use crate::domain::foundation::{CartId, DomainError, ErrorCode, ValidationError};

use super::{PaymentStatus, PlanName};

/// Errors surfaced by cart lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    /// No cart with this id.
    CartNotFound(CartId),

    /// No cart carries this signup token.
    SignupTokenNotFound,

    /// Catalog has no entry for the plan.
    PlanNotFound(PlanName),

    /// Requested payment status change is not allowed.
    InvalidTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    /// Cart is completed and can no longer be resumed or paid.
    AlreadyCompleted(CartId),

    /// The signup flag has already been flipped.
    SignupAlreadyCompleted(CartId),

    /// Signup token is past its expiry.
    TokenExpired,

    /// Signup token is malformed, forged, or does not match the cart.
    InvalidToken,

    /// Coupon could not be applied.
    CouponRejected {
        code: String,
        reason: CouponRejection,
    },

    /// Input failed validation.
    ValidationFailed {
        field: String,
        message: String,
    },

    /// Payment gateway call failed.
    Gateway(String),

    /// Storage or other infrastructure failure.
    Infrastructure(String),
}

impl CheckoutError {
    pub fn cart_not_found(id: CartId) -> Self {
        CheckoutError::CartNotFound(id)
    }

    pub fn invalid_transition(from: PaymentStatus, to: PaymentStatus) -> Self {
        CheckoutError::InvalidTransition { from, to }
    }

    pub fn coupon_rejected(code: impl Into<String>, reason: CouponRejection) -> Self {
        CheckoutError::CouponRejected {
            code: code.into(),
            reason,
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        CheckoutError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn gateway(message: impl Into<String>) -> Self {
        CheckoutError::Gateway(message.into())
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        CheckoutError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            CheckoutError::CartNotFound(_) | CheckoutError::SignupTokenNotFound => {
                ErrorCode::CartNotFound
            }
            CheckoutError::PlanNotFound(_) => ErrorCode::PlanNotFound,
            CheckoutError::InvalidTransition { .. } => ErrorCode::InvalidStateTransition,
            CheckoutError::AlreadyCompleted(_) => ErrorCode::CartAlreadyCompleted,
            CheckoutError::SignupAlreadyCompleted(_) => ErrorCode::SignupAlreadyCompleted,
            CheckoutError::TokenExpired => ErrorCode::TokenExpired,
            CheckoutError::InvalidToken => ErrorCode::Unauthorized,
            CheckoutError::CouponRejected {
                reason: CouponRejection::InvalidCode,
                ..
            } => ErrorCode::CouponNotFound,
            CheckoutError::CouponRejected { .. } => ErrorCode::CouponNotUsable,
            CheckoutError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            CheckoutError::Gateway(_) => ErrorCode::GatewayError,
            CheckoutError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-friendly error message.
    pub fn message(&self) -> String {
        match self {
            CheckoutError::CartNotFound(id) => format!("Cart not found: {}", id),
            CheckoutError::SignupTokenNotFound => "No cart found for signup token".to_string(),
            CheckoutError::PlanNotFound(plan) => format!("Plan not found: {}", plan),
            CheckoutError::InvalidTransition { from, to } => {
                format!("Cannot move payment from {} to {}", from, to)
            }
            CheckoutError::AlreadyCompleted(id) => {
                format!("Cart {} has already been completed", id)
            }
            CheckoutError::SignupAlreadyCompleted(id) => {
                format!("Signup for cart {} has already been completed", id)
            }
            CheckoutError::TokenExpired => "Signup token has expired".to_string(),
            CheckoutError::InvalidToken => "Signup token is invalid".to_string(),
            CheckoutError::CouponRejected { code, reason } => {
                format!("Coupon '{}' cannot be applied: {}", code, reason)
            }
            CheckoutError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            CheckoutError::Gateway(msg) => format!("Payment gateway error: {}", msg),
            CheckoutError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    /// Returns true if this error should trigger a retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CheckoutError::Gateway(_) | CheckoutError::Infrastructure(_)
        )
    }
}

impl std::fmt::Display for CheckoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for CheckoutError {}

impl From<ValidationError> for CheckoutError {
    fn from(err: ValidationError) -> Self {
        CheckoutError::validation(err.field().to_string(), err.to_string())
    }
}

/// Port failures are infrastructure errors from the checkout's point of view.
impl From<DomainError> for CheckoutError {
    fn from(err: DomainError) -> Self {
        CheckoutError::Infrastructure(err.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_transition_maps_to_state_code() {
        let err = CheckoutError::invalid_transition(PaymentStatus::Completed, PaymentStatus::Failed);
        assert_eq!(err.code(), ErrorCode::InvalidStateTransition);
        assert_eq!(err.message(), "Cannot move payment from completed to failed");
    }

    #[test]
    fn validation_error_keeps_field() {
        let err: CheckoutError = ValidationError::empty_field("user.email").into();
        match err {
            CheckoutError::ValidationFailed { field, .. } => assert_eq!(field, "user.email"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn only_upstream_failures_are_retryable() {
        assert!(CheckoutError::gateway("timeout").is_retryable());
        assert!(CheckoutError::infrastructure("db down").is_retryable());
        assert!(!CheckoutError::TokenExpired.is_retryable());
        assert!(!CheckoutError::cart_not_found(CartId::new()).is_retryable());
    }

    #[test]
    fn coupon_rejection_message_includes_reason() {
        let err = CheckoutError::coupon_rejected("SAVE20", CouponRejection::UsageLimitReached);
        assert!(err.message().contains("usage limit reached"));
    }

    #[test]
    fn unknown_coupon_code_is_not_found() {
        let unknown = CheckoutError::coupon_rejected("NOPE", CouponRejection::InvalidCode);
        let used = CheckoutError::coupon_rejected("USED", CouponRejection::UsageLimitReached);
        assert_eq!(unknown.code(), ErrorCode::CouponNotFound);
        assert_eq!(used.code(), ErrorCode::CouponNotUsable);
    }
}
