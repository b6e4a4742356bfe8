//! HTTP error mapping and request extraction.
//!
//! Every failure leaves the API as `{success: false, error: {code, message}}`.

use async_trait::async_trait;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::cart::CheckoutError;
use crate::domain::coupon::CouponRejection;
use crate::domain::gateway::GatewayError;

// ════════════════════════════════════════════════════════════════════════════════
// Response Bodies
// ════════════════════════════════════════════════════════════════════════════════

/// Error envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}

/// Body for gateway callbacks that are acknowledged without a cart change.
#[derive(Debug, Clone, Serialize)]
pub struct AcknowledgedResponse {
    pub success: bool,
    pub acknowledged: bool,
    pub message: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Checkout Errors
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts checkout errors to HTTP responses.
#[derive(Debug)]
pub struct CheckoutApiError {
    error: CheckoutError,
    status: Option<StatusCode>,
}

impl CheckoutApiError {
    /// Overrides the default status for this error.
    pub fn with_status(error: CheckoutError, status: StatusCode) -> Self {
        Self {
            error,
            status: Some(status),
        }
    }

    pub fn error(&self) -> &CheckoutError {
        &self.error
    }

    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or_else(|| status_for(&self.error))
    }
}

pub(crate) fn status_for(error: &CheckoutError) -> StatusCode {
    match error {
        CheckoutError::CartNotFound(_)
        | CheckoutError::SignupTokenNotFound
        | CheckoutError::PlanNotFound(_)
        | CheckoutError::CouponRejected {
            reason: CouponRejection::InvalidCode,
            ..
        } => StatusCode::NOT_FOUND,
        CheckoutError::InvalidTransition { .. } => StatusCode::CONFLICT,
        CheckoutError::AlreadyCompleted(_) | CheckoutError::SignupAlreadyCompleted(_) => {
            StatusCode::BAD_REQUEST
        }
        CheckoutError::TokenExpired | CheckoutError::InvalidToken => StatusCode::UNAUTHORIZED,
        CheckoutError::CouponRejected { .. } | CheckoutError::ValidationFailed { .. } => {
            StatusCode::BAD_REQUEST
        }
        CheckoutError::Gateway(_) => StatusCode::BAD_GATEWAY,
        CheckoutError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<CheckoutError> for CheckoutApiError {
    fn from(error: CheckoutError) -> Self {
        Self {
            error,
            status: None,
        }
    }
}

impl From<crate::domain::foundation::ValidationError> for CheckoutApiError {
    fn from(err: crate::domain::foundation::ValidationError) -> Self {
        Self::from(CheckoutError::from(err))
    }
}

impl IntoResponse for CheckoutApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.error, "Checkout request failed");
        }
        let body = ErrorResponse::new(self.error.code().to_string(), self.error.message());
        (status, Json(body)).into_response()
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Gateway Errors
// ════════════════════════════════════════════════════════════════════════════════

/// API error type for gateway callbacks.
///
/// Ignored events and conflicting deliveries answer 200 so the gateway
/// stops redelivering.
#[derive(Debug)]
pub struct GatewayApiError(pub GatewayError);

impl From<GatewayError> for GatewayApiError {
    fn from(err: GatewayError) -> Self {
        Self(err)
    }
}

impl IntoResponse for GatewayApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        if self.0.is_acknowledged() {
            let body = AcknowledgedResponse {
                success: true,
                acknowledged: true,
                message: self.0.to_string(),
            };
            return (status, Json(body)).into_response();
        }
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Gateway callback failed");
        }
        (status, Json(ErrorResponse::new(self.0.code(), self.0.to_string()))).into_response()
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// JSON Extractor
// ════════════════════════════════════════════════════════════════════════════════

/// `Json` whose rejections use the error envelope and answer 400.
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = CheckoutApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(CheckoutError::validation("body", rejection.body_text()).into()),
        }
    }
}
