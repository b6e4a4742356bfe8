//! HTTP adapters - REST API implementations.
//!
//! - `checkout` - Cart, signup and coupon endpoints
//! - `payments` - Gateway orders, browser callbacks and webhooks
//! - `middleware` - Partner key check

pub mod checkout;
pub mod error;
pub mod middleware;
pub mod payments;
mod state;

pub use error::{ApiJson, CheckoutApiError, ErrorResponse, GatewayApiError};
pub use state::{CheckoutAppState, RedirectUrls};

use axum::{routing::get, Json, Router};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct HealthResponse {
    success: bool,
    status: &'static str,
    version: &'static str,
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Complete API router with state applied.
///
/// Cross-cutting layers (trace, CORS, timeout) are added by the binary.
pub fn router(state: CheckoutAppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(checkout::checkout_routes(&state))
        .merge(payments::payment_routes())
        .merge(payments::webhook_routes())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_is_ok() {
        let app = router(state::test_support::test_state());
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
