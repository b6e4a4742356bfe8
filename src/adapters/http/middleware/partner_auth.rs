//! Partner API key middleware.
//!
//! The partner signup service calls the `/cart?signup=`, `/signup` and
//! `/cart/update` endpoints with a shared key:
//!
//! ```text
//! Authorization: Bearer <partner api key>
//! ```
//!
//! The key is compared in constant time. A missing or wrong key answers 401
//! before the handler runs.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use secrecy::{ExposeSecret, SecretString};

use crate::adapters::http::error::ErrorResponse;
use crate::domain::gateway::constant_time_compare;

/// Middleware state - the expected key.
pub type PartnerKey = Arc<SecretString>;

fn bearer(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
}

/// Rejects requests that do not carry the partner key.
pub async fn partner_auth(State(key): State<PartnerKey>, request: Request, next: Next) -> Response {
    let authorized = bearer(&request)
        .map(|token| constant_time_compare(token.as_bytes(), key.expose_secret().as_bytes()))
        .unwrap_or(false);

    if !authorized {
        tracing::warn!(
            target: "security",
            path = %request.uri().path(),
            "Partner request rejected"
        );
        let body = ErrorResponse::new("UNAUTHORIZED", "Invalid or missing partner API key");
        return (StatusCode::UNAUTHORIZED, Json(body)).into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    const KEY: &str = "partner_key_0123456789abcdef";

    fn app() -> Router {
        let key: PartnerKey = Arc::new(SecretString::new(KEY.to_string()));
        Router::new()
            .route("/protected", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn_with_state(key, partner_auth))
    }

    async fn status_with(header: Option<&str>) -> StatusCode {
        let mut builder = axum::http::Request::builder().uri("/protected");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        app()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn correct_key_passes() {
        assert_eq!(status_with(Some(&format!("Bearer {}", KEY))).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_header_is_401() {
        assert_eq!(status_with(None).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_key_is_401() {
        assert_eq!(status_with(Some("Bearer nope")).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn non_bearer_scheme_is_401() {
        assert_eq!(status_with(Some(&format!("Basic {}", KEY))).await, StatusCode::UNAUTHORIZED);
    }
}
