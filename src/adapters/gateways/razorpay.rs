//! Razorpay payment gateway adapter.
//!
//! Implements `PaymentGateway` against the Razorpay Orders API.
//!
//! # Security
//!
//! - Webhooks and checkout callbacks are HMAC-SHA256 checked locally
//! - Comparison is constant time
//! - Secrets handled via `secrecy::SecretString`
//!
//! # Configuration
//!
//! ```ignore
//! let config = RazorpayConfig::new(key_id, key_secret, webhook_secret);
//! let adapter = RazorpayGateway::new(config);
//! ```

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::domain::cart::Gateway;
use crate::domain::foundation::CartId;
use crate::domain::gateway::{
    RazorpaySignatureVerifier, WebhookHeaders, CART_ID_NOTE, RAZORPAY_SIGNATURE_HEADER,
};
use crate::ports::{
    CaptureResult, GatewayOrder, GatewayOrderRequest, PaymentGateway, PaymentGatewayError,
    PaymentGatewayErrorCode,
};

const DEFAULT_API_BASE: &str = "https://api.razorpay.com";

/// Razorpay API configuration.
#[derive(Clone)]
pub struct RazorpayConfig {
    key_id: String,
    key_secret: SecretString,
    webhook_secret: SecretString,
    api_base_url: String,
}

impl RazorpayConfig {
    pub fn new(
        key_id: impl Into<String>,
        key_secret: SecretString,
        webhook_secret: SecretString,
    ) -> Self {
        Self {
            key_id: key_id.into(),
            key_secret,
            webhook_secret,
            api_base_url: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Public key id, handed to the browser checkout.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }
}

/// Razorpay gateway adapter.
pub struct RazorpayGateway {
    config: RazorpayConfig,
    verifier: RazorpaySignatureVerifier,
    http_client: reqwest::Client,
}

impl RazorpayGateway {
    pub fn new(config: RazorpayConfig) -> Self {
        let verifier = RazorpaySignatureVerifier::new(
            config.key_secret.clone(),
            config.webhook_secret.clone(),
        );
        Self {
            config,
            verifier,
            http_client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url, path)
    }

    async fn read_error(response: reqwest::Response, operation: &str) -> PaymentGatewayError {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        tracing::error!(status = %status, error = %error_text, "Razorpay {} failed", operation);

        let provider_code = serde_json::from_str::<RazorpayErrorBody>(&error_text)
            .ok()
            .and_then(|b| b.error.code);
        let code = match status {
            reqwest::StatusCode::UNAUTHORIZED => PaymentGatewayErrorCode::AuthenticationError,
            reqwest::StatusCode::NOT_FOUND => PaymentGatewayErrorCode::NotFound,
            s if s.is_server_error() => PaymentGatewayErrorCode::NetworkError,
            _ => PaymentGatewayErrorCode::ProviderError,
        };
        let err = PaymentGatewayError::new(code, format!("Razorpay API error: {}", error_text));
        match provider_code {
            Some(c) => err.with_provider_code(c),
            None => err,
        }
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    fn gateway(&self) -> Gateway {
        Gateway::Razorpay
    }

    async fn create_order(
        &self,
        request: &GatewayOrderRequest,
    ) -> Result<GatewayOrder, PaymentGatewayError> {
        let body = CreateOrderBody::from_request(request);

        let response = self
            .http_client
            .post(self.url("/v1/orders"))
            .basic_auth(&self.config.key_id, Some(self.config.key_secret.expose_secret()))
            .json(&body)
            .send()
            .await
            .map_err(|e| PaymentGatewayError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::read_error(response, "create_order").await);
        }

        let order: RazorpayOrderResponse = response.json().await.map_err(|e| {
            PaymentGatewayError::provider(format!("Failed to parse Razorpay response: {}", e))
        })?;

        tracing::info!(cart_id = %request.cart_id, order_id = %order.id, "Razorpay order created");

        Ok(GatewayOrder {
            id: order.id,
            approval_url: None,
        })
    }

    /// Razorpay captures automatically; this looks up the order's payments.
    async fn capture_order(&self, order_id: &str) -> Result<CaptureResult, PaymentGatewayError> {
        let response = self
            .http_client
            .get(self.url(&format!("/v1/orders/{}/payments", order_id)))
            .basic_auth(&self.config.key_id, Some(self.config.key_secret.expose_secret()))
            .send()
            .await
            .map_err(|e| PaymentGatewayError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::read_error(response, "fetch_payments").await);
        }

        let payments: RazorpayPaymentList = response.json().await.map_err(|e| {
            PaymentGatewayError::provider(format!("Failed to parse Razorpay response: {}", e))
        })?;

        Ok(payments.into_capture_result())
    }

    async fn verify_webhook(
        &self,
        headers: &WebhookHeaders,
        body: &[u8],
    ) -> Result<bool, PaymentGatewayError> {
        let signature = headers.get(RAZORPAY_SIGNATURE_HEADER).unwrap_or_default();
        Ok(self.verifier.verify_webhook(body, signature).is_ok())
    }

    fn verify_client_confirmation(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<bool, PaymentGatewayError> {
        Ok(self
            .verifier
            .verify_client_confirmation(order_id, payment_id, signature)
            .is_ok())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Wire types
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
struct CreateOrderBody {
    /// Minor units.
    amount: i64,
    currency: &'static str,
    receipt: String,
    notes: serde_json::Value,
}

impl CreateOrderBody {
    fn from_request(request: &GatewayOrderRequest) -> Self {
        Self {
            amount: request.amount.minor(),
            currency: request.amount.currency().code(),
            receipt: request.payment_id.as_str().to_string(),
            notes: serde_json::json!({
                CART_ID_NOTE: request.cart_id.to_string(),
                "email": request.customer_email,
                "description": request.description,
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RazorpayOrderResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RazorpayPaymentList {
    #[serde(default)]
    items: Vec<RazorpayPaymentItem>,
}

#[derive(Debug, Deserialize)]
struct RazorpayPaymentItem {
    id: String,
    status: String,
    method: Option<String>,
    #[serde(default)]
    notes: serde_json::Value,
}

impl RazorpayPaymentList {
    fn into_capture_result(self) -> CaptureResult {
        let captured = self.items.into_iter().find(|p| p.status == "captured");
        match captured {
            Some(payment) => CaptureResult {
                completed: true,
                cart_id: payment
                    .notes
                    .get(CART_ID_NOTE)
                    .and_then(|v| v.as_str())
                    .and_then(|s| s.parse::<CartId>().ok()),
                transaction_id: Some(payment.id),
                payment_method: payment.method,
            },
            None => CaptureResult {
                completed: false,
                transaction_id: None,
                cart_id: None,
                payment_method: None,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct RazorpayErrorBody {
    error: RazorpayErrorDetail,
}

#[derive(Debug, Deserialize)]
struct RazorpayErrorDetail {
    code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Currency, Money, PaymentId};
    use crate::domain::gateway::sign_hex;

    fn test_gateway() -> RazorpayGateway {
        RazorpayGateway::new(RazorpayConfig::new(
            "rzp_test_key",
            SecretString::new("key_secret".to_string()),
            SecretString::new("webhook_secret".to_string()),
        ))
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Signature Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn accepts_webhook_signed_with_webhook_secret() {
        let gateway = test_gateway();
        let body = br#"{"event":"payment.captured"}"#;
        let headers = WebhookHeaders::new()
            .with("X-Razorpay-Signature", sign_hex("webhook_secret", body));

        assert!(gateway.verify_webhook(&headers, body).await.unwrap());
    }

    #[tokio::test]
    async fn rejects_webhook_signed_with_key_secret() {
        let gateway = test_gateway();
        let body = br#"{"event":"payment.captured"}"#;
        let headers =
            WebhookHeaders::new().with("X-Razorpay-Signature", sign_hex("key_secret", body));

        assert!(!gateway.verify_webhook(&headers, body).await.unwrap());
    }

    #[tokio::test]
    async fn rejects_webhook_without_signature() {
        let gateway = test_gateway();
        assert!(!gateway.verify_webhook(&WebhookHeaders::new(), b"{}").await.unwrap());
    }

    #[test]
    fn client_confirmation_uses_order_and_payment_ids() {
        let gateway = test_gateway();
        let sig = sign_hex("key_secret", b"order_1|pay_1");

        assert!(gateway.verify_client_confirmation("order_1", "pay_1", &sig).unwrap());
        assert!(!gateway.verify_client_confirmation("order_1", "pay_2", &sig).unwrap());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Wire Format Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn order_body_carries_minor_units_and_cart_note() {
        let cart_id = CartId::new();
        let request = GatewayOrderRequest {
            cart_id,
            payment_id: PaymentId::new("ord_abc").unwrap(),
            amount: Money::from_minor(39_900, Currency::Inr),
            description: "pro monthly".into(),
            customer_email: "a@b.co".into(),
        };

        let body = serde_json::to_value(CreateOrderBody::from_request(&request)).unwrap();

        assert_eq!(body["amount"], 39_900);
        assert_eq!(body["currency"], "INR");
        assert_eq!(body["receipt"], "ord_abc");
        assert_eq!(body["notes"]["cart_id"], cart_id.to_string());
    }

    #[test]
    fn captured_payment_completes() {
        let cart_id = CartId::new();
        let list: RazorpayPaymentList = serde_json::from_value(serde_json::json!({
            "items": [
                {"id": "pay_failed", "status": "failed", "method": "card", "notes": {}},
                {"id": "pay_ok", "status": "captured", "method": "upi", "notes": {"cart_id": cart_id.to_string()}}
            ]
        }))
        .unwrap();

        let result = list.into_capture_result();

        assert!(result.completed);
        assert_eq!(result.transaction_id.as_deref(), Some("pay_ok"));
        assert_eq!(result.payment_method.as_deref(), Some("upi"));
        assert_eq!(result.cart_id, Some(cart_id));
    }

    #[test]
    fn no_captured_payment_is_not_completed() {
        let list: RazorpayPaymentList = serde_json::from_value(serde_json::json!({
            "items": [{"id": "pay_1", "status": "authorized", "method": "card"}]
        }))
        .unwrap();

        assert!(!list.into_capture_result().completed);
    }
}
