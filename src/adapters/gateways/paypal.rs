//! PayPal payment gateway adapter.
//!
//! Implements `PaymentGateway` against the PayPal Orders v2 API.
//!
//! Flow: `create_order` returns an approval link; the buyer approves on
//! PayPal and is sent back with the order id; `capture_order` captures it.
//! Webhooks are verified by PayPal's own verification endpoint.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::domain::cart::Gateway;
use crate::domain::foundation::{CartId, Money};
use crate::domain::gateway::WebhookHeaders;
use crate::ports::{
    CaptureResult, GatewayOrder, GatewayOrderRequest, PaymentGateway, PaymentGatewayError,
    PaymentGatewayErrorCode,
};

const SANDBOX_API_BASE: &str = "https://api-m.sandbox.paypal.com";

/// Headers PayPal signs a webhook delivery with.
const TRANSMISSION_HEADERS: [(&str, &str); 5] = [
    ("paypal-auth-algo", "auth_algo"),
    ("paypal-cert-url", "cert_url"),
    ("paypal-transmission-id", "transmission_id"),
    ("paypal-transmission-sig", "transmission_sig"),
    ("paypal-transmission-time", "transmission_time"),
];

/// PayPal API configuration.
#[derive(Clone)]
pub struct PaypalConfig {
    client_id: String,
    client_secret: SecretString,
    webhook_id: String,
    api_base_url: String,
    return_url: String,
    cancel_url: String,
}

impl PaypalConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: SecretString,
        webhook_id: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
            webhook_id: webhook_id.into(),
            api_base_url: SANDBOX_API_BASE.to_string(),
            return_url: String::new(),
            cancel_url: String::new(),
        }
    }

    /// Live or sandbox API base.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Where PayPal sends the buyer after approval / cancellation.
    pub fn with_redirects(mut self, return_url: impl Into<String>, cancel_url: impl Into<String>) -> Self {
        self.return_url = return_url.into();
        self.cancel_url = cancel_url.into();
        self
    }
}

/// PayPal gateway adapter.
pub struct PaypalGateway {
    config: PaypalConfig,
    http_client: reqwest::Client,
}

impl PaypalGateway {
    pub fn new(config: PaypalConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url, path)
    }

    /// Client-credentials access token.
    async fn access_token(&self) -> Result<String, PaymentGatewayError> {
        let response = self
            .http_client
            .post(self.url("/v1/oauth2/token"))
            .basic_auth(
                &self.config.client_id,
                Some(self.config.client_secret.expose_secret()),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| PaymentGatewayError::network(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(error = %error_text, "PayPal token request failed");
            return Err(PaymentGatewayError::authentication(format!(
                "PayPal token error: {}",
                error_text
            )));
        }

        let token: AccessTokenResponse = response.json().await.map_err(|e| {
            PaymentGatewayError::provider(format!("Failed to parse PayPal token: {}", e))
        })?;
        Ok(token.access_token)
    }

    async fn read_error(response: reqwest::Response, operation: &str) -> PaymentGatewayError {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        tracing::error!(status = %status, error = %error_text, "PayPal {} failed", operation);

        let provider_code = serde_json::from_str::<PaypalErrorBody>(&error_text)
            .ok()
            .map(|b| b.name);
        let code = match status {
            reqwest::StatusCode::UNAUTHORIZED => PaymentGatewayErrorCode::AuthenticationError,
            reqwest::StatusCode::NOT_FOUND => PaymentGatewayErrorCode::NotFound,
            reqwest::StatusCode::UNPROCESSABLE_ENTITY => PaymentGatewayErrorCode::Declined,
            s if s.is_server_error() => PaymentGatewayErrorCode::NetworkError,
            _ => PaymentGatewayErrorCode::ProviderError,
        };
        let err = PaymentGatewayError::new(code, format!("PayPal API error: {}", error_text));
        match provider_code {
            Some(c) => err.with_provider_code(c),
            None => err,
        }
    }
}

#[async_trait]
impl PaymentGateway for PaypalGateway {
    fn gateway(&self) -> Gateway {
        Gateway::Paypal
    }

    async fn create_order(
        &self,
        request: &GatewayOrderRequest,
    ) -> Result<GatewayOrder, PaymentGatewayError> {
        let token = self.access_token().await?;
        let body = CreateOrderBody::new(request, &self.config);

        let response = self
            .http_client
            .post(self.url("/v2/checkout/orders"))
            .bearer_auth(&token)
            .header("PayPal-Request-Id", request.payment_id.as_str())
            .json(&body)
            .send()
            .await
            .map_err(|e| PaymentGatewayError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::read_error(response, "create_order").await);
        }

        let order: OrderResponse = response.json().await.map_err(|e| {
            PaymentGatewayError::provider(format!("Failed to parse PayPal response: {}", e))
        })?;

        tracing::info!(cart_id = %request.cart_id, order_id = %order.id, "PayPal order created");

        let approval_url = order.approval_link();
        Ok(GatewayOrder {
            id: order.id,
            approval_url,
        })
    }

    async fn capture_order(&self, order_id: &str) -> Result<CaptureResult, PaymentGatewayError> {
        let token = self.access_token().await?;

        let response = self
            .http_client
            .post(self.url(&format!("/v2/checkout/orders/{}/capture", order_id)))
            .bearer_auth(&token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body("{}")
            .send()
            .await
            .map_err(|e| PaymentGatewayError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::read_error(response, "capture_order").await);
        }

        let order: OrderResponse = response.json().await.map_err(|e| {
            PaymentGatewayError::provider(format!("Failed to parse PayPal capture: {}", e))
        })?;

        Ok(order.into_capture_result())
    }

    async fn verify_webhook(
        &self,
        headers: &WebhookHeaders,
        body: &[u8],
    ) -> Result<bool, PaymentGatewayError> {
        let Some(request) = VerifySignatureBody::build(headers, body, &self.config.webhook_id)
        else {
            return Ok(false);
        };

        let token = self.access_token().await?;
        let response = self
            .http_client
            .post(self.url("/v1/notifications/verify-webhook-signature"))
            .bearer_auth(&token)
            .json(&request)
            .send()
            .await
            .map_err(|e| PaymentGatewayError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::read_error(response, "verify_webhook").await);
        }

        let verdict: VerifySignatureResponse = response.json().await.map_err(|e| {
            PaymentGatewayError::provider(format!("Failed to parse PayPal verification: {}", e))
        })?;
        Ok(verdict.verification_status == "SUCCESS")
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Wire types
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: String,
}

#[derive(Debug, Serialize)]
struct CreateOrderBody {
    intent: &'static str,
    purchase_units: Vec<PurchaseUnit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    application_context: Option<ApplicationContext>,
}

#[derive(Debug, Serialize)]
struct PurchaseUnit {
    reference_id: String,
    custom_id: String,
    description: String,
    amount: PaypalAmount,
}

#[derive(Debug, Serialize)]
struct PaypalAmount {
    currency_code: &'static str,
    value: String,
}

#[derive(Debug, Serialize)]
struct ApplicationContext {
    return_url: String,
    cancel_url: String,
    user_action: &'static str,
}

impl CreateOrderBody {
    fn new(request: &GatewayOrderRequest, config: &PaypalConfig) -> Self {
        let application_context = if config.return_url.is_empty() {
            None
        } else {
            let with_cart = |base: &str| {
                let sep = if base.contains('?') { '&' } else { '?' };
                format!("{}{}cartId={}", base, sep, request.cart_id)
            };
            Some(ApplicationContext {
                return_url: with_cart(&config.return_url),
                cancel_url: with_cart(&config.cancel_url),
                user_action: "PAY_NOW",
            })
        };

        Self {
            intent: "CAPTURE",
            purchase_units: vec![PurchaseUnit {
                reference_id: request.payment_id.as_str().to_string(),
                custom_id: request.cart_id.to_string(),
                description: request.description.clone(),
                amount: PaypalAmount {
                    currency_code: request.amount.currency().code(),
                    value: decimal_value(request.amount),
                },
            }],
            application_context,
        }
    }
}

/// PayPal wants amounts as decimal strings with two places.
fn decimal_value(amount: Money) -> String {
    let per = amount.currency().minor_per_major();
    let minor = amount.minor();
    format!("{}.{:02}", minor / per, minor % per)
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    id: String,
    status: Option<String>,
    #[serde(default)]
    links: Vec<Link>,
    #[serde(default)]
    purchase_units: Vec<OrderPurchaseUnit>,
}

#[derive(Debug, Deserialize)]
struct Link {
    href: String,
    rel: String,
}

#[derive(Debug, Deserialize)]
struct OrderPurchaseUnit {
    custom_id: Option<String>,
    payments: Option<OrderPayments>,
}

#[derive(Debug, Deserialize)]
struct OrderPayments {
    #[serde(default)]
    captures: Vec<Capture>,
}

#[derive(Debug, Deserialize)]
struct Capture {
    id: String,
    status: String,
    custom_id: Option<String>,
}

impl OrderResponse {
    fn approval_link(&self) -> Option<String> {
        self.links
            .iter()
            .find(|l| l.rel == "approve" || l.rel == "payer-action")
            .map(|l| l.href.clone())
    }

    fn into_capture_result(self) -> CaptureResult {
        let order_completed = self.status.as_deref() == Some("COMPLETED");
        let unit = self.purchase_units.into_iter().next();
        let (unit_custom_id, captures) = match unit {
            Some(u) => (
                u.custom_id,
                u.payments.map(|p| p.captures).unwrap_or_default(),
            ),
            None => (None, Vec::new()),
        };
        let capture = captures.into_iter().find(|c| c.status == "COMPLETED");
        let completed = order_completed && capture.is_some();

        let cart_id = capture
            .as_ref()
            .and_then(|c| c.custom_id.clone())
            .or(unit_custom_id)
            .and_then(|s| s.parse::<CartId>().ok());

        CaptureResult {
            completed,
            transaction_id: capture.map(|c| c.id),
            cart_id,
            payment_method: Some("paypal".to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct VerifySignatureBody {
    auth_algo: String,
    cert_url: String,
    transmission_id: String,
    transmission_sig: String,
    transmission_time: String,
    webhook_id: String,
    webhook_event: serde_json::Value,
}

impl VerifySignatureBody {
    /// `None` when a transmission header is missing or the body is not JSON.
    fn build(headers: &WebhookHeaders, body: &[u8], webhook_id: &str) -> Option<Self> {
        let mut values = TRANSMISSION_HEADERS
            .iter()
            .map(|(header, _)| headers.get(header).map(str::to_string));
        let auth_algo = values.next()??;
        let cert_url = values.next()??;
        let transmission_id = values.next()??;
        let transmission_sig = values.next()??;
        let transmission_time = values.next()??;
        let webhook_event = serde_json::from_slice(body).ok()?;

        Some(Self {
            auth_algo,
            cert_url,
            transmission_id,
            transmission_sig,
            transmission_time,
            webhook_id: webhook_id.to_string(),
            webhook_event,
        })
    }
}

#[derive(Debug, Deserialize)]
struct VerifySignatureResponse {
    verification_status: String,
}

#[derive(Debug, Deserialize)]
struct PaypalErrorBody {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Currency, PaymentId};

    fn config() -> PaypalConfig {
        PaypalConfig::new("client", SecretString::new("secret".to_string()), "WH-1")
            .with_redirects("https://shop.test/paypal/return", "https://shop.test/checkout?x=1")
    }

    fn request(cart_id: CartId) -> GatewayOrderRequest {
        GatewayOrderRequest {
            cart_id,
            payment_id: PaymentId::new("ord_1").unwrap(),
            amount: Money::from_minor(1_900, Currency::Usd),
            description: "pro monthly".into(),
            customer_email: "a@b.co".into(),
        }
    }

    fn signed_headers() -> WebhookHeaders {
        WebhookHeaders::new()
            .with("PAYPAL-AUTH-ALGO", "SHA256withRSA")
            .with("PAYPAL-CERT-URL", "https://api.paypal.com/cert")
            .with("PAYPAL-TRANSMISSION-ID", "tx-1")
            .with("PAYPAL-TRANSMISSION-SIG", "sig")
            .with("PAYPAL-TRANSMISSION-TIME", "2024-01-01T00:00:00Z")
    }

    #[test]
    fn decimal_value_has_two_places() {
        assert_eq!(decimal_value(Money::from_minor(1_900, Currency::Usd)), "19.00");
        assert_eq!(decimal_value(Money::from_minor(905, Currency::Eur)), "9.05");
    }

    #[test]
    fn order_body_carries_cart_as_custom_id() {
        let cart_id = CartId::new();
        let body = serde_json::to_value(CreateOrderBody::new(&request(cart_id), &config())).unwrap();

        assert_eq!(body["intent"], "CAPTURE");
        assert_eq!(body["purchase_units"][0]["custom_id"], cart_id.to_string());
        assert_eq!(body["purchase_units"][0]["amount"]["value"], "19.00");
        assert_eq!(body["purchase_units"][0]["amount"]["currency_code"], "USD");
        assert_eq!(
            body["application_context"]["return_url"],
            format!("https://shop.test/paypal/return?cartId={}", cart_id)
        );
        assert_eq!(
            body["application_context"]["cancel_url"],
            format!("https://shop.test/checkout?x=1&cartId={}", cart_id)
        );
    }

    #[test]
    fn approval_link_is_found() {
        let order: OrderResponse = serde_json::from_value(serde_json::json!({
            "id": "5O190127TN364715T",
            "status": "CREATED",
            "links": [
                {"href": "https://api.paypal.com/v2/checkout/orders/5O1", "rel": "self"},
                {"href": "https://www.paypal.com/checkoutnow?token=5O1", "rel": "approve"}
            ]
        }))
        .unwrap();

        assert_eq!(
            order.approval_link().as_deref(),
            Some("https://www.paypal.com/checkoutnow?token=5O1")
        );
    }

    #[test]
    fn completed_capture_yields_transaction_and_cart() {
        let cart_id = CartId::new();
        let order: OrderResponse = serde_json::from_value(serde_json::json!({
            "id": "ORDER-1",
            "status": "COMPLETED",
            "purchase_units": [{
                "custom_id": cart_id.to_string(),
                "payments": {"captures": [{"id": "CAP-9", "status": "COMPLETED"}]}
            }]
        }))
        .unwrap();

        let result = order.into_capture_result();

        assert!(result.completed);
        assert_eq!(result.transaction_id.as_deref(), Some("CAP-9"));
        assert_eq!(result.cart_id, Some(cart_id));
    }

    #[test]
    fn pending_capture_is_not_completed() {
        let order: OrderResponse = serde_json::from_value(serde_json::json!({
            "id": "ORDER-1",
            "status": "COMPLETED",
            "purchase_units": [{
                "payments": {"captures": [{"id": "CAP-9", "status": "PENDING"}]}
            }]
        }))
        .unwrap();

        assert!(!order.into_capture_result().completed);
    }

    #[test]
    fn verification_body_needs_every_transmission_header() {
        let body = br#"{"event_type":"PAYMENT.CAPTURE.COMPLETED"}"#;

        let built = VerifySignatureBody::build(&signed_headers(), body, "WH-1").unwrap();
        assert_eq!(built.transmission_id, "tx-1");
        assert_eq!(built.webhook_id, "WH-1");

        let partial = WebhookHeaders::new().with("paypal-transmission-id", "tx-1");
        assert!(VerifySignatureBody::build(&partial, body, "WH-1").is_none());
    }

    #[tokio::test]
    async fn missing_headers_fail_verification_without_network() {
        let gateway = PaypalGateway::new(config().with_base_url("http://127.0.0.1:9"));
        let verified = gateway
            .verify_webhook(&WebhookHeaders::new(), b"{}")
            .await
            .unwrap();
        assert!(!verified);
    }
}
