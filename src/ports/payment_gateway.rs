//! Payment gateway port.
//!
//! Defines the contract each gateway integration (Razorpay, PayPal) offers
//! to the checkout flow: open an order, capture it, and verify webhooks.
//!
//! # Design
//!
//! - **One adapter per gateway**: `GatewayRegistry` picks by `Gateway`
//! - **Verification lives with the gateway**: Razorpay checks HMACs locally,
//!   PayPal asks its API

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::cart::Gateway;
use crate::domain::foundation::{CartId, Money, PaymentId};
use crate::domain::gateway::WebhookHeaders;

/// Port for a single payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Which gateway this adapter talks to.
    fn gateway(&self) -> Gateway;

    /// Opens an order for the cart's total.
    async fn create_order(&self, request: &GatewayOrderRequest)
        -> Result<GatewayOrder, PaymentGatewayError>;

    /// Captures an approved order (redirect flows).
    async fn capture_order(&self, order_id: &str) -> Result<CaptureResult, PaymentGatewayError>;

    /// Verifies a webhook delivery. `Ok(false)` means the signature is bad.
    async fn verify_webhook(
        &self,
        headers: &WebhookHeaders,
        body: &[u8],
    ) -> Result<bool, PaymentGatewayError>;

    /// Verifies a browser-relayed confirmation signature.
    ///
    /// Only gateways with a client-side checkout implement this.
    fn verify_client_confirmation(
        &self,
        _order_id: &str,
        _payment_id: &str,
        _signature: &str,
    ) -> Result<bool, PaymentGatewayError> {
        Err(PaymentGatewayError::new(
            PaymentGatewayErrorCode::Unsupported,
            format!("{} has no client confirmation flow", self.gateway()),
        ))
    }
}

/// Request to open a gateway order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrderRequest {
    pub cart_id: CartId,
    pub payment_id: PaymentId,
    pub amount: Money,
    pub description: String,
    pub customer_email: String,
}

/// An order opened with the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayOrder {
    /// Gateway's order id.
    pub id: String,
    /// Where to send the browser, for hosted-page gateways.
    pub approval_url: Option<String>,
}

/// Outcome of capturing an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureResult {
    pub completed: bool,
    pub transaction_id: Option<String>,
    /// Cart id echoed back by the gateway, when it carries one.
    pub cart_id: Option<CartId>,
    pub payment_method: Option<String>,
}

/// Errors from gateway operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentGatewayError {
    pub code: PaymentGatewayErrorCode,
    pub message: String,
    /// Gateway's own error code, if it sent one.
    pub provider_code: Option<String>,
}

impl PaymentGatewayError {
    pub fn new(code: PaymentGatewayErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
        }
    }

    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(PaymentGatewayErrorCode::NetworkError, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(PaymentGatewayErrorCode::AuthenticationError, message)
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(PaymentGatewayErrorCode::ProviderError, message)
    }

    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

impl std::fmt::Display for PaymentGatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for PaymentGatewayError {}

/// Gateway error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentGatewayErrorCode {
    NetworkError,
    AuthenticationError,
    Declined,
    NotFound,
    ProviderError,
    Unsupported,
}

impl PaymentGatewayErrorCode {
    pub fn is_retryable(&self) -> bool {
        matches!(self, PaymentGatewayErrorCode::NetworkError)
    }
}

impl std::fmt::Display for PaymentGatewayErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentGatewayErrorCode::NetworkError => "network_error",
            PaymentGatewayErrorCode::AuthenticationError => "authentication_error",
            PaymentGatewayErrorCode::Declined => "declined",
            PaymentGatewayErrorCode::NotFound => "not_found",
            PaymentGatewayErrorCode::ProviderError => "provider_error",
            PaymentGatewayErrorCode::Unsupported => "unsupported",
        };
        write!(f, "{}", s)
    }
}

/// The configured gateway adapters, one per `Gateway`.
#[derive(Clone)]
pub struct GatewayRegistry {
    razorpay: Arc<dyn PaymentGateway>,
    paypal: Arc<dyn PaymentGateway>,
}

impl GatewayRegistry {
    pub fn new(razorpay: Arc<dyn PaymentGateway>, paypal: Arc<dyn PaymentGateway>) -> Self {
        Self { razorpay, paypal }
    }

    pub fn get(&self, gateway: Gateway) -> Arc<dyn PaymentGateway> {
        match gateway {
            Gateway::Razorpay => self.razorpay.clone(),
            Gateway::Paypal => self.paypal.clone(),
        }
    }
}
