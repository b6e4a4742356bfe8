//! Mock payment gateway for testing.
//!
//! Supports:
//! - Pre-configured order and capture responses
//! - Error injection
//! - Call tracking
//! - Real Razorpay HMAC verification when built with secrets

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use secrecy::SecretString;

use crate::domain::cart::Gateway;
use crate::domain::gateway::{RazorpaySignatureVerifier, WebhookHeaders, RAZORPAY_SIGNATURE_HEADER};
use crate::ports::{
    CaptureResult, GatewayOrder, GatewayOrderRequest, PaymentGateway, PaymentGatewayError,
};

/// Mock gateway.
///
/// # Example
///
/// ```ignore
/// let mock = MockPaymentGateway::new(Gateway::Paypal);
/// mock.fail_next(PaymentGatewayError::network("timeout"));
/// assert!(mock.capture_order("ORDER-1").await.is_err());
/// assert_eq!(mock.calls(), vec!["capture_order:ORDER-1"]);
/// ```
#[derive(Clone)]
pub struct MockPaymentGateway {
    gateway: Gateway,
    verifier: Option<Arc<RazorpaySignatureVerifier>>,
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    next_capture: Option<CaptureResult>,
    next_error: Option<PaymentGatewayError>,
    reject_webhooks: bool,
    calls: Vec<String>,
}

impl MockPaymentGateway {
    /// Accepts every webhook and captures every order.
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway,
            verifier: None,
            inner: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Razorpay mock that checks signatures for real.
    pub fn razorpay_signed(key_secret: &str, webhook_secret: &str) -> Self {
        let mut mock = Self::new(Gateway::Razorpay);
        mock.verifier = Some(Arc::new(RazorpaySignatureVerifier::new(
            SecretString::new(key_secret.to_string()),
            SecretString::new(webhook_secret.to_string()),
        )));
        mock
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Result returned by the next `capture_order`.
    pub fn set_capture(&self, result: CaptureResult) {
        self.state().next_capture = Some(result);
    }

    /// Error returned by the next call of any kind.
    pub fn fail_next(&self, error: PaymentGatewayError) {
        self.state().next_error = Some(error);
    }

    /// Every webhook verification fails from now on.
    pub fn reject_webhooks(&self) {
        self.state().reject_webhooks = true;
    }

    /// Calls made so far, as `method:arg`.
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    fn record(&self, call: String) -> Result<(), PaymentGatewayError> {
        let mut state = self.state();
        state.calls.push(call);
        match state.next_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    fn gateway(&self) -> Gateway {
        self.gateway
    }

    async fn create_order(
        &self,
        request: &GatewayOrderRequest,
    ) -> Result<GatewayOrder, PaymentGatewayError> {
        self.record(format!("create_order:{}", request.cart_id))?;
        let id = format!("order_{}", request.payment_id.as_str().trim_start_matches("ord_"));
        let approval_url = match self.gateway {
            Gateway::Paypal => Some(format!("https://paypal.test/checkoutnow?token={}", id)),
            Gateway::Razorpay => None,
        };
        Ok(GatewayOrder { id, approval_url })
    }

    async fn capture_order(&self, order_id: &str) -> Result<CaptureResult, PaymentGatewayError> {
        self.record(format!("capture_order:{}", order_id))?;
        let configured = self.state().next_capture.take();
        Ok(configured.unwrap_or_else(|| CaptureResult {
            completed: true,
            transaction_id: Some(format!("CAP-{}", order_id)),
            cart_id: None,
            payment_method: Some(self.gateway.to_string()),
        }))
    }

    async fn verify_webhook(
        &self,
        headers: &WebhookHeaders,
        body: &[u8],
    ) -> Result<bool, PaymentGatewayError> {
        self.record("verify_webhook".to_string())?;
        if self.state().reject_webhooks {
            return Ok(false);
        }
        match &self.verifier {
            Some(verifier) => {
                let signature = headers.get(RAZORPAY_SIGNATURE_HEADER).unwrap_or_default();
                Ok(verifier.verify_webhook(body, signature).is_ok())
            }
            None => Ok(true),
        }
    }

    fn verify_client_confirmation(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<bool, PaymentGatewayError> {
        self.record(format!("verify_client_confirmation:{}", order_id))?;
        match &self.verifier {
            Some(verifier) => Ok(verifier
                .verify_client_confirmation(order_id, payment_id, signature)
                .is_ok()),
            None => Ok(!self.state().reject_webhooks),
        }
    }
}
