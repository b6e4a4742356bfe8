//! ProcessGatewayEventHandler - Turns gateway callbacks into cart updates.
//!
//! Redirects are captured, webhooks and client confirmations are verified,
//! and every resulting status change goes through `UpdateCartPaymentHandler`.
//! Nothing touches the cart until verification has passed.

use std::sync::Arc;

use crate::application::handlers::checkout::{
    SoftFailures, UpdateCartPaymentCommand, UpdateCartPaymentHandler, UpdateCartPaymentResult,
};
use crate::domain::cart::{Cart, CheckoutError, Gateway, PaymentChange, PaymentStatus, Transition};
use crate::domain::foundation::CartId;
use crate::domain::gateway::{
    GatewayError, GatewayEvent, PaymentUpdate, PaypalWebhook, RazorpayWebhook, WebhookHeaders,
    RAZORPAY_SIGNATURE_HEADER,
};
use crate::ports::{CartRepository, GatewayRegistry, PaymentGatewayError, PaymentGatewayErrorCode};

/// Command carrying one raw gateway callback.
#[derive(Debug, Clone)]
pub struct ProcessGatewayEventCommand {
    pub event: GatewayEvent,
}

/// Handler for gateway callbacks.
pub struct ProcessGatewayEventHandler {
    carts: Arc<dyn CartRepository>,
    gateways: GatewayRegistry,
    payments: Arc<UpdateCartPaymentHandler>,
}

impl ProcessGatewayEventHandler {
    pub fn new(
        carts: Arc<dyn CartRepository>,
        gateways: GatewayRegistry,
        payments: Arc<UpdateCartPaymentHandler>,
    ) -> Self {
        Self {
            carts,
            gateways,
            payments,
        }
    }

    /// Processes one callback.
    ///
    /// `GatewayError::Ignored` and `GatewayError::Conflict` are acknowledged
    /// outcomes, not failures; callers answer them with a 2xx.
    pub async fn handle(
        &self,
        cmd: ProcessGatewayEventCommand,
    ) -> Result<UpdateCartPaymentResult, GatewayError> {
        let gateway = cmd.event.gateway();
        let kind = cmd.event.kind();
        tracing::debug!(gateway = %gateway, kind, "Processing gateway event");

        match cmd.event {
            GatewayEvent::Redirect {
                gateway,
                cart_id,
                order_id,
            } => self.handle_redirect(gateway, cart_id, &order_id).await,
            GatewayEvent::Webhook {
                gateway,
                headers,
                body,
            } => self.handle_webhook(gateway, &headers, &body).await,
            GatewayEvent::ClientConfirm {
                gateway,
                cart_id,
                order_id,
                payment_id,
                signature,
            } => {
                self.handle_client_confirm(gateway, cart_id, &order_id, &payment_id, &signature)
                    .await
            }
        }
    }

    async fn handle_redirect(
        &self,
        gateway: Gateway,
        cart_id: CartId,
        order_id: &str,
    ) -> Result<UpdateCartPaymentResult, GatewayError> {
        let cart = self.load(cart_id, gateway).await?;

        // A refreshed return page must not capture twice
        if cart.is_completed() {
            return Ok(UpdateCartPaymentResult {
                cart,
                transition: Transition::Unchanged,
                soft: SoftFailures::default(),
            });
        }

        let capture = self
            .gateways
            .get(gateway)
            .capture_order(order_id)
            .await
            .map_err(|e| upstream(gateway, &cart_id, e))?;
        if !capture.completed {
            tracing::warn!(cart_id = %cart_id, gateway = %gateway, order_id, "Capture did not complete");
            return Err(GatewayError::Upstream("capture not completed".to_string()));
        }
        if let Some(captured_for) = capture.cart_id {
            if captured_for != cart_id {
                tracing::warn!(
                    target: "security",
                    cart_id = %cart_id,
                    captured_for = %captured_for,
                    order_id,
                    "Captured order belongs to another cart"
                );
                return Err(GatewayError::ParseError(
                    "order does not belong to this cart".to_string(),
                ));
            }
        }
        let transaction_id = capture
            .transaction_id
            .ok_or(GatewayError::MissingField("capture id"))?;

        let change = PaymentChange::to(PaymentStatus::Completed)
            .with_transaction(transaction_id)
            .with_method(capture.payment_method);
        self.apply(cart_id, change).await
    }

    async fn handle_webhook(
        &self,
        gateway: Gateway,
        headers: &WebhookHeaders,
        body: &[u8],
    ) -> Result<UpdateCartPaymentResult, GatewayError> {
        // 1. Verify before anything else
        if gateway == Gateway::Razorpay && headers.get(RAZORPAY_SIGNATURE_HEADER).is_none() {
            tracing::warn!(target: "security", gateway = %gateway, "Webhook without signature");
            return Err(GatewayError::MissingSignature);
        }
        let verified = self
            .gateways
            .get(gateway)
            .verify_webhook(headers, body)
            .await
            .map_err(|e| {
                tracing::warn!(gateway = %gateway, error = %e, "Webhook verification call failed");
                GatewayError::Upstream(e.message)
            })?;
        if !verified {
            tracing::warn!(target: "security", gateway = %gateway, "Webhook signature rejected");
            return Err(GatewayError::InvalidSignature);
        }

        // 2. Normalize
        let update: PaymentUpdate = match gateway {
            Gateway::Razorpay => RazorpayWebhook::parse(body)?.into_update(),
            Gateway::Paypal => PaypalWebhook::parse(body)?.into_update(),
        }
        .map_err(|e| {
            if let GatewayError::Ignored(event) = &e {
                tracing::info!(gateway = %gateway, event = %event, "Webhook event ignored");
            }
            e
        })?;

        // 3. Apply
        self.load(update.cart_id, gateway).await?;
        let (cart_id, change) = update.into_change();
        self.apply(cart_id, change).await
    }

    async fn handle_client_confirm(
        &self,
        gateway: Gateway,
        cart_id: CartId,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<UpdateCartPaymentResult, GatewayError> {
        if signature.trim().is_empty() {
            tracing::warn!(target: "security", cart_id = %cart_id, "Client confirmation without signature");
            return Err(GatewayError::MissingSignature);
        }
        let verified = self
            .gateways
            .get(gateway)
            .verify_client_confirmation(order_id, payment_id, signature)
            .map_err(|e| match e.code {
                PaymentGatewayErrorCode::Unsupported => GatewayError::ParseError(e.message),
                _ => GatewayError::Upstream(e.message),
            })?;
        if !verified {
            tracing::warn!(
                target: "security",
                cart_id = %cart_id,
                order_id,
                "Client confirmation signature rejected"
            );
            return Err(GatewayError::InvalidSignature);
        }

        // A valid signature for some other order proves nothing about this cart
        let cart = self.load(cart_id, gateway).await?;
        let expected = cart.payment.gateway_order_id.as_deref();
        if expected != Some(order_id) {
            tracing::warn!(
                target: "security",
                cart_id = %cart_id,
                expected = expected.unwrap_or("<none>"),
                order_id,
                "Client confirmation for an order not opened by this cart"
            );
            return Err(GatewayError::ParseError(
                "order does not belong to this cart".to_string(),
            ));
        }

        let change = PaymentChange::to(PaymentStatus::Completed).with_transaction(payment_id);
        self.apply(cart_id, change).await
    }

    /// Loads the cart and checks it was routed to `gateway`.
    async fn load(&self, cart_id: CartId, gateway: Gateway) -> Result<Cart, GatewayError> {
        let cart = self
            .carts
            .find_by_id(&cart_id)
            .await
            .map_err(|e| GatewayError::Database(e.message))?
            .ok_or(GatewayError::CartNotFound)?;
        if cart.payment.gateway != gateway {
            tracing::warn!(
                cart_id = %cart_id,
                expected = %cart.payment.gateway,
                received = %gateway,
                "Gateway callback for a cart routed elsewhere"
            );
            return Err(GatewayError::Conflict(format!(
                "cart is paid through {}",
                cart.payment.gateway
            )));
        }
        Ok(cart)
    }

    async fn apply(
        &self,
        cart_id: CartId,
        change: PaymentChange,
    ) -> Result<UpdateCartPaymentResult, GatewayError> {
        self.payments
            .handle(UpdateCartPaymentCommand::new(cart_id, change))
            .await
            .map_err(|e| {
                let mapped = to_gateway_error(e);
                if mapped.is_acknowledged() {
                    tracing::info!(cart_id = %cart_id, reason = %mapped, "Gateway update acknowledged as no-op");
                }
                mapped
            })
    }
}

fn upstream(gateway: Gateway, cart_id: &CartId, err: PaymentGatewayError) -> GatewayError {
    tracing::warn!(
        cart_id = %cart_id,
        gateway = %gateway,
        error = %err,
        retryable = err.is_retryable(),
        "Gateway capture failed"
    );
    GatewayError::Upstream(err.message)
}

fn to_gateway_error(err: CheckoutError) -> GatewayError {
    match err {
        CheckoutError::CartNotFound(_) => GatewayError::CartNotFound,
        CheckoutError::InvalidTransition { from, to } => {
            GatewayError::Conflict(format!("{} -> {}", from, to))
        }
        CheckoutError::AlreadyCompleted(_) => GatewayError::Conflict("already completed".into()),
        CheckoutError::ValidationFailed { field, message } => {
            GatewayError::ParseError(format!("{}: {}", field, message))
        }
        CheckoutError::Gateway(message) => GatewayError::Upstream(message),
        other => GatewayError::Database(other.message()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::email::RecordingEmailSender;
    use crate::adapters::gateways::MockPaymentGateway;
    use crate::adapters::memory::{InMemoryCartRepository, InMemoryCouponRepository};
    use crate::application::handlers::checkout::CompletionEffects;
    use crate::domain::cart::{new_cart, PlanName};
    use crate::domain::foundation::Timestamp;
    use crate::domain::gateway::sign_hex;
    use crate::domain::signup::SignupTokenService;
    use crate::ports::CaptureResult;
    use secrecy::SecretString;

    const KEY_SECRET: &str = "rzp_key_secret";
    const WEBHOOK_SECRET: &str = "rzp_webhook_secret";

    struct Fixture {
        handler: ProcessGatewayEventHandler,
        carts: InMemoryCartRepository,
        razorpay: MockPaymentGateway,
        paypal: MockPaymentGateway,
        email: RecordingEmailSender,
    }

    fn fixture() -> Fixture {
        let carts = InMemoryCartRepository::new();
        let email = RecordingEmailSender::new();
        let razorpay = MockPaymentGateway::razorpay_signed(KEY_SECRET, WEBHOOK_SECRET);
        let paypal = MockPaymentGateway::new(Gateway::Paypal);
        let effects = CompletionEffects::new(
            Arc::new(SignupTokenService::new(SecretString::new("signup".to_string()))),
            Arc::new(InMemoryCouponRepository::new()),
            Arc::new(email.clone()),
        );
        let payments = Arc::new(UpdateCartPaymentHandler::new(Arc::new(carts.clone()), effects));
        let handler = ProcessGatewayEventHandler::new(
            Arc::new(carts.clone()),
            GatewayRegistry::new(Arc::new(razorpay.clone()), Arc::new(paypal.clone())),
            payments,
        );
        Fixture {
            handler,
            carts,
            razorpay,
            paypal,
            email,
        }
    }

    async fn stored_cart(f: &Fixture, gateway: Gateway) -> Cart {
        let mut cart = new_cart(PlanName::Basic, 49_900);
        cart.payment.gateway = gateway;
        f.carts.save(&cart).await.unwrap();
        cart
    }

    fn razorpay_body(event: &str, cart_id: &CartId) -> Vec<u8> {
        format!(
            r#"{{"event":"{}","payload":{{"payment":{{"entity":{{"id":"pay_abc","order_id":"order_xyz","method":"upi","notes":{{"cart_id":"{}"}}}}}}}}}}"#,
            event, cart_id
        )
        .into_bytes()
    }

    fn razorpay_webhook(body: Vec<u8>, secret: &str) -> ProcessGatewayEventCommand {
        let headers = WebhookHeaders::new().with(RAZORPAY_SIGNATURE_HEADER, sign_hex(secret, &body));
        ProcessGatewayEventCommand {
            event: GatewayEvent::Webhook {
                gateway: Gateway::Razorpay,
                headers,
                body,
            },
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Webhooks
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn signed_razorpay_capture_completes_cart() {
        let f = fixture();
        let cart = stored_cart(&f, Gateway::Razorpay).await;

        let result = f
            .handler
            .handle(razorpay_webhook(razorpay_body("payment.captured", &cart.id), WEBHOOK_SECRET))
            .await
            .unwrap();

        assert_eq!(result.cart.payment.status, PaymentStatus::Completed);
        assert_eq!(result.cart.payment.transaction_id.as_deref(), Some("pay_abc"));
        assert_eq!(result.cart.payment.payment_method.as_deref(), Some("upi"));
        assert!(result.cart.signup_token.is_some());
        assert_eq!(f.email.sent().len(), 1);
    }

    #[tokio::test]
    async fn bad_signature_never_touches_cart() {
        let f = fixture();
        let cart = stored_cart(&f, Gateway::Razorpay).await;

        let err = f
            .handler
            .handle(razorpay_webhook(razorpay_body("payment.captured", &cart.id), "wrong"))
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::InvalidSignature));
        assert_eq!(f.carts.find_by_id(&cart.id).await.unwrap().unwrap(), cart);
        assert!(f.email.sent().is_empty());
    }

    #[tokio::test]
    async fn missing_razorpay_signature_is_rejected_before_verification() {
        let f = fixture();
        let cart = stored_cart(&f, Gateway::Razorpay).await;

        let err = f
            .handler
            .handle(ProcessGatewayEventCommand {
                event: GatewayEvent::Webhook {
                    gateway: Gateway::Razorpay,
                    headers: WebhookHeaders::new(),
                    body: razorpay_body("payment.captured", &cart.id),
                },
            })
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::MissingSignature));
        assert!(f.razorpay.calls().is_empty());
    }

    #[tokio::test]
    async fn duplicate_delivery_is_a_no_op() {
        let f = fixture();
        let cart = stored_cart(&f, Gateway::Razorpay).await;
        let body = razorpay_body("payment.captured", &cart.id);

        let first = f.handler.handle(razorpay_webhook(body.clone(), WEBHOOK_SECRET)).await.unwrap();
        let second = f.handler.handle(razorpay_webhook(body, WEBHOOK_SECRET)).await.unwrap();

        assert_eq!(second.transition, Transition::Unchanged);
        assert_eq!(second.cart.signup_token, first.cart.signup_token);
        assert_eq!(f.email.sent().len(), 1);
    }

    #[tokio::test]
    async fn failure_after_completion_is_acknowledged_conflict() {
        let f = fixture();
        let cart = stored_cart(&f, Gateway::Razorpay).await;
        f.handler
            .handle(razorpay_webhook(razorpay_body("payment.captured", &cart.id), WEBHOOK_SECRET))
            .await
            .unwrap();

        let err = f
            .handler
            .handle(razorpay_webhook(razorpay_body("payment.failed", &cart.id), WEBHOOK_SECRET))
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Conflict(_)));
        assert!(err.is_acknowledged());
        let stored = f.carts.find_by_id(&cart.id).await.unwrap().unwrap();
        assert_eq!(stored.payment.status, PaymentStatus::Completed);
    }

    #[tokio::test]
    async fn unknown_event_is_ignored() {
        let f = fixture();
        let cart = stored_cart(&f, Gateway::Razorpay).await;

        let err = f
            .handler
            .handle(razorpay_webhook(razorpay_body("payment.authorized", &cart.id), WEBHOOK_SECRET))
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Ignored(_)));
        assert!(err.is_acknowledged());
    }

    #[tokio::test]
    async fn webhook_for_unknown_cart_is_not_found() {
        let f = fixture();

        let err = f
            .handler
            .handle(razorpay_webhook(razorpay_body("payment.captured", &CartId::new()), WEBHOOK_SECRET))
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::CartNotFound));
    }

    #[tokio::test]
    async fn paypal_refund_cancels_pending_cart() {
        let f = fixture();
        let cart = stored_cart(&f, Gateway::Paypal).await;
        let body = format!(
            r#"{{"id":"WH-1","event_type":"PAYMENT.CAPTURE.REFUNDED","resource":{{"id":"CAP-1","custom_id":"{}","status":"REFUNDED"}}}}"#,
            cart.id
        )
        .into_bytes();

        let result = f
            .handler
            .handle(ProcessGatewayEventCommand {
                event: GatewayEvent::Webhook {
                    gateway: Gateway::Paypal,
                    headers: WebhookHeaders::new(),
                    body,
                },
            })
            .await
            .unwrap();

        assert_eq!(result.cart.payment.status, PaymentStatus::Cancelled);
        assert_eq!(f.paypal.calls(), vec!["verify_webhook".to_string()]);
    }

    #[tokio::test]
    async fn paypal_rejected_verification_is_invalid_signature() {
        let f = fixture();
        let cart = stored_cart(&f, Gateway::Paypal).await;
        f.paypal.reject_webhooks();
        let body = format!(
            r#"{{"event_type":"PAYMENT.CAPTURE.COMPLETED","resource":{{"id":"CAP-1","custom_id":"{}"}}}}"#,
            cart.id
        )
        .into_bytes();

        let err = f
            .handler
            .handle(ProcessGatewayEventCommand {
                event: GatewayEvent::Webhook {
                    gateway: Gateway::Paypal,
                    headers: WebhookHeaders::new(),
                    body,
                },
            })
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::InvalidSignature));
        assert_eq!(f.carts.find_by_id(&cart.id).await.unwrap().unwrap(), cart);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Redirects
    // ════════════════════════════════════════════════════════════════════════════

    fn redirect(cart_id: CartId) -> ProcessGatewayEventCommand {
        ProcessGatewayEventCommand {
            event: GatewayEvent::Redirect {
                gateway: Gateway::Paypal,
                cart_id,
                order_id: "ORDER-1".into(),
            },
        }
    }

    #[tokio::test]
    async fn redirect_capture_completes_cart() {
        let f = fixture();
        let cart = stored_cart(&f, Gateway::Paypal).await;

        let result = f.handler.handle(redirect(cart.id)).await.unwrap();

        assert_eq!(result.cart.payment.status, PaymentStatus::Completed);
        assert_eq!(result.cart.payment.transaction_id.as_deref(), Some("CAP-ORDER-1"));
    }

    #[tokio::test]
    async fn failed_capture_leaves_cart_pending() {
        let f = fixture();
        let cart = stored_cart(&f, Gateway::Paypal).await;
        f.paypal.fail_next(PaymentGatewayError::network("timeout"));

        let err = f.handler.handle(redirect(cart.id)).await.unwrap_err();

        assert!(matches!(err, GatewayError::Upstream(_)));
        let stored = f.carts.find_by_id(&cart.id).await.unwrap().unwrap();
        assert_eq!(stored.payment.status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn incomplete_capture_leaves_cart_pending() {
        let f = fixture();
        let cart = stored_cart(&f, Gateway::Paypal).await;
        f.paypal.set_capture(CaptureResult {
            completed: false,
            transaction_id: None,
            cart_id: Some(cart.id),
            payment_method: None,
        });

        let err = f.handler.handle(redirect(cart.id)).await.unwrap_err();

        assert!(matches!(err, GatewayError::Upstream(_)));
        let stored = f.carts.find_by_id(&cart.id).await.unwrap().unwrap();
        assert_eq!(stored.payment.status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn repeated_redirect_does_not_capture_again() {
        let f = fixture();
        let cart = stored_cart(&f, Gateway::Paypal).await;
        f.handler.handle(redirect(cart.id)).await.unwrap();

        let again = f.handler.handle(redirect(cart.id)).await.unwrap();

        assert_eq!(again.transition, Transition::Unchanged);
        assert_eq!(f.paypal.calls().len(), 1);
    }

    #[tokio::test]
    async fn redirect_for_razorpay_cart_is_conflict() {
        let f = fixture();
        let cart = stored_cart(&f, Gateway::Razorpay).await;

        let err = f.handler.handle(redirect(cart.id)).await.unwrap_err();

        assert!(matches!(err, GatewayError::Conflict(_)));
        assert!(f.paypal.calls().is_empty());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Client confirmation
    // ════════════════════════════════════════════════════════════════════════════

    fn confirm(cart_id: CartId, order_id: &str, signature: String) -> ProcessGatewayEventCommand {
        ProcessGatewayEventCommand {
            event: GatewayEvent::ClientConfirm {
                gateway: Gateway::Razorpay,
                cart_id,
                order_id: order_id.into(),
                payment_id: "pay_777".into(),
                signature,
            },
        }
    }

    #[tokio::test]
    async fn signed_confirmation_completes_cart() {
        let f = fixture();
        let mut cart = stored_cart(&f, Gateway::Razorpay).await;
        cart.record_gateway_order("order_1", Timestamp::now()).unwrap();
        f.carts.update(&cart).await.unwrap();

        let signature = sign_hex(KEY_SECRET, b"order_1|pay_777");
        let result = f.handler.handle(confirm(cart.id, "order_1", signature)).await.unwrap();

        assert_eq!(result.cart.payment.status, PaymentStatus::Completed);
        assert_eq!(result.cart.payment.transaction_id.as_deref(), Some("pay_777"));
    }

    #[tokio::test]
    async fn forged_confirmation_is_rejected() {
        let f = fixture();
        let cart = stored_cart(&f, Gateway::Razorpay).await;

        let signature = sign_hex("not-the-key", b"order_1|pay_777");
        let err = f.handler.handle(confirm(cart.id, "order_1", signature)).await.unwrap_err();

        assert!(matches!(err, GatewayError::InvalidSignature));
        assert_eq!(f.carts.find_by_id(&cart.id).await.unwrap().unwrap(), cart);
    }

    #[tokio::test]
    async fn confirmation_for_another_order_is_rejected() {
        let f = fixture();
        let mut cart = stored_cart(&f, Gateway::Razorpay).await;
        cart.record_gateway_order("order_1", Timestamp::now()).unwrap();
        f.carts.update(&cart).await.unwrap();

        let signature = sign_hex(KEY_SECRET, b"order_other|pay_777");
        let err = f
            .handler
            .handle(confirm(cart.id, "order_other", signature))
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::ParseError(_)));
        let stored = f.carts.find_by_id(&cart.id).await.unwrap().unwrap();
        assert_eq!(stored.payment.status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn confirmation_for_cart_without_order_is_rejected() {
        let f = fixture();
        let mut paid = stored_cart(&f, Gateway::Razorpay).await;
        paid.record_gateway_order("order_1", Timestamp::now()).unwrap();
        f.carts.update(&paid).await.unwrap();
        let signature = sign_hex(KEY_SECRET, b"order_1|pay_777");
        f.handler
            .handle(confirm(paid.id, "order_1", signature.clone()))
            .await
            .unwrap();

        // Same signed triple replayed onto a cart that never opened an order
        let fresh = stored_cart(&f, Gateway::Razorpay).await;
        let err = f
            .handler
            .handle(confirm(fresh.id, "order_1", signature))
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::ParseError(_)));
        let stored = f.carts.find_by_id(&fresh.id).await.unwrap().unwrap();
        assert_eq!(stored.payment.status, PaymentStatus::Pending);
        assert!(stored.signup_token.is_none());
    }
}
