//! HTTP handlers for gateway orders, confirmations and callbacks.
//!
//! Every callback becomes a `GatewayEvent` for `ProcessGatewayEventHandler`;
//! nothing here touches the cart directly.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect};
use axum::Json;

use crate::adapters::http::checkout::handlers::parse_cart_id;
use crate::adapters::http::error::{ApiJson, CheckoutApiError, GatewayApiError};
use crate::adapters::http::state::CheckoutAppState;
use crate::application::handlers::checkout::CreateGatewayOrderCommand;
use crate::application::handlers::gateway::ProcessGatewayEventCommand;
use crate::domain::cart::{Gateway, PaymentStatus};
use crate::domain::foundation::CartId;
use crate::domain::gateway::{GatewayError, GatewayEvent, WebhookHeaders};

use super::dto::{
    CreateOrderRequest, OrderResponse, PaymentResultResponse, PaypalReturnParams,
    RazorpayVerifyRequest,
};

// ════════════════════════════════════════════════════════════════════════════════
// Orders
// ════════════════════════════════════════════════════════════════════════════════

/// POST /payments/order - Open an order with the cart's gateway
pub async fn create_order(
    State(state): State<CheckoutAppState>,
    ApiJson(request): ApiJson<CreateOrderRequest>,
) -> Result<impl IntoResponse, CheckoutApiError> {
    let cmd = CreateGatewayOrderCommand {
        cart_id: parse_cart_id(Some(&request.cart_id))?,
    };

    let result = state.create_gateway_order_handler().handle(cmd).await?;

    let total = result.cart.payment.total_amount;
    let gateway = result.cart.payment.gateway;
    let response = OrderResponse {
        success: true,
        cart_id: result.cart.id,
        gateway,
        order_id: result.order.id,
        approval_url: result.order.approval_url,
        amount: total.as_major(),
        amount_minor: total.minor(),
        currency: total.currency().to_string(),
        key_id: match gateway {
            Gateway::Razorpay => Some(state.razorpay_key_id.clone()),
            Gateway::Paypal => None,
        },
    };

    Ok(Json(response))
}

// ════════════════════════════════════════════════════════════════════════════════
// Browser Callbacks
// ════════════════════════════════════════════════════════════════════════════════

/// POST /payments/razorpay/verify - Signed Razorpay Checkout confirmation
pub async fn verify_razorpay(
    State(state): State<CheckoutAppState>,
    ApiJson(request): ApiJson<RazorpayVerifyRequest>,
) -> Result<impl IntoResponse, GatewayApiError> {
    let cart_id = parse_cart_id(Some(&request.cart_id))
        .map_err(|e| GatewayError::ParseError(e.message()))?;

    let event = GatewayEvent::ClientConfirm {
        gateway: Gateway::Razorpay,
        cart_id,
        order_id: request.razorpay_order_id,
        payment_id: request.razorpay_payment_id,
        signature: request.razorpay_signature,
    };

    let result = state
        .gateway_event_handler()
        .handle(ProcessGatewayEventCommand { event })
        .await?;

    Ok(Json(PaymentResultResponse::new(result, true)))
}

/// GET /payments/paypal/return - PayPal approval redirect
///
/// Captures the order and sends the browser on with a 303: to the success
/// page when the cart completed, otherwise back to checkout with
/// `error=payment_failed`. The cart stays pending on failure.
pub async fn paypal_return(
    State(state): State<CheckoutAppState>,
    Query(params): Query<PaypalReturnParams>,
) -> Redirect {
    let cart_id = params
        .cart_id
        .as_deref()
        .and_then(|raw| raw.trim().parse::<CartId>().ok());
    let order_id = params
        .token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let (cart_id, order_id) = match (cart_id, order_id) {
        (Some(cart_id), Some(order_id)) => (cart_id, order_id.to_string()),
        _ => {
            tracing::warn!(
                cart_id = ?params.cart_id,
                has_token = params.token.is_some(),
                "PayPal return without cart id or order token"
            );
            return failure_redirect(&state, params.cart_id.as_deref());
        }
    };

    let event = GatewayEvent::Redirect {
        gateway: Gateway::Paypal,
        cart_id,
        order_id,
    };

    match state
        .gateway_event_handler()
        .handle(ProcessGatewayEventCommand { event })
        .await
    {
        Ok(result) if result.cart.payment.status == PaymentStatus::Completed => {
            let cart_id = result.cart.id.to_string();
            let mut params = vec![("cartId", cart_id.as_str())];
            if let Some(token) = result.cart.signup_token.as_deref() {
                params.push(("token", token));
            }
            Redirect::to(&with_params(&state.redirects.success, &params))
        }
        Ok(result) => {
            tracing::warn!(
                cart_id = %result.cart.id,
                status = %result.cart.payment.status,
                "PayPal return left cart incomplete"
            );
            failure_redirect(&state, Some(&result.cart.id.to_string()))
        }
        Err(e) => {
            tracing::warn!(cart_id = %cart_id, error = %e, "PayPal capture failed");
            failure_redirect(&state, Some(&cart_id.to_string()))
        }
    }
}

fn failure_redirect(state: &CheckoutAppState, cart_id: Option<&str>) -> Redirect {
    let mut params = Vec::with_capacity(2);
    if let Some(id) = cart_id.map(str::trim).filter(|id| !id.is_empty()) {
        params.push(("cartId", id));
    }
    params.push(("error", "payment_failed"));
    Redirect::to(&with_params(&state.redirects.checkout, &params))
}

fn with_params(base: &str, params: &[(&str, &str)]) -> String {
    match reqwest::Url::parse_with_params(base, params) {
        Ok(url) => url.to_string(),
        Err(e) => {
            tracing::error!(base, error = %e, "Invalid redirect base URL");
            base.to_string()
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhooks
// ════════════════════════════════════════════════════════════════════════════════

fn webhook_headers(headers: &HeaderMap) -> WebhookHeaders {
    let mut out = WebhookHeaders::new();
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            out.insert(name.as_str(), value);
        }
    }
    out
}

async fn handle_webhook(
    state: CheckoutAppState,
    gateway: Gateway,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PaymentResultResponse>, GatewayApiError> {
    let event = GatewayEvent::Webhook {
        gateway,
        headers: webhook_headers(&headers),
        body: body.to_vec(),
    };

    let result = state
        .gateway_event_handler()
        .handle(ProcessGatewayEventCommand { event })
        .await?;

    Ok(Json(PaymentResultResponse::new(result, false)))
}

/// POST /webhooks/razorpay - Razorpay webhook, HMAC verified
pub async fn razorpay_webhook(
    State(state): State<CheckoutAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, GatewayApiError> {
    handle_webhook(state, Gateway::Razorpay, headers, body).await
}

/// POST /webhooks/paypal - PayPal webhook, verified through PayPal's API
pub async fn paypal_webhook(
    State(state): State<CheckoutAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, GatewayApiError> {
    handle_webhook(state, Gateway::Paypal, headers, body).await
}
