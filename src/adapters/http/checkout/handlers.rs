//! HTTP handlers for cart, signup and coupon endpoints.
//!
//! These handlers connect axum routes to the checkout command/query handlers.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::adapters::http::error::{status_for, ApiJson, CheckoutApiError, ErrorBody};
use crate::adapters::http::state::CheckoutAppState;
use crate::application::handlers::checkout::{
    CompleteSignupCommand, CreateCartCommand, GetCartBySignupTokenQuery, GetCartQuery,
    LoadCartQuery, SignupLookup, UpdateCartPaymentCommand, ValidateCouponQuery,
};
use crate::domain::cart::CheckoutError;
use crate::domain::foundation::{CartId, Currency, Money, UserId};

use super::dto::{
    CartIdParams, CartResponse, CompleteSignupRequest, CouponRejectedResponse, CouponResponse,
    CreateCartRequest,
    CreateCartResponse, SignupParams, SignupResponse, SignupView, TokenParams,
    UpdateCartRequest, ValidateCouponRequest,
};

/// Parses a required cart id from a request field.
pub(crate) fn parse_cart_id(raw: Option<&str>) -> Result<CartId, CheckoutError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CheckoutError::validation("cartId", "is required"))?;
    raw.parse()
        .map_err(|_| CheckoutError::validation("cartId", "is not a valid cart id"))
}

fn required<'a>(field: &str, raw: Option<&'a str>) -> Result<&'a str, CheckoutError> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CheckoutError::validation(field, "is required"))
}

// ════════════════════════════════════════════════════════════════════════════════
// Cart Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /cart/create - Create a cart; free plans complete immediately
pub async fn create_cart(
    State(state): State<CheckoutAppState>,
    ApiJson(request): ApiJson<CreateCartRequest>,
) -> Result<impl IntoResponse, CheckoutApiError> {
    let currency: Currency = request.currency.parse()?;
    let cmd = CreateCartCommand {
        plan: request.plan_name.parse()?,
        billing_cycle: request.billing_cycle.parse()?,
        amount: Money::from_major(request.amount, currency)?,
        user: request.user_details,
        gateway: request.gateway.parse()?,
        user_id: request.user_id.map(UserId::new).transpose()?,
        coupon_code: request.coupon_code,
    };

    let result = state.create_cart_handler().handle(cmd).await?;

    let response = CreateCartResponse {
        success: true,
        cart_id: result.cart.id,
        payment_id: result.cart.payment.payment_id.to_string(),
        status: result.cart.payment.status,
        total_amount: result.cart.payment.total_amount.as_major(),
        currency: result.cart.payment.total_amount.currency().to_string(),
        signup_token: result.signup_token,
        soft: result.soft.into(),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /cart/load?cartId= - Resume a cart that is not yet completed
pub async fn load_cart(
    State(state): State<CheckoutAppState>,
    Query(params): Query<CartIdParams>,
) -> Result<impl IntoResponse, CheckoutApiError> {
    let cart_id = parse_cart_id(params.cart_id.as_deref())?;
    let cart = state.load_cart_handler().handle(LoadCartQuery { cart_id }).await?;
    Ok(Json(CartResponse::new(&cart)))
}

/// GET /cart?signup= - Partner lookup of a completed cart by signup token
///
/// `?cartId=` reads any cart by id instead.
pub async fn get_cart_by_signup(
    State(state): State<CheckoutAppState>,
    Query(params): Query<SignupParams>,
) -> Result<impl IntoResponse, CheckoutApiError> {
    if params.signup.is_none() && params.cart_id.is_some() {
        let cart_id = parse_cart_id(params.cart_id.as_deref())?;
        let cart = state.get_cart_handler().handle(GetCartQuery { cart_id }).await?;
        return Ok(Json(CartResponse::new(&cart)));
    }
    let token = required("signup", params.signup.as_deref())?;
    let query = GetCartBySignupTokenQuery {
        token: token.to_string(),
        lookup: SignupLookup::CompletedOnly,
    };
    let cart = state.signup_lookup_handler().handle(query).await?;
    Ok(Json(CartResponse::new(&cart)))
}

/// PATCH /cart/update - Apply a payment status change
pub async fn update_cart(
    State(state): State<CheckoutAppState>,
    ApiJson(request): ApiJson<UpdateCartRequest>,
) -> Result<impl IntoResponse, CheckoutApiError> {
    let cmd = UpdateCartPaymentCommand {
        cart_id: parse_cart_id(Some(&request.cart_id))?,
        status: request.status.parse()?,
        transaction_id: request.transaction_id,
        payment_method: request.payment_method,
    };

    let result = state.update_cart_payment_handler().handle(cmd).await?;

    Ok(Json(CartResponse::new(&result.cart).with_soft(result.soft)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Signup Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// GET /signup?token= - Cart behind a signup token, any payment status
pub async fn get_signup(
    State(state): State<CheckoutAppState>,
    Query(params): Query<TokenParams>,
) -> Result<impl IntoResponse, CheckoutApiError> {
    let token = required("token", params.token.as_deref())?;
    let query = GetCartBySignupTokenQuery {
        token: token.to_string(),
        lookup: SignupLookup::ForSignup,
    };
    let cart = state.signup_lookup_handler().handle(query).await?;
    Ok(Json(CartResponse::new(&cart)))
}

/// PATCH /signup/complete - Mark the signup handoff done
///
/// An already-completed signup answers 404 like an unknown token.
pub async fn complete_signup(
    State(state): State<CheckoutAppState>,
    ApiJson(request): ApiJson<CompleteSignupRequest>,
) -> Result<impl IntoResponse, CheckoutApiError> {
    let cmd = CompleteSignupCommand {
        signup_token: request.signup_token,
    };

    let cart = state
        .complete_signup_handler()
        .handle(cmd)
        .await
        .map_err(|e| match e {
            CheckoutError::SignupAlreadyCompleted(_) => {
                CheckoutApiError::with_status(e, StatusCode::NOT_FOUND)
            }
            other => other.into(),
        })?;

    Ok(Json(SignupResponse {
        success: true,
        cart: SignupView::from(&cart),
    }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Coupon Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /coupon/validate - Check a coupon, with an optional discount preview
///
/// A rejected coupon answers `valid: false` with its reason: 404 for an
/// unknown code, 400 otherwise.
pub async fn validate_coupon(
    State(state): State<CheckoutAppState>,
    ApiJson(request): ApiJson<ValidateCouponRequest>,
) -> Result<Response, CheckoutApiError> {
    let amount = match request.amount {
        Some(amount) => {
            let currency: Currency = required("currency", request.currency.as_deref())?.parse()?;
            Some(Money::from_major(amount, currency)?)
        }
        None => None,
    };

    let result = state
        .validate_coupon_handler()
        .handle(ValidateCouponQuery {
            code: request.code,
            amount,
        })
        .await;

    match result {
        Ok(result) => Ok(Json(CouponResponse::new(&result.coupon, result.preview)).into_response()),
        Err(CheckoutError::CouponRejected { code, reason }) => {
            let error = CheckoutError::coupon_rejected(code.as_str(), reason);
            let body = CouponRejectedResponse::new(
                &code,
                reason,
                ErrorBody {
                    code: error.code().to_string(),
                    message: error.message(),
                },
            );
            Ok((status_for(&error), Json(body)).into_response())
        }
        Err(other) => Err(other.into()),
    }
}
