//! HTTP DTOs (Data Transfer Objects) for cart and signup endpoints.
//!
//! Requests keep the client's loose string vocabulary; parsing into domain
//! types happens in the handlers so failures carry the field name.

use serde::{Deserialize, Serialize};

use crate::application::handlers::checkout::SoftFailures;
use crate::domain::cart::{
    AppliedCoupon, BillingCycle, Cart, Gateway, PaymentRecord, PaymentStatus, PlanName,
    Subscription, UserDetails,
};
use crate::adapters::http::error::ErrorBody;
use crate::domain::coupon::{Coupon, CouponKind, CouponRejection, DiscountBreakdown};
use crate::domain::foundation::{CartId, Timestamp};

fn rfc3339(ts: &Timestamp) -> String {
    ts.as_datetime().to_rfc3339()
}

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to create a cart.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCartRequest {
    pub plan_name: String,
    pub billing_cycle: String,
    /// Amount in major units, as shown to the user.
    pub amount: f64,
    pub currency: String,
    pub user_details: UserDetails,
    pub gateway: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub coupon_code: Option<String>,
}

/// `?cartId=` query.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartIdParams {
    #[serde(default)]
    pub cart_id: Option<String>,
}

/// `?signup=` or `?cartId=` query used by the partner cart lookup.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupParams {
    #[serde(default)]
    pub signup: Option<String>,
    #[serde(default)]
    pub cart_id: Option<String>,
}

/// `?token=` query used by the signup lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenParams {
    #[serde(default)]
    pub token: Option<String>,
}

/// Request to change a cart's payment status.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartRequest {
    pub cart_id: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub payment_method: Option<String>,
}

/// Request to finish the signup handoff.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteSignupRequest {
    pub signup_token: String,
}

/// Request to check a coupon, optionally against an amount.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateCouponRequest {
    pub code: String,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Response for cart creation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCartResponse {
    pub success: bool,
    pub cart_id: CartId,
    pub payment_id: String,
    pub status: PaymentStatus,
    pub total_amount: f64,
    pub currency: String,
    /// Present only when the cart completed at creation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signup_token: Option<String>,
    #[serde(flatten)]
    pub soft: SoftFailureFields,
}

/// Soft failure fields; the request still succeeded.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SoftFailureFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_error: Option<String>,
}

impl From<SoftFailures> for SoftFailureFields {
    fn from(soft: SoftFailures) -> Self {
        Self {
            warning: soft.warning,
            email_error: soft.email_error,
        }
    }
}

/// Response wrapping a full cart snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub success: bool,
    pub cart: CartView,
    #[serde(flatten)]
    pub soft: SoftFailureFields,
}

impl CartResponse {
    pub fn new(cart: &Cart) -> Self {
        Self {
            success: true,
            cart: CartView::from(cart),
            soft: SoftFailureFields::default(),
        }
    }

    pub fn with_soft(mut self, soft: SoftFailures) -> Self {
        self.soft = soft.into();
        self
    }
}

/// Cart snapshot. Never carries the signup token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub cart_id: CartId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub user_details: UserDetails,
    pub subscription: SubscriptionView,
    pub payment: PaymentView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon: Option<CouponView>,
    pub is_signup_completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signup_completed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_expiry: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionView {
    pub plan_name: PlanName,
    pub plan_amount: f64,
    pub billing_cycle: BillingCycle,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentView {
    pub gateway: Gateway,
    pub payment_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    pub total_amount: f64,
    pub currency: String,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponView {
    pub code: String,
    pub discount_amount: f64,
}

impl From<&Subscription> for SubscriptionView {
    fn from(s: &Subscription) -> Self {
        Self {
            plan_name: s.plan,
            plan_amount: s.plan_amount.as_major(),
            billing_cycle: s.billing_cycle,
            is_active: s.is_active,
            start_date: s.start_date.as_ref().map(rfc3339),
            end_date: s.end_date.as_ref().map(rfc3339),
        }
    }
}

impl From<&PaymentRecord> for PaymentView {
    fn from(p: &PaymentRecord) -> Self {
        Self {
            gateway: p.gateway,
            payment_id: p.payment_id.to_string(),
            gateway_order_id: p.gateway_order_id.clone(),
            transaction_id: p.transaction_id.clone(),
            payment_method: p.payment_method.clone(),
            total_amount: p.total_amount.as_major(),
            currency: p.total_amount.currency().to_string(),
            status: p.status,
        }
    }
}

impl From<&AppliedCoupon> for CouponView {
    fn from(c: &AppliedCoupon) -> Self {
        Self {
            code: c.code.clone(),
            discount_amount: c.discount_amount.as_major(),
        }
    }
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            cart_id: cart.id,
            user_id: cart.user_id.as_ref().map(|u| u.to_string()),
            user_details: cart.user.clone(),
            subscription: SubscriptionView::from(&cart.subscription),
            payment: PaymentView::from(&cart.payment),
            coupon: cart.coupon.as_ref().map(CouponView::from),
            is_signup_completed: cart.is_signup_completed,
            signup_completed_at: cart.signup_completed_at.as_ref().map(rfc3339),
            token_expiry: cart.token_expiry.as_ref().map(rfc3339),
            created_at: rfc3339(&cart.created_at),
            updated_at: rfc3339(&cart.updated_at),
        }
    }
}

/// Trimmed view handed to the signup service.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupView {
    pub cart_id: CartId,
    pub email: String,
    pub name: String,
    pub plan_name: PlanName,
    pub billing_cycle: BillingCycle,
    pub payment_status: PaymentStatus,
    pub is_signup_completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signup_completed_at: Option<String>,
}

impl From<&Cart> for SignupView {
    fn from(cart: &Cart) -> Self {
        Self {
            cart_id: cart.id,
            email: cart.user.email.clone(),
            name: cart.user.display_name(),
            plan_name: cart.subscription.plan,
            billing_cycle: cart.subscription.billing_cycle,
            payment_status: cart.payment.status,
            is_signup_completed: cart.is_signup_completed,
            signup_completed_at: cart.signup_completed_at.as_ref().map(rfc3339),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupResponse {
    pub success: bool,
    pub cart: SignupView,
}

/// Response for coupon validation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponResponse {
    pub success: bool,
    pub valid: bool,
    pub code: String,
    /// `percentage` or `fixed_amount`
    pub kind: &'static str,
    /// Percent, or the fixed amount in minor units.
    pub value: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<DiscountPreview>,
}

/// Body for a coupon that cannot be used.
///
/// Keeps the error envelope and adds `valid: false` with the reason.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponRejectedResponse {
    pub success: bool,
    pub valid: bool,
    pub code: String,
    pub reason: CouponRejection,
    pub error: ErrorBody,
}

impl CouponRejectedResponse {
    pub fn new(code: &str, reason: CouponRejection, error: ErrorBody) -> Self {
        Self {
            success: false,
            valid: false,
            code: code.to_string(),
            reason,
            error,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountPreview {
    pub base_amount: f64,
    pub discount_amount: f64,
    pub final_amount: f64,
    pub currency: String,
}

impl From<DiscountBreakdown> for DiscountPreview {
    fn from(b: DiscountBreakdown) -> Self {
        Self {
            base_amount: b.base.as_major(),
            discount_amount: b.discount.as_major(),
            final_amount: b.total.as_major(),
            currency: b.total.currency().to_string(),
        }
    }
}

impl CouponResponse {
    pub fn new(coupon: &Coupon, preview: Option<DiscountBreakdown>) -> Self {
        let (kind, value) = match coupon.kind {
            CouponKind::Percentage { percent } => ("percentage", i64::from(percent)),
            CouponKind::FixedAmount { amount } => ("fixed_amount", amount),
        };
        Self {
            success: true,
            valid: true,
            code: coupon.code.clone(),
            kind,
            value,
            preview: preview.map(DiscountPreview::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cart::new_cart;

    #[test]
    fn create_request_deserializes_camel_case() {
        let json = r#"{
            "planName": "pro",
            "billingCycle": "monthly",
            "amount": 999,
            "currency": "INR",
            "gateway": "razorpay",
            "couponCode": "SAVE20",
            "userDetails": {
                "firstName": "Asha",
                "lastName": "Rao",
                "email": "asha@example.com",
                "address": {"street": "1 MG Road", "city": "Pune", "country": "IN", "postalCode": "411001"}
            }
        }"#;
        let request: CreateCartRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.plan_name, "pro");
        assert_eq!(request.amount, 999.0);
        assert_eq!(request.coupon_code.as_deref(), Some("SAVE20"));
        assert_eq!(request.user_details.address.postal_code, "411001");
        assert!(request.user_id.is_none());
    }

    #[test]
    fn cart_view_omits_signup_token() {
        let mut cart = new_cart(PlanName::Pro, 99_900);
        cart.signup_token = Some("secret-token".into());

        let json = serde_json::to_value(CartResponse::new(&cart)).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["cart"]["payment"]["totalAmount"], 999.0);
        assert!(!json.to_string().contains("secret-token"));
    }

    #[test]
    fn soft_failures_are_flattened() {
        let cart = new_cart(PlanName::Pro, 99_900);
        let response = CartResponse::new(&cart).with_soft(SoftFailures {
            warning: Some("email failed".into()),
            email_error: Some("smtp down".into()),
        });

        let json = serde_json::to_value(response).unwrap();

        assert_eq!(json["warning"], "email failed");
        assert_eq!(json["emailError"], "smtp down");
    }

    #[test]
    fn empty_soft_failures_are_omitted() {
        let cart = new_cart(PlanName::Pro, 99_900);
        let json = serde_json::to_value(CartResponse::new(&cart)).unwrap();
        assert!(json.get("warning").is_none());
        assert!(json.get("emailError").is_none());
    }
}
