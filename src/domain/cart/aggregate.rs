//! Cart aggregate entity.
//!
//! A cart is one checkout attempt: who is buying, which plan, how it is
//! being paid, and the signup handoff once payment lands.
//!
//! # Design Decisions
//!
//! - **Money in minor units**: amounts are `Money` (i64 minor units)
//! - **One transaction per cart**: retries reuse the same payment record
//! - **Completed is terminal**: afterwards only the signup flag may change
//! - **Token minted once**: `attach_signup_token` never replaces a token

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CartId, Money, PaymentId, StateMachine, Timestamp, UserId};

use super::{BillingCycle, CheckoutError, Gateway, PaymentStatus, PlanName, UserDetails};

/// Plan snapshot taken at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub plan: PlanName,
    /// Price before discount.
    pub plan_amount: Money,
    pub billing_cycle: BillingCycle,
    pub is_active: bool,
    /// Set when the payment completes.
    pub start_date: Option<Timestamp>,
    /// `None` for the free tier, otherwise start + one billing cycle.
    pub end_date: Option<Timestamp>,
}

/// The single purchase transaction attached to a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub gateway: Gateway,
    pub payment_id: PaymentId,
    /// Gateway's own order reference, once one has been opened.
    pub gateway_order_id: Option<String>,
    /// Gateway capture reference.
    pub transaction_id: Option<String>,
    pub payment_method: Option<String>,
    pub total_amount: Money,
    pub status: PaymentStatus,
}

/// Coupon applied at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedCoupon {
    pub code: String,
    pub discount_amount: Money,
}

/// Signup token issued for a completed cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedSignupToken {
    pub token: String,
    pub expires_at: Timestamp,
}

/// Requested change to the payment record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentChange {
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub payment_method: Option<String>,
}

impl PaymentChange {
    pub fn to(status: PaymentStatus) -> Self {
        Self {
            status,
            transaction_id: None,
            payment_method: None,
        }
    }

    pub fn with_transaction(mut self, transaction_id: impl Into<String>) -> Self {
        self.transaction_id = Some(transaction_id.into());
        self
    }

    pub fn with_method(mut self, method: Option<String>) -> Self {
        self.payment_method = method;
        self
    }
}

/// What `apply_payment` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Status moved from the given state.
    Applied { from: PaymentStatus },
    /// Nothing changed (repeat of the current status).
    Unchanged,
}

/// Input for `Cart::create`.
#[derive(Debug, Clone)]
pub struct NewCart {
    pub user_id: Option<UserId>,
    pub user: UserDetails,
    pub plan: PlanName,
    pub billing_cycle: BillingCycle,
    /// Resolved price before discount.
    pub plan_amount: Money,
    pub gateway: Gateway,
    pub coupon: Option<AppliedCoupon>,
}

/// Cart aggregate - one checkout attempt.
///
/// # Invariants
///
/// - `payment.status` follows the `PaymentStatus` state machine
/// - `signup_token` is set at most once, and only when completed
/// - `subscription.end_date` is `None` iff the plan is free
/// - `payment.total_amount + discount == subscription.plan_amount`
/// - `is_signup_completed` only goes false to true
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: Option<UserId>,
    pub user: UserDetails,
    pub subscription: Subscription,
    pub payment: PaymentRecord,
    pub coupon: Option<AppliedCoupon>,
    pub signup_token: Option<String>,
    pub token_expiry: Option<Timestamp>,
    pub is_signup_completed: bool,
    pub signup_completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Cart {
    /// Creates a pending cart.
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailed` naming the first invalid field.
    pub fn create(params: NewCart, now: Timestamp) -> Result<Self, CheckoutError> {
        params.user.validate()?;

        let plan_amount = params.plan_amount;
        let total_amount = match &params.coupon {
            Some(coupon) => {
                if coupon.discount_amount.currency() != plan_amount.currency() {
                    return Err(CheckoutError::validation(
                        "couponCode",
                        "discount currency does not match cart currency",
                    ));
                }
                if coupon.discount_amount.minor() > plan_amount.minor() {
                    return Err(CheckoutError::validation(
                        "couponCode",
                        "discount exceeds plan amount",
                    ));
                }
                plan_amount.saturating_sub(coupon.discount_amount)
            }
            None => plan_amount,
        };

        Ok(Self {
            id: CartId::new(),
            user_id: params.user_id,
            user: params.user,
            subscription: Subscription {
                plan: params.plan,
                plan_amount,
                billing_cycle: params.billing_cycle,
                is_active: false,
                start_date: None,
                end_date: None,
            },
            payment: PaymentRecord {
                gateway: params.gateway,
                payment_id: PaymentId::generate(),
                gateway_order_id: None,
                transaction_id: None,
                payment_method: None,
                total_amount,
                status: PaymentStatus::Pending,
            },
            coupon: params.coupon,
            signup_token: None,
            token_expiry: None,
            is_signup_completed: false,
            signup_completed_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// True unless the plan is free or the total came to zero.
    pub fn requires_payment(&self) -> bool {
        !(self.subscription.plan.is_free() || self.payment.total_amount.is_zero())
    }

    pub fn is_completed(&self) -> bool {
        self.payment.status.is_completed()
    }

    /// Applies a payment status change.
    ///
    /// Repeating the current status is a no-op. Completing sets the
    /// subscription dates; it does not mint the signup token.
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` if the state machine forbids the move
    /// - `ValidationFailed` if a paid cart completes without a transaction id
    pub fn apply_payment(
        &mut self,
        change: PaymentChange,
        now: Timestamp,
    ) -> Result<Transition, CheckoutError> {
        let from = self.payment.status;
        if from == change.status {
            return Ok(Transition::Unchanged);
        }

        self.payment.status = from
            .transition_to(change.status)
            .map_err(|_| CheckoutError::invalid_transition(from, change.status))?;

        if change.status == PaymentStatus::Completed {
            let transaction_id = change
                .transaction_id
                .clone()
                .or_else(|| self.payment.transaction_id.clone());
            if transaction_id.is_none() && self.requires_payment() {
                self.payment.status = from;
                return Err(CheckoutError::validation(
                    "transactionId",
                    "required to complete a paid cart",
                ));
            }
            self.subscription.is_active = true;
            self.subscription.start_date = Some(now);
            self.subscription.end_date = if self.subscription.plan.is_free() {
                None
            } else {
                Some(self.subscription.billing_cycle.period_end(now))
            };
        }

        if let Some(txn) = change.transaction_id {
            self.payment.transaction_id = Some(txn);
        }
        if let Some(method) = change.payment_method {
            self.payment.payment_method = Some(method);
        }
        self.updated_at = now;
        Ok(Transition::Applied { from })
    }

    /// True if the cart is completed and still has no signup token.
    pub fn needs_signup_token(&self) -> bool {
        self.is_completed() && self.signup_token.is_none()
    }

    /// Stores `token` if none is present. Returns whether it was stored.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the cart is not completed.
    pub fn attach_signup_token(&mut self, token: IssuedSignupToken) -> Result<bool, CheckoutError> {
        if !self.is_completed() {
            return Err(CheckoutError::invalid_transition(
                self.payment.status,
                PaymentStatus::Completed,
            ));
        }
        if self.signup_token.is_some() {
            return Ok(false);
        }
        self.signup_token = Some(token.token);
        self.token_expiry = Some(token.expires_at);
        Ok(true)
    }

    /// Guards the resumption read path.
    pub fn ensure_resumable(&self) -> Result<(), CheckoutError> {
        if self.is_completed() {
            return Err(CheckoutError::AlreadyCompleted(self.id));
        }
        Ok(())
    }

    /// Records the gateway's order reference on a payable cart.
    pub fn record_gateway_order(
        &mut self,
        order_id: impl Into<String>,
        now: Timestamp,
    ) -> Result<(), CheckoutError> {
        self.ensure_resumable()?;
        self.payment.gateway_order_id = Some(order_id.into());
        self.updated_at = now;
        Ok(())
    }

    /// True if the stored token expiry has passed (or no token exists).
    pub fn is_token_expired(&self, now: Timestamp) -> bool {
        match self.token_expiry {
            Some(expiry) => !now.is_before(&expiry),
            None => true,
        }
    }

    /// Flips the signup-completed flag.
    ///
    /// # Errors
    ///
    /// - `TokenExpired` if the token is past expiry
    /// - `SignupAlreadyCompleted` if the flag is already set
    pub fn complete_signup(&mut self, now: Timestamp) -> Result<(), CheckoutError> {
        if self.is_token_expired(now) {
            return Err(CheckoutError::TokenExpired);
        }
        if self.is_signup_completed {
            return Err(CheckoutError::SignupAlreadyCompleted(self.id));
        }
        self.is_signup_completed = true;
        self.signup_completed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::cart::user_details::tests::valid_user;
    use crate::domain::foundation::Currency;

    pub(crate) fn new_cart(plan: PlanName, amount_minor: i64) -> Cart {
        Cart::create(
            NewCart {
                user_id: None,
                user: valid_user(),
                plan,
                billing_cycle: BillingCycle::Monthly,
                plan_amount: Money::from_minor(amount_minor, Currency::Inr),
                gateway: Gateway::Razorpay,
                coupon: None,
            },
            Timestamp::now(),
        )
        .unwrap()
    }

    fn token(value: &str, hours: i64) -> IssuedSignupToken {
        IssuedSignupToken {
            token: value.to_string(),
            expires_at: Timestamp::now().add_hours(hours),
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Construction
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn create_starts_pending_without_dates() {
        let cart = new_cart(PlanName::Basic, 49_900);
        assert_eq!(cart.payment.status, PaymentStatus::Pending);
        assert!(cart.subscription.start_date.is_none());
        assert!(cart.subscription.end_date.is_none());
        assert!(cart.signup_token.is_none());
        assert!(cart.payment.payment_id.as_str().starts_with("ord_"));
    }

    #[test]
    fn create_subtracts_coupon_discount() {
        let cart = Cart::create(
            NewCart {
                user_id: None,
                user: valid_user(),
                plan: PlanName::Basic,
                billing_cycle: BillingCycle::Monthly,
                plan_amount: Money::from_minor(49_900, Currency::Inr),
                gateway: Gateway::Razorpay,
                coupon: Some(AppliedCoupon {
                    code: "SAVE20".into(),
                    discount_amount: Money::from_minor(10_000, Currency::Inr),
                }),
            },
            Timestamp::now(),
        )
        .unwrap();
        assert_eq!(cart.payment.total_amount.minor(), 39_900);
    }

    #[test]
    fn create_rejects_invalid_user() {
        let mut user = valid_user();
        user.email = "nope".into();
        let result = Cart::create(
            NewCart {
                user_id: None,
                user,
                plan: PlanName::Pro,
                billing_cycle: BillingCycle::Yearly,
                plan_amount: Money::from_minor(100, Currency::Usd),
                gateway: Gateway::Paypal,
                coupon: None,
            },
            Timestamp::now(),
        );
        assert!(matches!(
            result,
            Err(CheckoutError::ValidationFailed { ref field, .. }) if field == "user.email"
        ));
    }

    #[test]
    fn zero_total_does_not_require_payment() {
        assert!(!new_cart(PlanName::Free, 0).requires_payment());
        assert!(!new_cart(PlanName::Pro, 0).requires_payment());
        assert!(new_cart(PlanName::Pro, 100).requires_payment());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Payment transitions
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn completing_sets_dates_and_activates() {
        let mut cart = new_cart(PlanName::Basic, 49_900);
        let now = Timestamp::now();
        let result = cart.apply_payment(
            PaymentChange::to(PaymentStatus::Completed).with_transaction("pay_1"),
            now,
        );
        assert_eq!(result, Ok(Transition::Applied { from: PaymentStatus::Pending }));
        assert!(cart.subscription.is_active);
        assert_eq!(cart.subscription.start_date, Some(now));
        assert_eq!(
            cart.subscription.end_date,
            Some(BillingCycle::Monthly.period_end(now))
        );
        assert_eq!(cart.payment.transaction_id.as_deref(), Some("pay_1"));
    }

    #[test]
    fn free_plan_completes_without_end_date() {
        let mut cart = new_cart(PlanName::Free, 0);
        cart.apply_payment(PaymentChange::to(PaymentStatus::Completed), Timestamp::now())
            .unwrap();
        assert!(cart.subscription.start_date.is_some());
        assert!(cart.subscription.end_date.is_none());
    }

    #[test]
    fn paid_cart_needs_transaction_id_to_complete() {
        let mut cart = new_cart(PlanName::Basic, 49_900);
        let err = cart
            .apply_payment(PaymentChange::to(PaymentStatus::Completed), Timestamp::now())
            .unwrap_err();
        assert!(matches!(err, CheckoutError::ValidationFailed { .. }));
        assert_eq!(cart.payment.status, PaymentStatus::Pending);
    }

    #[test]
    fn repeated_completion_is_unchanged() {
        let mut cart = new_cart(PlanName::Basic, 49_900);
        let first = Timestamp::now();
        cart.apply_payment(
            PaymentChange::to(PaymentStatus::Completed).with_transaction("pay_1"),
            first,
        )
        .unwrap();
        let again = cart
            .apply_payment(
                PaymentChange::to(PaymentStatus::Completed).with_transaction("pay_2"),
                first.add_hours(1),
            )
            .unwrap();
        assert_eq!(again, Transition::Unchanged);
        assert_eq!(cart.subscription.start_date, Some(first));
        assert_eq!(cart.payment.transaction_id.as_deref(), Some("pay_1"));
    }

    #[test]
    fn completed_cannot_move_backwards() {
        let mut cart = new_cart(PlanName::Basic, 49_900);
        cart.apply_payment(
            PaymentChange::to(PaymentStatus::Completed).with_transaction("pay_1"),
            Timestamp::now(),
        )
        .unwrap();
        let err = cart
            .apply_payment(PaymentChange::to(PaymentStatus::Failed), Timestamp::now())
            .unwrap_err();
        assert_eq!(
            err,
            CheckoutError::invalid_transition(PaymentStatus::Completed, PaymentStatus::Failed)
        );
        assert_eq!(cart.payment.status, PaymentStatus::Completed);
    }

    #[test]
    fn failed_cart_can_retry_and_complete() {
        let mut cart = new_cart(PlanName::Pro, 99_900);
        cart.apply_payment(PaymentChange::to(PaymentStatus::Failed), Timestamp::now())
            .unwrap();
        assert!(cart.subscription.start_date.is_none());
        cart.apply_payment(PaymentChange::to(PaymentStatus::Pending), Timestamp::now())
            .unwrap();
        cart.apply_payment(
            PaymentChange::to(PaymentStatus::Completed).with_transaction("pay_9"),
            Timestamp::now(),
        )
        .unwrap();
        assert!(cart.is_completed());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Signup token and completion
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn token_only_attaches_to_completed_cart() {
        let mut cart = new_cart(PlanName::Basic, 49_900);
        assert!(cart.attach_signup_token(token("t1", 24)).is_err());
    }

    #[test]
    fn token_is_minted_at_most_once() {
        let mut cart = new_cart(PlanName::Free, 0);
        cart.apply_payment(PaymentChange::to(PaymentStatus::Completed), Timestamp::now())
            .unwrap();
        assert!(cart.needs_signup_token());
        assert_eq!(cart.attach_signup_token(token("t1", 24)), Ok(true));
        assert_eq!(cart.attach_signup_token(token("t2", 24)), Ok(false));
        assert_eq!(cart.signup_token.as_deref(), Some("t1"));
        assert!(!cart.needs_signup_token());
    }

    #[test]
    fn resumption_is_blocked_after_completion() {
        let mut cart = new_cart(PlanName::Free, 0);
        assert!(cart.ensure_resumable().is_ok());
        cart.apply_payment(PaymentChange::to(PaymentStatus::Completed), Timestamp::now())
            .unwrap();
        assert_eq!(cart.ensure_resumable(), Err(CheckoutError::AlreadyCompleted(cart.id)));
    }

    #[test]
    fn complete_signup_flips_flag_once() {
        let mut cart = new_cart(PlanName::Free, 0);
        cart.apply_payment(PaymentChange::to(PaymentStatus::Completed), Timestamp::now())
            .unwrap();
        cart.attach_signup_token(token("t1", 24)).unwrap();

        cart.complete_signup(Timestamp::now()).unwrap();
        assert!(cart.is_signup_completed);
        assert_eq!(
            cart.complete_signup(Timestamp::now()),
            Err(CheckoutError::SignupAlreadyCompleted(cart.id))
        );
    }

    #[test]
    fn complete_signup_rejects_expired_token() {
        let mut cart = new_cart(PlanName::Free, 0);
        cart.apply_payment(PaymentChange::to(PaymentStatus::Completed), Timestamp::now())
            .unwrap();
        cart.attach_signup_token(token("t1", 24)).unwrap();

        let later = Timestamp::now().add_hours(25);
        assert_eq!(cart.complete_signup(later), Err(CheckoutError::TokenExpired));
        assert!(!cart.is_signup_completed);
    }
}
