//! CreateCartHandler - Command handler for starting a checkout.

use std::sync::Arc;

use crate::domain::cart::{
    AppliedCoupon, BillingCycle, Cart, CheckoutError, Gateway, NewCart, PaymentChange,
    PaymentStatus, PlanName, UserDetails,
};
use crate::domain::coupon::CouponEvaluator;
use crate::domain::foundation::{Money, Timestamp, UserId};
use crate::ports::{CartRepository, CouponRepository, PlanCatalog};

use super::{CompletionEffects, SoftFailures};

/// Supplied and catalog prices may differ by this fraction before the
/// supplied amount wins.
const PRICE_TOLERANCE: f64 = 0.01;

/// Payment method recorded for carts that never reach a gateway.
const NO_CHARGE_METHOD: &str = "free";

/// Command to create a cart.
#[derive(Debug, Clone)]
pub struct CreateCartCommand {
    pub plan: PlanName,
    pub billing_cycle: BillingCycle,
    /// Amount the client displayed, in the checkout currency.
    pub amount: Money,
    pub user: UserDetails,
    pub gateway: Gateway,
    pub user_id: Option<UserId>,
    pub coupon_code: Option<String>,
}

/// Result of cart creation.
#[derive(Debug, Clone)]
pub struct CreateCartResult {
    pub cart: Cart,
    /// Present only when the cart was completed at creation.
    pub signup_token: Option<String>,
    pub soft: SoftFailures,
}

/// Handler for creating carts.
pub struct CreateCartHandler {
    carts: Arc<dyn CartRepository>,
    catalog: Arc<dyn PlanCatalog>,
    coupons: Arc<dyn CouponRepository>,
    effects: CompletionEffects,
}

impl CreateCartHandler {
    pub fn new(
        carts: Arc<dyn CartRepository>,
        catalog: Arc<dyn PlanCatalog>,
        coupons: Arc<dyn CouponRepository>,
        effects: CompletionEffects,
    ) -> Self {
        Self {
            carts,
            catalog,
            coupons,
            effects,
        }
    }

    pub async fn handle(&self, cmd: CreateCartCommand) -> Result<CreateCartResult, CheckoutError> {
        // 1. Reject bad input before touching anything
        cmd.user.validate()?;
        let now = Timestamp::now();

        // 2. Resolve the plan
        let plan = self
            .catalog
            .find_plan(cmd.plan)
            .await?
            .ok_or(CheckoutError::PlanNotFound(cmd.plan))?;

        // 3. Price and coupon
        let currency = cmd.amount.currency();
        let coupon_code = cmd
            .coupon_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());

        let (plan_amount, coupon) = if plan.name.is_free() {
            if let Some(code) = coupon_code {
                tracing::debug!(coupon = %code, "Coupon ignored for free plan");
            }
            (Money::zero(currency), None)
        } else {
            let catalog_price = plan.price_for(currency, cmd.billing_cycle);
            match coupon_code {
                Some(code) => {
                    let base = catalog_price.unwrap_or(cmd.amount);
                    let applied = self.apply_coupon(code, base, cmd.amount, now).await?;
                    (base, Some(applied))
                }
                None => (resolve_price(cmd.plan, catalog_price, cmd.amount), None),
            }
        };

        // 4. Build the aggregate
        let mut cart = Cart::create(
            NewCart {
                user_id: cmd.user_id,
                user: cmd.user,
                plan: cmd.plan,
                billing_cycle: cmd.billing_cycle,
                plan_amount,
                gateway: cmd.gateway,
                coupon,
            },
            now,
        )?;

        // 5. Nothing to charge: complete now, mint the token, persist once
        if !cart.requires_payment() {
            cart.apply_payment(
                PaymentChange::to(PaymentStatus::Completed)
                    .with_method(Some(NO_CHARGE_METHOD.to_string())),
                now,
            )?;
            self.effects.mint_if_absent(&mut cart, now)?;
            self.carts.save(&cart).await?;

            tracing::info!(
                cart_id = %cart.id,
                plan = %cart.subscription.plan,
                "Cart created and completed without payment"
            );

            let soft = self.effects.after_completion(&cart).await;
            return Ok(CreateCartResult {
                signup_token: cart.signup_token.clone(),
                cart,
                soft,
            });
        }

        // 6. Paid: persist pending
        self.carts.save(&cart).await?;
        tracing::info!(
            cart_id = %cart.id,
            plan = %cart.subscription.plan,
            gateway = %cart.payment.gateway,
            total = %cart.payment.total_amount,
            "Cart created"
        );

        Ok(CreateCartResult {
            cart,
            signup_token: None,
            soft: SoftFailures::default(),
        })
    }

    /// Validates the coupon and computes the server-side total.
    async fn apply_coupon(
        &self,
        code: &str,
        base: Money,
        supplied: Money,
        now: Timestamp,
    ) -> Result<AppliedCoupon, CheckoutError> {
        let found = self.coupons.find_by_code(code).await?;
        let coupon = CouponEvaluator::validate(found, now)
            .map_err(|reason| CheckoutError::coupon_rejected(code, reason))?;
        let breakdown = CouponEvaluator::apply(&coupon, base)
            .map_err(|reason| CheckoutError::coupon_rejected(code, reason))?;

        if breakdown.total != supplied {
            tracing::warn!(
                coupon = %coupon.code,
                supplied = %supplied,
                computed = %breakdown.total,
                "Discounted total differs from client amount, using server total"
            );
        }

        Ok(AppliedCoupon {
            code: coupon.code,
            discount_amount: breakdown.discount,
        })
    }
}

/// Catalog price unless the supplied amount is more than the tolerance away.
fn resolve_price(plan: PlanName, catalog: Option<Money>, supplied: Money) -> Money {
    match catalog {
        Some(price) if price.relative_difference(supplied) > PRICE_TOLERANCE => {
            tracing::warn!(
                plan = %plan,
                catalog = %price,
                supplied = %supplied,
                "Supplied amount differs from catalog price, trusting supplied amount"
            );
            supplied
        }
        Some(price) => price,
        None => {
            tracing::debug!(plan = %plan, currency = %supplied.currency(), "No catalog price for currency");
            supplied
        }
    }
}
