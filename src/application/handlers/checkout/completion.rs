//! Side effects of a cart reaching `completed`.
//!
//! Token minting happens before the status write so the token lands in the
//! same conditional update. Redemption and the welcome email run after the
//! write, once, and only report soft failures.

use std::sync::Arc;

use crate::domain::cart::{Cart, CheckoutError};
use crate::domain::foundation::Timestamp;
use crate::domain::signup::SignupTokenService;
use crate::ports::{CouponRepository, WelcomeEmail, WelcomeEmailSender};

/// Failures that do not undo a committed cart update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SoftFailures {
    pub warning: Option<String>,
    pub email_error: Option<String>,
}

impl SoftFailures {
    fn add_warning(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.warning = Some(match self.warning.take() {
            Some(existing) => format!("{}; {}", existing, message),
            None => message,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.warning.is_none() && self.email_error.is_none()
    }
}

/// Token minting plus post-completion effects.
#[derive(Clone)]
pub struct CompletionEffects {
    tokens: Arc<SignupTokenService>,
    coupons: Arc<dyn CouponRepository>,
    email: Arc<dyn WelcomeEmailSender>,
    signup_url: Option<String>,
}

impl CompletionEffects {
    pub fn new(
        tokens: Arc<SignupTokenService>,
        coupons: Arc<dyn CouponRepository>,
        email: Arc<dyn WelcomeEmailSender>,
    ) -> Self {
        Self {
            tokens,
            coupons,
            email,
            signup_url: None,
        }
    }

    /// Page the welcome email links to; the token is appended as `?token=`.
    pub fn with_signup_url(mut self, url: impl Into<String>) -> Self {
        self.signup_url = Some(url.into());
        self
    }

    pub fn tokens(&self) -> &SignupTokenService {
        &self.tokens
    }

    /// Issues and attaches a signup token if the cart is completed and has none.
    pub fn mint_if_absent(&self, cart: &mut Cart, now: Timestamp) -> Result<(), CheckoutError> {
        if !cart.needs_signup_token() {
            return Ok(());
        }
        let issued = self
            .tokens
            .issue(&cart.user.email, cart.subscription.plan, cart.id, now)
            .map_err(|e| CheckoutError::infrastructure(e.to_string()))?;
        cart.attach_signup_token(issued)?;
        Ok(())
    }

    fn signup_link(&self, cart: &Cart) -> Option<String> {
        let base = self.signup_url.as_deref()?;
        let token = cart.signup_token.as_deref()?;
        let sep = if base.contains('?') { '&' } else { '?' };
        Some(format!("{}{}token={}", base, sep, token))
    }

    /// Records coupon redemption and sends the welcome email.
    ///
    /// Call once, from the write that moved the cart into `completed`.
    pub async fn after_completion(&self, cart: &Cart) -> SoftFailures {
        let mut soft = SoftFailures::default();

        if let Some(coupon) = &cart.coupon {
            match self.coupons.record_redemption(&coupon.code).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::warn!(
                        cart_id = %cart.id,
                        coupon = %coupon.code,
                        "Coupon redemption not recorded (limit reached or coupon removed)"
                    );
                    soft.add_warning(format!("Coupon {} usage could not be recorded", coupon.code));
                }
                Err(e) => {
                    tracing::warn!(cart_id = %cart.id, coupon = %coupon.code, error = %e, "Coupon redemption failed");
                    soft.add_warning(format!("Coupon {} usage could not be recorded", coupon.code));
                }
            }
        }

        let email = WelcomeEmail {
            cart_id: cart.id,
            to: cart.user.email.clone(),
            name: cart.user.display_name(),
            plan: cart.subscription.plan,
            billing_cycle: cart.subscription.billing_cycle,
            amount: cart.payment.total_amount,
            signup_url: self.signup_link(cart),
            link_expires_at: cart.token_expiry,
        };
        if let Err(e) = self.email.send_welcome(&email).await {
            tracing::warn!(cart_id = %cart.id, error = %e, "Welcome email failed");
            soft.email_error = Some(e.to_string());
            soft.add_warning("Purchase recorded but the welcome email could not be sent");
        }

        soft
    }
}
