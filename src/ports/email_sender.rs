//! Welcome email port.
//!
//! Fire-and-forget from the checkout's point of view: a failure is logged
//! and reported as a warning, never rolled back.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::cart::{BillingCycle, PlanName};
use crate::domain::foundation::{CartId, Money, Timestamp};

/// Contents of the welcome email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WelcomeEmail {
    pub cart_id: CartId,
    pub to: String,
    pub name: String,
    pub plan: PlanName,
    pub billing_cycle: BillingCycle,
    pub amount: Money,
    /// Link the recipient follows to finish signup.
    pub signup_url: Option<String>,
    /// When the signup token behind `signup_url` stops working.
    pub link_expires_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmailError {
    #[error("email provider rejected the message: {0}")]
    Rejected(String),

    #[error("email provider unreachable: {0}")]
    Network(String),
}

/// Sends the post-purchase welcome email.
#[async_trait]
pub trait WelcomeEmailSender: Send + Sync {
    async fn send_welcome(&self, email: &WelcomeEmail) -> Result<(), EmailError>;
}
