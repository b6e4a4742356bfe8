//! Gateway callbacks and their normalized form.

use crate::domain::cart::{Gateway, PaymentChange, PaymentStatus};
use crate::domain::foundation::CartId;

/// Header name/value pairs from an inbound webhook, names lowercased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookHeaders(Vec<(String, String)>);

impl WebhookHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.0.push((name.as_ref().to_ascii_lowercase(), value.into()));
    }

    pub fn with(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Case-insensitive lookup of the first value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.0
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Raw callback from a gateway, tagged with its provider.
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    /// Browser returned from the gateway's hosted page (PayPal approve).
    Redirect {
        gateway: Gateway,
        cart_id: CartId,
        order_id: String,
    },

    /// Server-to-server notification.
    Webhook {
        gateway: Gateway,
        headers: WebhookHeaders,
        body: Vec<u8>,
    },

    /// Signed confirmation relayed by the browser (Razorpay Checkout).
    ClientConfirm {
        gateway: Gateway,
        cart_id: CartId,
        order_id: String,
        payment_id: String,
        signature: String,
    },
}

impl GatewayEvent {
    pub fn gateway(&self) -> Gateway {
        match self {
            GatewayEvent::Redirect { gateway, .. }
            | GatewayEvent::Webhook { gateway, .. }
            | GatewayEvent::ClientConfirm { gateway, .. } => *gateway,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            GatewayEvent::Redirect { .. } => "redirect",
            GatewayEvent::Webhook { .. } => "webhook",
            GatewayEvent::ClientConfirm { .. } => "client_confirm",
        }
    }
}

/// Terminal result a gateway can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Completed,
    Failed,
    Cancelled,
}

impl PaymentOutcome {
    pub fn status(&self) -> PaymentStatus {
        match self {
            PaymentOutcome::Completed => PaymentStatus::Completed,
            PaymentOutcome::Failed => PaymentStatus::Failed,
            PaymentOutcome::Cancelled => PaymentStatus::Cancelled,
        }
    }
}

/// A gateway callback reduced to the one update the cart cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentUpdate {
    pub cart_id: CartId,
    pub transaction_id: Option<String>,
    pub outcome: PaymentOutcome,
    pub payment_method: Option<String>,
}

impl PaymentUpdate {
    pub fn into_change(self) -> (CartId, PaymentChange) {
        (
            self.cart_id,
            PaymentChange {
                status: self.outcome.status(),
                transaction_id: self.transaction_id,
                payment_method: self.payment_method,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let headers = WebhookHeaders::new().with("X-Razorpay-Signature", "abc");
        assert_eq!(headers.get("x-razorpay-signature"), Some("abc"));
        assert_eq!(headers.get("X-RAZORPAY-SIGNATURE"), Some("abc"));
        assert_eq!(headers.get("other"), None);
    }

    #[test]
    fn update_converts_to_payment_change() {
        let cart_id = CartId::new();
        let (id, change) = PaymentUpdate {
            cart_id,
            transaction_id: Some("pay_1".into()),
            outcome: PaymentOutcome::Cancelled,
            payment_method: None,
        }
        .into_change();
        assert_eq!(id, cart_id);
        assert_eq!(change.status, PaymentStatus::Cancelled);
        assert_eq!(change.transaction_id.as_deref(), Some("pay_1"));
    }
}
