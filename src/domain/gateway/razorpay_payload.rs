//! Razorpay webhook payloads.
//!
//! Only the fields the cart needs are modelled. `notes` is free-form and
//! Razorpay sends `[]` instead of `{}` when it is empty, so it stays a
//! `serde_json::Value`.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::foundation::CartId;

use super::{GatewayError, PaymentOutcome, PaymentUpdate};

/// Notes key carrying our cart id.
pub const CART_ID_NOTE: &str = "cart_id";

#[derive(Debug, Clone, Deserialize)]
pub struct RazorpayWebhook {
    pub event: String,
    #[serde(default)]
    pub payload: RazorpayWebhookPayload,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RazorpayWebhookPayload {
    pub payment: Option<EntityWrapper<RazorpayPayment>>,
    pub order: Option<EntityWrapper<RazorpayOrder>>,
    pub refund: Option<EntityWrapper<RazorpayRefund>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntityWrapper<T> {
    pub entity: T,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RazorpayPayment {
    pub id: String,
    pub order_id: Option<String>,
    pub method: Option<String>,
    #[serde(default)]
    pub notes: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RazorpayOrder {
    pub id: String,
    #[serde(default)]
    pub notes: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RazorpayRefund {
    pub id: String,
    pub payment_id: Option<String>,
    #[serde(default)]
    pub notes: Value,
}

fn note_cart_id(notes: &Value) -> Option<&str> {
    notes.get(CART_ID_NOTE).and_then(Value::as_str)
}

impl RazorpayWebhook {
    pub fn parse(body: &[u8]) -> Result<Self, GatewayError> {
        serde_json::from_slice(body).map_err(|e| GatewayError::ParseError(e.to_string()))
    }

    fn outcome(&self) -> Option<PaymentOutcome> {
        match self.event.as_str() {
            "payment.captured" | "order.paid" => Some(PaymentOutcome::Completed),
            "payment.failed" => Some(PaymentOutcome::Failed),
            "refund.created" | "refund.processed" | "payment.refunded" => {
                Some(PaymentOutcome::Cancelled)
            }
            _ => None,
        }
    }

    /// Cart id from payment, order, then refund notes.
    fn cart_id(&self) -> Option<&str> {
        let p = &self.payload;
        p.payment
            .as_ref()
            .and_then(|w| note_cart_id(&w.entity.notes))
            .or_else(|| p.order.as_ref().and_then(|w| note_cart_id(&w.entity.notes)))
            .or_else(|| p.refund.as_ref().and_then(|w| note_cart_id(&w.entity.notes)))
    }

    fn transaction_id(&self) -> Option<String> {
        let p = &self.payload;
        p.payment
            .as_ref()
            .map(|w| w.entity.id.clone())
            .or_else(|| p.refund.as_ref().and_then(|w| w.entity.payment_id.clone()))
    }

    /// Normalizes to a cart update.
    ///
    /// # Errors
    ///
    /// - `Ignored` - event type we do not act on
    /// - `MissingField` - no cart id in any notes
    /// - `ParseError` - cart id is not a UUID
    pub fn into_update(self) -> Result<PaymentUpdate, GatewayError> {
        let outcome = self
            .outcome()
            .ok_or_else(|| GatewayError::Ignored(self.event.clone()))?;
        let cart_id: CartId = self
            .cart_id()
            .ok_or(GatewayError::MissingField("notes.cart_id"))?
            .parse()
            .map_err(|_| GatewayError::ParseError("notes.cart_id is not a valid id".into()))?;
        let transaction_id = self.transaction_id();
        let payment_method = self
            .payload
            .payment
            .as_ref()
            .and_then(|w| w.entity.method.clone());

        Ok(PaymentUpdate {
            cart_id,
            transaction_id,
            outcome,
            payment_method,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment_event(event: &str, cart_id: &CartId) -> String {
        format!(
            r#"{{"event":"{}","payload":{{"payment":{{"entity":{{"id":"pay_abc","order_id":"order_xyz","method":"upi","notes":{{"cart_id":"{}"}}}}}}}}}}"#,
            event, cart_id
        )
    }

    #[test]
    fn captured_payment_completes() {
        let cart_id = CartId::new();
        let update = RazorpayWebhook::parse(payment_event("payment.captured", &cart_id).as_bytes())
            .unwrap()
            .into_update()
            .unwrap();
        assert_eq!(update.cart_id, cart_id);
        assert_eq!(update.outcome, PaymentOutcome::Completed);
        assert_eq!(update.transaction_id.as_deref(), Some("pay_abc"));
        assert_eq!(update.payment_method.as_deref(), Some("upi"));
    }

    #[test]
    fn failed_payment_fails() {
        let cart_id = CartId::new();
        let update = RazorpayWebhook::parse(payment_event("payment.failed", &cart_id).as_bytes())
            .unwrap()
            .into_update()
            .unwrap();
        assert_eq!(update.outcome, PaymentOutcome::Failed);
    }

    #[test]
    fn refund_uses_refund_notes_and_payment_id() {
        let cart_id = CartId::new();
        let body = format!(
            r#"{{"event":"refund.processed","payload":{{"refund":{{"entity":{{"id":"rfnd_1","payment_id":"pay_abc","notes":{{"cart_id":"{}"}}}}}}}}}}"#,
            cart_id
        );
        let update = RazorpayWebhook::parse(body.as_bytes()).unwrap().into_update().unwrap();
        assert_eq!(update.outcome, PaymentOutcome::Cancelled);
        assert_eq!(update.transaction_id.as_deref(), Some("pay_abc"));
        assert_eq!(update.cart_id, cart_id);
    }

    #[test]
    fn order_paid_reads_order_notes() {
        let cart_id = CartId::new();
        let body = format!(
            r#"{{"event":"order.paid","payload":{{"payment":{{"entity":{{"id":"pay_1","notes":[]}}}},"order":{{"entity":{{"id":"order_1","notes":{{"cart_id":"{}"}}}}}}}}}}"#,
            cart_id
        );
        let update = RazorpayWebhook::parse(body.as_bytes()).unwrap().into_update().unwrap();
        assert_eq!(update.cart_id, cart_id);
        assert_eq!(update.outcome, PaymentOutcome::Completed);
    }

    #[test]
    fn unknown_event_is_ignored() {
        let body = r#"{"event":"subscription.charged","payload":{}}"#;
        let result = RazorpayWebhook::parse(body.as_bytes()).unwrap().into_update();
        assert!(matches!(result, Err(GatewayError::Ignored(_))));
    }

    #[test]
    fn missing_cart_id_is_reported() {
        let body = r#"{"event":"payment.captured","payload":{"payment":{"entity":{"id":"pay_1","notes":[]}}}}"#;
        let result = RazorpayWebhook::parse(body.as_bytes()).unwrap().into_update();
        assert!(matches!(result, Err(GatewayError::MissingField("notes.cart_id"))));
    }

    #[test]
    fn garbage_body_is_parse_error() {
        assert!(matches!(
            RazorpayWebhook::parse(b"not json"),
            Err(GatewayError::ParseError(_))
        ));
    }
}
