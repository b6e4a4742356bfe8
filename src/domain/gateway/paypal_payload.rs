//! PayPal webhook payloads.

use serde::Deserialize;

use crate::domain::foundation::CartId;

use super::{GatewayError, PaymentOutcome, PaymentUpdate};

#[derive(Debug, Clone, Deserialize)]
pub struct PaypalWebhook {
    pub id: Option<String>,
    pub event_type: String,
    pub resource: PaypalResource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaypalResource {
    pub id: Option<String>,
    pub custom_id: Option<String>,
    pub status: Option<String>,
}

impl PaypalWebhook {
    pub fn parse(body: &[u8]) -> Result<Self, GatewayError> {
        serde_json::from_slice(body).map_err(|e| GatewayError::ParseError(e.to_string()))
    }

    fn outcome(&self) -> Option<PaymentOutcome> {
        match self.event_type.as_str() {
            "PAYMENT.CAPTURE.COMPLETED" => Some(PaymentOutcome::Completed),
            "PAYMENT.CAPTURE.DENIED" => Some(PaymentOutcome::Failed),
            "PAYMENT.CAPTURE.REFUNDED" => Some(PaymentOutcome::Cancelled),
            _ => None,
        }
    }

    /// Normalizes to a cart update. The cart id travels in `custom_id`.
    pub fn into_update(self) -> Result<PaymentUpdate, GatewayError> {
        let outcome = self
            .outcome()
            .ok_or_else(|| GatewayError::Ignored(self.event_type.clone()))?;
        let cart_id: CartId = self
            .resource
            .custom_id
            .as_deref()
            .ok_or(GatewayError::MissingField("resource.custom_id"))?
            .parse()
            .map_err(|_| GatewayError::ParseError("custom_id is not a valid id".into()))?;

        Ok(PaymentUpdate {
            cart_id,
            transaction_id: self.resource.id,
            outcome,
            payment_method: Some("paypal".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(event_type: &str, custom_id: &str) -> String {
        format!(
            r#"{{"id":"WH-1","event_type":"{}","resource":{{"id":"CAP-9","custom_id":"{}","status":"COMPLETED"}}}}"#,
            event_type, custom_id
        )
    }

    #[test]
    fn capture_completed_maps_to_completed() {
        let cart_id = CartId::new();
        let update = PaypalWebhook::parse(event("PAYMENT.CAPTURE.COMPLETED", &cart_id.to_string()).as_bytes())
            .unwrap()
            .into_update()
            .unwrap();
        assert_eq!(update.cart_id, cart_id);
        assert_eq!(update.outcome, PaymentOutcome::Completed);
        assert_eq!(update.transaction_id.as_deref(), Some("CAP-9"));
    }

    #[test]
    fn denied_and_refunded_map_to_failed_and_cancelled() {
        let cart_id = CartId::new().to_string();
        let denied = PaypalWebhook::parse(event("PAYMENT.CAPTURE.DENIED", &cart_id).as_bytes())
            .unwrap()
            .into_update()
            .unwrap();
        let refunded = PaypalWebhook::parse(event("PAYMENT.CAPTURE.REFUNDED", &cart_id).as_bytes())
            .unwrap()
            .into_update()
            .unwrap();
        assert_eq!(denied.outcome, PaymentOutcome::Failed);
        assert_eq!(refunded.outcome, PaymentOutcome::Cancelled);
    }

    #[test]
    fn other_events_are_ignored() {
        let result = PaypalWebhook::parse(event("CHECKOUT.ORDER.APPROVED", "x").as_bytes())
            .unwrap()
            .into_update();
        assert!(matches!(result, Err(GatewayError::Ignored(_))));
    }

    #[test]
    fn malformed_custom_id_is_parse_error() {
        let result = PaypalWebhook::parse(event("PAYMENT.CAPTURE.COMPLETED", "nope").as_bytes())
            .unwrap()
            .into_update();
        assert!(matches!(result, Err(GatewayError::ParseError(_))));
    }
}
