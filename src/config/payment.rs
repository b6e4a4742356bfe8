//! Payment gateway configuration

use secrecy::SecretString;
use serde::Deserialize;

use super::error::ValidationError;

/// Razorpay and PayPal credentials
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentConfig {
    #[serde(default)]
    pub razorpay: RazorpaySettings,

    #[serde(default)]
    pub paypal: PaypalSettings,
}

/// Razorpay credentials
#[derive(Debug, Clone, Deserialize)]
pub struct RazorpaySettings {
    /// Public key id (`rzp_test_...` / `rzp_live_...`)
    #[serde(default)]
    pub key_id: String,

    /// Key secret, signs checkout confirmations
    #[serde(default)]
    pub key_secret: String,

    /// Webhook secret, signs webhook bodies
    #[serde(default)]
    pub webhook_secret: String,

    #[serde(default = "default_razorpay_api_base")]
    pub api_base: String,
}

/// PayPal REST credentials
#[derive(Debug, Clone, Deserialize)]
pub struct PaypalSettings {
    #[serde(default)]
    pub client_id: String,

    #[serde(default)]
    pub client_secret: String,

    /// Id of the webhook registered with PayPal, used for verification
    #[serde(default)]
    pub webhook_id: String,

    /// Sandbox unless overridden
    #[serde(default = "default_paypal_api_base")]
    pub api_base: String,
}

impl RazorpaySettings {
    pub fn is_live_mode(&self) -> bool {
        self.key_id.starts_with("rzp_live_")
    }

    pub fn key_secret(&self) -> SecretString {
        SecretString::new(self.key_secret.clone())
    }

    pub fn webhook_secret(&self) -> SecretString {
        SecretString::new(self.webhook_secret.clone())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.key_id.is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__RAZORPAY__KEY_ID"));
        }
        if !self.key_id.starts_with("rzp_") {
            return Err(ValidationError::InvalidRazorpayKey);
        }
        if self.key_secret.is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__RAZORPAY__KEY_SECRET"));
        }
        if self.webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired(
                "PAYMENT__RAZORPAY__WEBHOOK_SECRET",
            ));
        }
        if !self.api_base.starts_with("https://") {
            return Err(ValidationError::MustBeHttps("payment.razorpay.api_base"));
        }
        Ok(())
    }
}

impl PaypalSettings {
    pub fn is_sandbox(&self) -> bool {
        self.api_base.contains("sandbox")
    }

    pub fn client_secret(&self) -> SecretString {
        SecretString::new(self.client_secret.clone())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.client_id.is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__PAYPAL__CLIENT_ID"));
        }
        if self.client_secret.is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__PAYPAL__CLIENT_SECRET"));
        }
        if self.webhook_id.is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__PAYPAL__WEBHOOK_ID"));
        }
        if !self.api_base.starts_with("https://") {
            return Err(ValidationError::MustBeHttps("payment.paypal.api_base"));
        }
        Ok(())
    }
}

impl PaymentConfig {
    /// Validate both gateways
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.razorpay.validate()?;
        self.paypal.validate()?;
        Ok(())
    }
}

impl Default for RazorpaySettings {
    fn default() -> Self {
        Self {
            key_id: String::new(),
            key_secret: String::new(),
            webhook_secret: String::new(),
            api_base: default_razorpay_api_base(),
        }
    }
}

impl Default for PaypalSettings {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            webhook_id: String::new(),
            api_base: default_paypal_api_base(),
        }
    }
}

fn default_razorpay_api_base() -> String {
    "https://api.razorpay.com".to_string()
}

fn default_paypal_api_base() -> String {
    "https://api-m.sandbox.paypal.com".to_string()
}
