//! Welcome email delivery configuration

use secrecy::SecretString;
use serde::Deserialize;

use super::error::ValidationError;

const RESEND_API_URL: &str = "https://api.resend.com/emails";

/// How the post-purchase welcome email reaches Resend
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub resend_api_key: String,

    #[serde(default = "default_from_email")]
    pub from_email: String,

    #[serde(default = "default_from_name")]
    pub from_name: String,

    /// Where buyers' replies to the welcome email go
    #[serde(default)]
    pub reply_to: Option<String>,

    #[serde(default = "default_api_url")]
    pub api_url: String,
}

impl EmailConfig {
    /// `Name <address>` for the From header
    pub fn from_header(&self) -> String {
        format!("{} <{}>", self.from_name.trim(), self.from_email.trim())
    }

    pub fn api_key(&self) -> SecretString {
        SecretString::new(self.resend_api_key.clone())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.resend_api_key.is_empty() {
            return Err(ValidationError::MissingRequired("EMAIL__RESEND_API_KEY"));
        }
        if !self.resend_api_key.starts_with("re_") {
            return Err(ValidationError::InvalidResendKey);
        }
        if !is_plain_address(&self.from_email) {
            return Err(ValidationError::InvalidEmailAddress("email.from_email"));
        }
        if let Some(reply_to) = &self.reply_to {
            if !is_plain_address(reply_to) {
                return Err(ValidationError::InvalidEmailAddress("email.reply_to"));
            }
        }
        // The name is spliced into a header
        if self.from_name.trim().is_empty()
            || self.from_name.contains(['<', '>', '\r', '\n'])
        {
            return Err(ValidationError::InvalidSenderName);
        }
        if !self.api_url.starts_with("https://") {
            return Err(ValidationError::MustBeHttps("email.api_url"));
        }
        Ok(())
    }
}

/// `local@domain` with nothing that could break out of a header.
fn is_plain_address(address: &str) -> bool {
    let address = address.trim();
    match address.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !address.contains(|c: char| c.is_whitespace() || "<>,;\"".contains(c))
        }
        None => false,
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            resend_api_key: String::new(),
            from_email: default_from_email(),
            from_name: default_from_name(),
            reply_to: None,
            api_url: default_api_url(),
        }
    }
}

fn default_from_email() -> String {
    "billing@example.com".to_string()
}

fn default_from_name() -> String {
    "Billing".to_string()
}

fn default_api_url() -> String {
    RESEND_API_URL.to_string()
}
