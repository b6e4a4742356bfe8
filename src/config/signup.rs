//! Signup handoff configuration

use secrecy::SecretString;
use serde::Deserialize;

use super::error::ValidationError;

const MIN_SECRET_LEN: usize = 32;
const MAX_TTL_HOURS: i64 = 720;

/// Signup token signing and the page the welcome email links to
#[derive(Debug, Clone, Deserialize)]
pub struct SignupConfig {
    /// HS256 secret for signup tokens
    #[serde(default)]
    pub token_secret: String,

    #[serde(default = "default_ttl_hours")]
    pub token_ttl_hours: i64,

    /// Partner signup page; the token is appended as `?token=`
    #[serde(default)]
    pub signup_url: String,
}

impl SignupConfig {
    pub fn token_secret(&self) -> SecretString {
        SecretString::new(self.token_secret.clone())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.token_secret.is_empty() {
            return Err(ValidationError::MissingRequired("SIGNUP__TOKEN_SECRET"));
        }
        if self.token_secret.len() < MIN_SECRET_LEN {
            return Err(ValidationError::SecretTooShort("signup.token_secret"));
        }
        if !(1..=MAX_TTL_HOURS).contains(&self.token_ttl_hours) {
            return Err(ValidationError::InvalidTokenTtl);
        }
        if !self.signup_url.starts_with("http://") && !self.signup_url.starts_with("https://") {
            return Err(ValidationError::InvalidUrl("signup.signup_url"));
        }
        Ok(())
    }
}

impl Default for SignupConfig {
    fn default() -> Self {
        Self {
            token_secret: String::new(),
            token_ttl_hours: default_ttl_hours(),
            signup_url: String::new(),
        }
    }
}

fn default_ttl_hours() -> i64 {
    24
}
