//! Partner API configuration

use secrecy::SecretString;
use serde::Deserialize;

use super::error::ValidationError;

const MIN_KEY_LEN: usize = 24;

/// Bearer key shared with the partner signup service
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartnerConfig {
    #[serde(default)]
    pub api_key: String,
}

impl PartnerConfig {
    pub fn api_key(&self) -> SecretString {
        SecretString::new(self.api_key.clone())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.api_key.is_empty() {
            return Err(ValidationError::MissingRequired("PARTNER__API_KEY"));
        }
        if self.api_key.len() < MIN_KEY_LEN {
            return Err(ValidationError::SecretTooShort("partner.api_key"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key() {
        assert_eq!(
            PartnerConfig::default().validate(),
            Err(ValidationError::MissingRequired("PARTNER__API_KEY"))
        );
    }

    #[test]
    fn test_short_key() {
        let config = PartnerConfig {
            api_key: "short".to_string(),
        };
        assert_eq!(config.validate(), Err(ValidationError::SecretTooShort("partner.api_key")));
    }

    #[test]
    fn test_valid_key() {
        let config = PartnerConfig {
            api_key: "pk_0123456789abcdef01234567".to_string(),
        };
        assert!(config.validate().is_ok());
    }
}
