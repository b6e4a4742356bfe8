//! Purchaser snapshot captured at cart creation.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

/// Postal address of the purchaser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub country: String,
    pub postal_code: String,
}

/// Who is buying. Immutable once the cart exists.
///
/// Either `first_name` + `last_name` or a combined `name` must be present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub email: String,
    pub address: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

fn require(value: &str, field: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::empty_field(field));
    }
    Ok(())
}

impl UserDetails {
    /// Checks the fields a cart cannot be created without.
    ///
    /// The first violation wins; the error names the offending field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let has_split_name = !is_blank(&self.first_name) && !is_blank(&self.last_name);
        if !has_split_name && is_blank(&self.name) {
            return Err(ValidationError::empty_field("user.name"));
        }

        require(&self.email, "user.email")?;
        validate_email(self.email.trim())?;

        require(&self.address.street, "user.address.street")?;
        require(&self.address.city, "user.address.city")?;
        require(&self.address.country, "user.address.country")?;
        require(&self.address.postal_code, "user.address.postalCode")?;
        Ok(())
    }

    /// Name as it should appear in correspondence.
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) if !first.trim().is_empty() => {
                format!("{} {}", first.trim(), last.trim())
            }
            _ => self.name.clone().unwrap_or_default().trim().to_string(),
        }
    }
}

/// Syntactic check only: one `@`, non-empty local part, dotted domain.
fn validate_email(email: &str) -> Result<(), ValidationError> {
    let invalid = |reason: &str| ValidationError::invalid_format("user.email", reason);

    if email.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain whitespace"));
    }
    let (local, domain) = email.split_once('@').ok_or_else(|| invalid("missing @ symbol"))?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid("malformed address"));
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(invalid("domain must contain a dot"));
    }
    Ok(())
}
