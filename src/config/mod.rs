//! Application configuration module
//!
//! Configuration is read from environment variables with the `CHECKOUT`
//! prefix; nested values are separated by `__`.
//!
//! # Example
//!
//! ```no_run
//! use checkout_core::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod email;
mod error;
mod partner;
mod payment;
mod server;
mod signup;

pub use database::DatabaseConfig;
pub use email::EmailConfig;
pub use error::{ConfigError, ValidationError};
pub use partner::PartnerConfig;
pub use payment::{PaymentConfig, PaypalSettings, RazorpaySettings};
pub use server::{Environment, ServerConfig};
pub use signup::SignupConfig;

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Host, port, public URLs
    #[serde(default)]
    pub server: ServerConfig,

    /// PostgreSQL connection
    pub database: DatabaseConfig,

    /// Razorpay and PayPal credentials
    #[serde(default)]
    pub payment: PaymentConfig,

    /// Partner API key
    #[serde(default)]
    pub partner: PartnerConfig,

    /// Signup token signing
    #[serde(default)]
    pub signup: SignupConfig,

    /// Email configuration (Resend)
    #[serde(default)]
    pub email: EmailConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// - `CHECKOUT__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `CHECKOUT__PAYMENT__RAZORPAY__KEY_ID=...` -> `payment.razorpay.key_id = ...`
    ///
    /// A `.env` file is loaded first when present.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("CHECKOUT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.payment.validate()?;
        self.partner.validate()?;
        self.signup.validate()?;
        self.email.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
