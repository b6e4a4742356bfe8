//! Resend welcome email adapter.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::domain::foundation::{Money, Timestamp};
use crate::ports::{EmailError, WelcomeEmail, WelcomeEmailSender};

const RESEND_API_URL: &str = "https://api.resend.com/emails";

#[derive(Clone)]
pub struct ResendEmailSender {
    client: Client,
    api_key: SecretString,
    from: String,
    reply_to: Option<String>,
    api_url: String,
}

impl ResendEmailSender {
    pub fn new(api_key: SecretString, from: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            from,
            reply_to: None,
            api_url: RESEND_API_URL.to_string(),
        }
    }

    /// Set a custom endpoint.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_reply_to(mut self, reply_to: Option<String>) -> Self {
        self.reply_to = reply_to;
        self
    }
}

#[derive(Serialize)]
struct ResendReq<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

#[async_trait]
impl WelcomeEmailSender for ResendEmailSender {
    async fn send_welcome(&self, email: &WelcomeEmail) -> Result<(), EmailError> {
        let (subject, html) = render_welcome(email);
        let body = ResendReq {
            from: &self.from,
            to: [&email.to],
            subject: &subject,
            html: &html,
            reply_to: self.reply_to.as_deref(),
        };
        self.client
            .post(&self.api_url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| EmailError::Network(e.to_string()))?
            .error_for_status()
            .map_err(|e| EmailError::Rejected(e.to_string()))?;
        tracing::debug!(cart_id = %email.cart_id, "Welcome email accepted by Resend");
        Ok(())
    }
}

fn format_amount(amount: Money) -> String {
    let per = amount.currency().minor_per_major();
    let minor = amount.minor();
    format!("{} {}.{:02}", amount.currency().code(), minor / per, minor % per)
}

/// Escape HTML special characters.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn format_expiry(at: &Timestamp) -> String {
    at.as_datetime().format("%d %b %Y, %H:%M UTC").to_string()
}

/// Subject and HTML body of the welcome email.
///
/// Every caller-supplied string is escaped before it reaches the markup.
fn render_welcome(email: &WelcomeEmail) -> (String, String) {
    let subject = format!("Welcome to the {} plan", email.plan);
    let billing = if email.amount.is_zero() {
        "Your plan is free.".to_string()
    } else {
        format!(
            "You were charged {} ({} billing).",
            format_amount(email.amount),
            email.billing_cycle
        )
    };
    let cta = match &email.signup_url {
        Some(url) => {
            let expiry = email
                .link_expires_at
                .as_ref()
                .map(|at| format!(" The link expires on {}.", format_expiry(at)))
                .unwrap_or_default();
            format!(
                r#"<p><a href="{}">Finish setting up your account</a>.{}</p>"#,
                html_escape(url),
                expiry
            )
        }
        None => String::new(),
    };
    let html = format!(
        "<p>Hi {},</p><p>Thanks for choosing the {} plan. {}</p>{}<p>Order reference: {}</p>",
        html_escape(&email.name),
        email.plan,
        billing,
        cta,
        email.cart_id
    );
    (subject, html)
}
