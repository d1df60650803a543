//! Payment configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;

/// Payment configuration (Stripe)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Stripe API key
    pub stripe_api_key: SecretString,

    /// Stripe webhook signing secret
    ///
    /// May be absent; every delivery is then rejected with a 400.
    pub stripe_webhook_secret: Option<SecretString>,

    /// Stripe API base URL
    #[serde(default = "default_stripe_api_base_url")]
    pub stripe_api_base_url: String,

    /// Stripe API version header
    #[serde(default = "default_stripe_api_version")]
    pub stripe_api_version: String,
}

impl PaymentConfig {
    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.stripe_api_key.expose_secret().starts_with("sk_test_")
    }

    /// Check if using Stripe live mode
    pub fn is_live_mode(&self) -> bool {
        self.stripe_api_key.expose_secret().starts_with("sk_live_")
    }

    /// Webhook secret, treating an empty value as absent
    pub fn webhook_secret(&self) -> Option<&SecretString> {
        self.stripe_webhook_secret
            .as_ref()
            .filter(|s| !s.expose_secret().is_empty())
    }

    /// Validate payment configuration
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        let api_key = self.stripe_api_key.expose_secret();
        if api_key.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_API_KEY"));
        }

        // Verify key prefixes for safety
        if !api_key.starts_with("sk_") {
            return Err(ValidationError::InvalidStripeKey);
        }
        if let Some(secret) = self.webhook_secret() {
            if !secret.expose_secret().starts_with("whsec_") {
                return Err(ValidationError::InvalidStripeWebhookSecret);
            }
        }

        let base_url = &self.stripe_api_base_url;
        if !base_url.starts_with("https://") && !base_url.starts_with("http://") {
            return Err(ValidationError::InvalidStripeBaseUrl);
        }
        if *environment == Environment::Production && !base_url.starts_with("https://") {
            return Err(ValidationError::StripeBaseUrlMustBeHttps);
        }

        Ok(())
    }
}

fn default_stripe_api_base_url() -> String {
    crate::adapters::stripe::DEFAULT_API_BASE_URL.to_string()
}

fn default_stripe_api_version() -> String {
    crate::adapters::stripe::DEFAULT_API_VERSION.to_string()
}
