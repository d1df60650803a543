//! Stripe payment provider adapter.
//!
//! Implements the `PaymentProvider` trait against the Stripe REST API.
//! Signature verification happens locally; only subscription retrieval
//! goes over the network.
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeConfig::new(api_key).with_base_url("http://localhost:12111");
//! let adapter = StripePaymentAdapter::new(config);
//! ```

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::webhook::{StripeEvent, StripeSubscription, StripeWebhookVerifier};
use crate::ports::{PaymentError, PaymentErrorCode, PaymentProvider};

/// Default Stripe API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";

/// API version pinned on every request.
pub const DEFAULT_API_VERSION: &str = "2023-10-16";

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Base URL for Stripe API.
    api_base_url: String,

    /// Value sent in the `Stripe-Version` header.
    api_version: String,
}

impl StripeConfig {
    /// Create a new Stripe configuration.
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }
}

/// Error body returned by the Stripe API.
#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeErrorBody,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

/// Stripe payment provider adapter.
pub struct StripePaymentAdapter {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripePaymentAdapter {
    /// Create a new Stripe adapter with the given configuration.
    pub fn new(config: StripeConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    /// `{base}/v1/subscriptions/{id}` with the ID as one escaped path segment.
    fn subscription_url(&self, subscription_id: &str) -> Result<reqwest::Url, PaymentError> {
        if matches!(subscription_id, "" | "." | "..") {
            return Err(PaymentError::provider(format!(
                "Invalid subscription id {:?}",
                subscription_id
            )));
        }

        let mut url = reqwest::Url::parse(&self.config.api_base_url)
            .map_err(|e| PaymentError::provider(format!("Invalid Stripe API base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| PaymentError::provider("Invalid Stripe API base URL"))?
            .pop_if_empty()
            .push("v1")
            .push("subscriptions")
            .push(subscription_id);
        Ok(url)
    }

    async fn error_from_response(response: reqwest::Response) -> PaymentError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<StripeErrorResponse>(&body).ok();

        let message = parsed
            .as_ref()
            .and_then(|r| r.error.message.clone())
            .unwrap_or_else(|| format!("Stripe API error ({})", status.as_u16()));

        let code = match status {
            reqwest::StatusCode::NOT_FOUND => PaymentErrorCode::NotFound,
            reqwest::StatusCode::UNAUTHORIZED => PaymentErrorCode::AuthenticationError,
            reqwest::StatusCode::TOO_MANY_REQUESTS => PaymentErrorCode::RateLimitExceeded,
            _ => PaymentErrorCode::ProviderError,
        };

        let error = PaymentError::new(code, message);
        match parsed.and_then(|r| r.error.code) {
            Some(provider_code) => error.with_provider_code(provider_code),
            None => error,
        }
    }
}

#[async_trait]
impl PaymentProvider for StripePaymentAdapter {
    async fn verify_and_parse(
        &self,
        payload: &[u8],
        signature: &str,
        secret: &str,
    ) -> Result<StripeEvent, PaymentError> {
        StripeWebhookVerifier::new(secret)
            .verify_and_parse(payload, signature)
            .map_err(|e| {
                tracing::warn!(error = %e, "Stripe webhook verification failed");
                PaymentError::invalid_webhook(e.to_string())
            })
    }

    async fn retrieve_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<StripeSubscription, PaymentError> {
        let url = self.subscription_url(subscription_id)?;

        let response = self
            .http_client
            .get(url)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .header("Stripe-Version", self.config.api_version.as_str())
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        response.json::<StripeSubscription>().await.map_err(|e| {
            PaymentError::provider(format!("Failed to parse Stripe response: {}", e))
        })
    }
}
