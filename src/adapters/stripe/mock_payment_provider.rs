//! Mock payment provider for testing.
//!
//! Provides a configurable mock implementation of `PaymentProvider` for unit
//! and integration tests. Supports:
//! - Pre-configured subscriptions for retrieval
//! - Error injection
//! - Call tracking
//! - Real or bypassed signature verification

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::webhook::{
    SignatureError, StripeEvent, StripeSubscription, StripeWebhookVerifier,
};
use crate::ports::{PaymentError, PaymentProvider};

/// Mock payment provider for testing.
///
/// # Example
///
/// ```ignore
/// let mock = MockPaymentProvider::new();
/// mock.add_subscription(subscription);
/// mock.set_method_error("retrieve_subscription", PaymentError::network("down"));
/// ```
#[derive(Default)]
pub struct MockPaymentProvider {
    /// Inner state (thread-safe for async tests).
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    /// Subscriptions served by `retrieve_subscription`.
    subscriptions: HashMap<String, StripeSubscription>,

    /// Error to return on next call.
    next_error: Option<PaymentError>,

    /// Specific errors by method name.
    method_errors: HashMap<String, PaymentError>,

    /// Track method calls for assertions.
    call_log: Vec<MethodCall>,

    webhook_verify_mode: WebhookVerifyMode,
}

/// Recorded method call for assertions.
#[derive(Debug, Clone)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

/// How to handle webhook verification.
#[derive(Default, Clone)]
enum WebhookVerifyMode {
    /// Skip the signature and parse the payload as an event.
    #[default]
    AcceptAll,

    /// Run the real Stripe signature check with the supplied secret.
    Verify,

    /// Always fail verification.
    AlwaysFail,
}

impl MockPaymentProvider {
    /// Create a new mock provider with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that fails all webhook verifications.
    pub fn rejecting_webhooks() -> Self {
        let mock = Self::new();
        mock.inner.lock().unwrap().webhook_verify_mode = WebhookVerifyMode::AlwaysFail;
        mock
    }

    /// Create a mock that checks signatures exactly like the Stripe adapter.
    pub fn verifying_signatures() -> Self {
        let mock = Self::new();
        mock.inner.lock().unwrap().webhook_verify_mode = WebhookVerifyMode::Verify;
        mock
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Add a subscription to the "database".
    pub fn add_subscription(&self, subscription: StripeSubscription) {
        let id = subscription.id.clone();
        self.inner
            .lock()
            .unwrap()
            .subscriptions
            .insert(id, subscription);
    }

    /// Set an error to return on the next call to any method.
    pub fn set_error(&self, error: PaymentError) {
        self.inner.lock().unwrap().next_error = Some(error);
    }

    /// Set an error for a specific method.
    pub fn set_method_error(&self, method: &str, error: PaymentError) {
        self.inner
            .lock()
            .unwrap()
            .method_errors
            .insert(method.to_string(), error);
    }

    /// Clear all configured errors.
    pub fn clear_errors(&self) {
        let mut state = self.inner.lock().unwrap();
        state.next_error = None;
        state.method_errors.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Call Tracking
    // ════════════════════════════════════════════════════════════════════════════

    /// Get all recorded method calls.
    pub fn calls(&self) -> Vec<MethodCall> {
        self.inner.lock().unwrap().call_log.clone()
    }

    /// Check if a method was called.
    pub fn was_called(&self, method: &str) -> bool {
        self.call_count(method) > 0
    }

    /// Get count of calls to a method.
    pub fn call_count(&self, method: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    /// Clear the call log.
    pub fn clear_calls(&self) {
        self.inner.lock().unwrap().call_log.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn record_call(&self, method: &str, args: Vec<String>) {
        self.inner.lock().unwrap().call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });
    }

    fn check_error(&self, method: &str) -> Result<(), PaymentError> {
        let mut state = self.inner.lock().unwrap();

        if let Some(error) = state.method_errors.get(method) {
            return Err(error.clone());
        }

        // Global error is consumed by the first call.
        if let Some(error) = state.next_error.take() {
            return Err(error);
        }

        Ok(())
    }
}

impl Clone for MockPaymentProvider {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn verify_and_parse(
        &self,
        payload: &[u8],
        signature: &str,
        secret: &str,
    ) -> Result<StripeEvent, PaymentError> {
        self.record_call(
            "verify_and_parse",
            vec![
                String::from_utf8_lossy(payload).chars().take(50).collect(),
                signature.chars().take(20).collect(),
            ],
        );
        self.check_error("verify_and_parse")?;

        let mode = self.inner.lock().unwrap().webhook_verify_mode.clone();
        match mode {
            WebhookVerifyMode::AcceptAll => serde_json::from_slice(payload)
                .map_err(|e| PaymentError::invalid_webhook(e.to_string())),
            WebhookVerifyMode::Verify => StripeWebhookVerifier::new(secret)
                .verify_and_parse(payload, signature)
                .map_err(|e| PaymentError::invalid_webhook(e.to_string())),
            WebhookVerifyMode::AlwaysFail => Err(PaymentError::invalid_webhook(
                SignatureError::NoMatchingSignature.to_string(),
            )),
        }
    }

    async fn retrieve_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<StripeSubscription, PaymentError> {
        self.record_call("retrieve_subscription", vec![subscription_id.to_string()]);
        self.check_error("retrieve_subscription")?;

        self.inner
            .lock()
            .unwrap()
            .subscriptions
            .get(subscription_id)
            .cloned()
            .ok_or_else(|| PaymentError::not_found("Subscription"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::subscription::SubscriptionStatus;
    use crate::domain::webhook::generate_test_header;
    use crate::ports::PaymentErrorCode;

    const PAYLOAD: &[u8] = br#"{"id":"evt_mock","type":"invoice.payment_failed","data":{"object":{"id":"in_1"}}}"#;

    fn subscription(id: &str) -> StripeSubscription {
        serde_json::from_value(serde_json::json!({ "id": id, "status": "active" })).unwrap()
    }

    #[tokio::test]
    async fn accept_all_parses_payload_without_signature() {
        let mock = MockPaymentProvider::new();

        let event = mock.verify_and_parse(PAYLOAD, "", "whsec_x").await.unwrap();

        assert_eq!(event.id, "evt_mock");
        assert_eq!(mock.call_count("verify_and_parse"), 1);
    }

    #[tokio::test]
    async fn rejecting_webhooks_fails_verification() {
        let mock = MockPaymentProvider::rejecting_webhooks();

        let err = mock
            .verify_and_parse(PAYLOAD, "t=1,v1=aa", "whsec_x")
            .await
            .unwrap_err();

        assert_eq!(err.code, PaymentErrorCode::InvalidWebhook);
        assert!(err
            .to_string()
            .starts_with("No signatures found matching the expected signature"));
    }

    #[tokio::test]
    async fn verifying_signatures_uses_supplied_secret() {
        let mock = MockPaymentProvider::verifying_signatures();
        let header = generate_test_header("whsec_right", chrono::Utc::now().timestamp(), PAYLOAD);

        assert!(mock.verify_and_parse(PAYLOAD, &header, "whsec_right").await.is_ok());
        assert!(mock.verify_and_parse(PAYLOAD, &header, "whsec_wrong").await.is_err());
    }

    #[tokio::test]
    async fn retrieve_subscription_returns_added() {
        let mock = MockPaymentProvider::new();
        mock.add_subscription(subscription("sub_1"));

        let sub = mock.retrieve_subscription("sub_1").await.unwrap();

        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert_eq!(mock.calls()[0].args, vec!["sub_1".to_string()]);
    }

    #[tokio::test]
    async fn retrieve_unknown_subscription_is_not_found() {
        let mock = MockPaymentProvider::new();

        let err = mock.retrieve_subscription("sub_missing").await.unwrap_err();

        assert_eq!(err.code, PaymentErrorCode::NotFound);
    }

    #[tokio::test]
    async fn set_method_error_only_affects_method() {
        let mock = MockPaymentProvider::new();
        mock.add_subscription(subscription("sub_1"));
        mock.set_method_error("retrieve_subscription", PaymentError::network("down"));

        assert!(mock.retrieve_subscription("sub_1").await.is_err());
        assert!(mock.verify_and_parse(PAYLOAD, "", "whsec_x").await.is_ok());

        mock.clear_errors();
        assert!(mock.retrieve_subscription("sub_1").await.is_ok());
    }

    #[tokio::test]
    async fn set_error_is_consumed_once() {
        let mock = MockPaymentProvider::new();
        mock.set_error(PaymentError::network("blip"));

        assert!(mock.verify_and_parse(PAYLOAD, "", "whsec_x").await.is_err());
        assert!(mock.verify_and_parse(PAYLOAD, "", "whsec_x").await.is_ok());
    }

    #[tokio::test]
    async fn clones_share_state() {
        let mock = MockPaymentProvider::new();
        let clone = mock.clone();

        let _ = clone.retrieve_subscription("sub_1").await;

        assert!(mock.was_called("retrieve_subscription"));
        mock.clear_calls();
        assert!(!clone.was_called("retrieve_subscription"));
    }
}
