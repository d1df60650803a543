//! Webhook error types for Stripe webhook handling.
//!
//! Two layers: `SignatureError` describes why a delivery failed
//! authentication, using the wording Stripe's own libraries report.
//! `WebhookError` is what escapes the dispatcher and decides the HTTP
//! response.

use axum::http::StatusCode;
use thiserror::Error;

/// Reasons a Stripe-Signature check can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("No stripe-signature header value was provided.")]
    MissingHeader,

    #[error("Unable to extract timestamp and signatures from header")]
    MalformedHeader,

    #[error("No signatures found with expected scheme")]
    NoExpectedScheme,

    #[error("No signatures found matching the expected signature for payload. Are you passing the raw request body you received from Stripe?")]
    NoMatchingSignature,

    #[error("Timestamp outside the tolerance zone")]
    TimestampOutsideTolerance,

    /// Signature matched but the body is not a Stripe event.
    #[error("{0}")]
    InvalidPayload(String),
}

/// Errors that escape webhook processing and shape the response.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// No signing secret is configured for this deployment.
    #[error("Webhook secret not configured")]
    SecretNotConfigured,

    /// Signature check or envelope construction failed; holds the cause.
    #[error("Webhook Error: {0}")]
    Verification(String),

    /// A recognised event carried a data object of the wrong shape.
    #[error("Malformed {event_type} snapshot: {reason}")]
    MalformedSnapshot { event_type: String, reason: String },
}

impl WebhookError {
    pub fn malformed_snapshot(event_type: impl Into<String>, reason: impl ToString) -> Self {
        WebhookError::MalformedSnapshot {
            event_type: event_type.into(),
            reason: reason.to_string(),
        }
    }

    /// Maps the error to an HTTP status code.
    ///
    /// Stripe retries 5xx deliveries and gives up on 4xx.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::SecretNotConfigured | WebhookError::Verification(_) => {
                StatusCode::BAD_REQUEST
            }
            WebhookError::MalformedSnapshot { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to the caller.
    ///
    /// Snapshot decode details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            WebhookError::MalformedSnapshot { .. } => "Webhook processing failed".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_not_configured_is_bad_request() {
        let err = WebhookError::SecretNotConfigured;
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "Webhook secret not configured");
    }

    #[test]
    fn verification_prefixes_cause() {
        let err = WebhookError::Verification(SignatureError::TimestampOutsideTolerance.to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.public_message(),
            "Webhook Error: Timestamp outside the tolerance zone"
        );
    }

    #[test]
    fn malformed_snapshot_hides_details() {
        let err = WebhookError::malformed_snapshot("customer.subscription.updated", "missing field `id`");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Webhook processing failed");
        assert!(err.to_string().contains("missing field `id`"));
    }

    #[test]
    fn signature_errors_use_stripe_wording() {
        assert_eq!(
            SignatureError::MalformedHeader.to_string(),
            "Unable to extract timestamp and signatures from header"
        );
        assert!(SignatureError::NoMatchingSignature
            .to_string()
            .starts_with("No signatures found matching the expected signature for payload"));
    }
}
