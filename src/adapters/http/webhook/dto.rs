//! HTTP DTOs for the webhook endpoint.
//!
//! Bodies are kept exactly as Stripe-facing clients expect them:
//! `{"received": true}` on success and `{"error": "..."}` otherwise.

use serde::{Deserialize, Serialize};

/// Acknowledgement returned for every authenticated delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookAckResponse {
    pub received: bool,
}

impl WebhookAckResponse {
    pub fn received() -> Self {
        Self { received: true }
    }
}

/// Error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ack_serializes_as_received_true() {
        let json = serde_json::to_string(&WebhookAckResponse::received()).unwrap();
        assert_eq!(json, r#"{"received":true}"#);
    }

    #[test]
    fn error_serializes_with_single_field() {
        let json = serde_json::to_string(&ErrorResponse::new("Webhook secret not configured")).unwrap();
        assert_eq!(json, r#"{"error":"Webhook secret not configured"}"#);
    }
}
