//! HTTP handlers for the webhook endpoint.
//!
//! These handlers connect Axum routes to the application-layer webhook handler.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use secrecy::SecretString;

use crate::application::handlers::subscription::{HandleWebhookCommand, HandleWebhookHandler};
use crate::domain::webhook::WebhookError;
use crate::ports::{PaymentProvider, SubscriptionRepository, UserService};

use super::dto::{ErrorResponse, WebhookAckResponse};

/// Header carrying Stripe's signature.
pub const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for webhook routes.
///
/// Cloned per request; the handler itself is shared.
#[derive(Clone)]
pub struct WebhookAppState {
    pub webhook_handler: Arc<HandleWebhookHandler>,
}

impl WebhookAppState {
    pub fn new(
        payment_provider: Arc<dyn PaymentProvider>,
        user_service: Arc<dyn UserService>,
        repository: Arc<dyn SubscriptionRepository>,
        webhook_secret: Option<SecretString>,
    ) -> Self {
        Self {
            webhook_handler: Arc::new(HandleWebhookHandler::new(
                payment_provider,
                user_service,
                repository,
                webhook_secret,
            )),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/subscription/webhook - Handle Stripe webhook events
///
/// The body is taken as raw bytes; the signature covers them exactly.
pub async fn handle_stripe_webhook(
    State(state): State<WebhookAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAckResponse>, WebhookApiError> {
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let cmd = HandleWebhookCommand {
        payload: body.to_vec(),
        signature,
    };

    let outcome = state.webhook_handler.handle(cmd).await?;
    if !outcome.is_clean() {
        tracing::warn!(
            event_id = %outcome.event_id,
            event_type = %outcome.event_type,
            failures = outcome.failures.len(),
            "Webhook acknowledged with side-effect failures"
        );
    }

    Ok(Json(WebhookAckResponse::received()))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts webhook errors to HTTP responses.
#[derive(Debug)]
pub struct WebhookApiError(WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Webhook processing failed");
        } else {
            tracing::warn!(error = %self.0, "Webhook rejected");
        }
        (status, Json(ErrorResponse::new(self.0.public_message()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn api_error_maps_secret_not_configured_to_400() {
        let response = WebhookApiError(WebhookError::SecretNotConfigured).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn api_error_maps_verification_to_400() {
        let response =
            WebhookApiError(WebhookError::Verification("bad".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn api_error_maps_malformed_snapshot_to_500() {
        let response =
            WebhookApiError(WebhookError::malformed_snapshot("invoice.payment_failed", "oops"))
                .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
