//! Axum router configuration for webhook endpoints.

use axum::{routing::post, Router};

use super::handlers::{handle_stripe_webhook, WebhookAppState};

/// Creates the webhook router.
///
/// # Routes
///
/// - `POST /webhook` - Stripe event delivery (signed, raw body)
pub fn webhook_routes() -> Router<WebhookAppState> {
    Router::new().route("/webhook", post(handle_stripe_webhook))
}

/// Creates the subscription router, mounted under `/subscription`.
pub fn subscription_router() -> Router<WebhookAppState> {
    Router::new().nest("/subscription", webhook_routes())
}
