//! HTTP adapters - REST API implementations.
//!
//! The relay exposes one signed webhook endpoint plus a liveness probe.

pub mod health;
pub mod webhook;

use axum::{routing::get, Router};

pub use health::health;
pub use webhook::{subscription_router, WebhookAppState};

/// Builds the full application router.
///
/// # Routes
///
/// - `GET /health`
/// - `POST /api/subscription/webhook`
pub fn app_router(state: WebhookAppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", subscription_router())
        .with_state(state)
}
