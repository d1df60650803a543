//! Webhook HTTP adapter.
//!
//! Exposes the Stripe delivery endpoint and maps handler outcomes to the
//! `{"received": true}` / `{"error": ...}` bodies.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::{ErrorResponse, WebhookAckResponse};
pub use handlers::{handle_stripe_webhook, WebhookApiError, WebhookAppState, STRIPE_SIGNATURE_HEADER};
pub use routes::{subscription_router, webhook_routes};
