//! Subscription webhook handlers.

mod handle_webhook;

pub use handle_webhook::{
    HandleWebhookCommand, HandleWebhookHandler, SideEffect, SideEffectFailure, WebhookAction,
    WebhookOutcome,
};
