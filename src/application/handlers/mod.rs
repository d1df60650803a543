//! Application handlers.
//!
//! Command handlers that orchestrate domain operations across ports.

pub mod subscription;

pub use subscription::{
    HandleWebhookCommand, HandleWebhookHandler, SideEffect, SideEffectFailure, WebhookAction,
    WebhookOutcome,
};
