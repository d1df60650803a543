//! Stripe webhook domain module.
//!
//! # Module Structure
//!
//! - `stripe_event` - Event envelope and the snapshots the relay reads
//! - `webhook_verifier` - Stripe-Signature verification
//! - `webhook_errors` - Verification and processing errors

mod stripe_event;
mod webhook_errors;
mod webhook_verifier;

pub use stripe_event::{
    Expandable, ExpandedObject, StripeCheckoutSession, StripeEvent, StripeEventData,
    StripeInvoice, StripeInvoiceParent, StripeInvoiceSubscriptionDetails, StripePrice,
    StripeSubscription, StripeSubscriptionItem, StripeSubscriptionItems, WebhookEventType,
    USER_ID_METADATA_KEY,
};
pub use webhook_errors::{SignatureError, WebhookError};
pub use webhook_verifier::{
    generate_test_header, SignatureHeader, StripeWebhookVerifier, DEFAULT_TOLERANCE_SECS,
};
