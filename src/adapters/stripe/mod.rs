//! Stripe payment provider adapter.
//!
//! Implements the `PaymentProvider` port for Stripe:
//! - Webhook signature verification (local, HMAC-SHA256)
//! - Subscription retrieval over the REST API
//!
//! The API key is held as `secrecy::SecretString`. The webhook secret is not
//! part of the adapter; callers pass it per verification.

mod mock_payment_provider;
mod stripe_adapter;

pub use mock_payment_provider::{MethodCall, MockPaymentProvider};
pub use stripe_adapter::{
    StripeConfig, StripePaymentAdapter, DEFAULT_API_BASE_URL, DEFAULT_API_VERSION,
};
