//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `http` - Axum routes for the webhook endpoint
//! - `stripe` - Stripe API client and a test double
//! - `user_service` - Premium flag updates on the user service
//! - `postgres` - Subscription ledger in PostgreSQL
//! - `memory` - In-memory ledger for tests and database-less runs

pub mod http;
pub mod memory;
pub mod postgres;
pub mod stripe;
pub mod user_service;

pub use http::{app_router, WebhookAppState};
pub use memory::InMemorySubscriptionRepository;
pub use postgres::PostgresSubscriptionRepository;
pub use stripe::{MockPaymentProvider, StripeConfig, StripePaymentAdapter};
pub use user_service::{HttpUserService, HttpUserServiceConfig, InMemoryUserService};
