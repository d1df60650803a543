//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresSubscriptionRepository` - subscription ledger on `subscriptions`

mod subscription_repository;

pub use subscription_repository::PostgresSubscriptionRepository;
