//! In-memory adapters for running without external infrastructure.

mod in_memory_subscription_repository;

pub use in_memory_subscription_repository::InMemorySubscriptionRepository;
