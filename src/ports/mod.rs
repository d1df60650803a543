//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `PaymentProvider` - Webhook verification and subscription retrieval
//! - `UserService` - Premium flag on the remote user record
//! - `SubscriptionRepository` - Local subscription ledger

mod payment_provider;
mod subscription_repository;
mod user_service;

pub use payment_provider::{PaymentError, PaymentErrorCode, PaymentProvider};
pub use subscription_repository::SubscriptionRepository;
pub use user_service::{UserService, UserServiceError};
