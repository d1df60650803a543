//! User service adapters.
//!
//! - `HttpUserService` - production client for the user-record service
//! - `InMemoryUserService` - recording fake for tests and local runs

mod http_user_service;
mod in_memory_user_service;

pub use http_user_service::{HttpUserService, HttpUserServiceConfig, DEFAULT_USER_SERVICE_URL};
pub use in_memory_user_service::{InMemoryUserService, PremiumUpdate};
