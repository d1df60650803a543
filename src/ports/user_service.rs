//! User service port.
//!
//! The remote user-record service owns user identities. The relay only ever
//! flips their premium flag.

use async_trait::async_trait;
use thiserror::Error;

/// Port for the remote user-record service.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Set the premium flag on a user record.
    ///
    /// Called once per qualifying event and never retried.
    async fn set_premium(&self, user_id: &str, is_premium: bool) -> Result<(), UserServiceError>;
}

/// Errors from user service calls.
#[derive(Debug, Error)]
pub enum UserServiceError {
    /// The request never produced a response.
    #[error("user service request failed: {0}")]
    Request(String),

    /// The service answered with a non-success status.
    #[error("user service returned status {status}")]
    UnexpectedStatus { status: u16 },

    /// The response body could not be read.
    #[error("user service response could not be decoded: {0}")]
    Decode(String),
}
