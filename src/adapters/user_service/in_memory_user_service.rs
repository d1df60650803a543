//! In-memory user service that records premium updates.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::ports::{UserService, UserServiceError};

/// One recorded `set_premium` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PremiumUpdate {
    pub user_id: String,
    pub is_premium: bool,
}

#[derive(Default)]
struct State {
    updates: Vec<PremiumUpdate>,
    flags: HashMap<String, bool>,
    fail_with_status: Option<u16>,
}

/// Records every premium update and keeps the latest flag per user.
#[derive(Clone, Default)]
pub struct InMemoryUserService {
    state: Arc<Mutex<State>>,
}

impl InMemoryUserService {
    pub fn new() -> Self {
        Self::default()
    }

    /// A service whose every call fails with the given HTTP status.
    pub fn failing(status: u16) -> Self {
        let service = Self::new();
        service.state.lock().unwrap().fail_with_status = Some(status);
        service
    }

    /// All calls in the order they were made, including failed ones.
    pub fn updates(&self) -> Vec<PremiumUpdate> {
        self.state.lock().unwrap().updates.clone()
    }

    /// Latest successfully applied flag for a user.
    pub fn is_premium(&self, user_id: &str) -> Option<bool> {
        self.state.lock().unwrap().flags.get(user_id).copied()
    }
}

#[async_trait]
impl UserService for InMemoryUserService {
    async fn set_premium(&self, user_id: &str, is_premium: bool) -> Result<(), UserServiceError> {
        let mut state = self.state.lock().unwrap();
        state.updates.push(PremiumUpdate {
            user_id: user_id.to_string(),
            is_premium,
        });
        if let Some(status) = state.fail_with_status {
            return Err(UserServiceError::UnexpectedStatus { status });
        }
        state.flags.insert(user_id.to_string(), is_premium);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_updates_and_latest_flag() {
        let service = InMemoryUserService::new();

        service.set_premium("u1", true).await.unwrap();
        service.set_premium("u1", false).await.unwrap();

        assert_eq!(service.updates().len(), 2);
        assert_eq!(service.is_premium("u1"), Some(false));
        assert_eq!(service.is_premium("u2"), None);
    }

    #[tokio::test]
    async fn failing_service_still_records_attempt() {
        let service = InMemoryUserService::failing(503);

        let err = service.set_premium("u1", true).await.unwrap_err();

        assert!(matches!(err, UserServiceError::UnexpectedStatus { status: 503 }));
        assert_eq!(
            service.updates(),
            vec![PremiumUpdate {
                user_id: "u1".to_string(),
                is_premium: true
            }]
        );
        assert_eq!(service.is_premium("u1"), None);
    }
}
