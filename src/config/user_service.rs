//! User service configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Where premium updates are sent
#[derive(Debug, Clone, Deserialize)]
pub struct UserServiceConfig {
    /// Base URL of the user service API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Usage counter bonus added when premium is granted (disabled when unset)
    pub premium_usage_bonus: Option<u32>,
}

impl UserServiceConfig {
    /// Validate user service configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidUserServiceUrl);
        }
        Ok(())
    }
}

impl Default for UserServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            premium_usage_bonus: None,
        }
    }
}

fn default_base_url() -> String {
    crate::adapters::user_service::DEFAULT_USER_SERVICE_URL.to_string()
}
