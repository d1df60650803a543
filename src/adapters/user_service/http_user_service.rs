//! HTTP adapter for the remote user-record service.
//!
//! Sends `PUT {base_url}/users/{id}` with `{"isPremium": bool}`. When a
//! premium usage bonus is configured, granting premium first reads the
//! user's current `aiUsageCount` and raises it by the bonus.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ports::{UserService, UserServiceError};

/// Default base URL of the user service.
pub const DEFAULT_USER_SERVICE_URL: &str = "http://localhost:3004/api";

/// Configuration for the HTTP user service client.
#[derive(Debug, Clone)]
pub struct HttpUserServiceConfig {
    base_url: String,
    premium_usage_bonus: Option<u32>,
}

impl HttpUserServiceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            premium_usage_bonus: None,
        }
    }

    /// Credit this many usage units whenever premium is granted.
    pub fn with_premium_usage_bonus(mut self, bonus: Option<u32>) -> Self {
        self.premium_usage_bonus = bonus;
        self
    }
}

impl Default for HttpUserServiceConfig {
    fn default() -> Self {
        Self::new(DEFAULT_USER_SERVICE_URL)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PremiumUpdate {
    is_premium: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    ai_usage_count: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct UserEnvelope {
    #[serde(default)]
    user: Option<UserBody>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserBody {
    #[serde(default)]
    ai_usage_count: Option<u64>,
}

/// `UserService` over HTTP.
pub struct HttpUserService {
    config: HttpUserServiceConfig,
    http_client: reqwest::Client,
}

impl HttpUserService {
    pub fn new(config: HttpUserServiceConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    /// `{base_url}/users/{user_id}` with the ID as one escaped path segment.
    fn user_url(&self, user_id: &str) -> Result<reqwest::Url, UserServiceError> {
        if matches!(user_id, "" | "." | "..") {
            return Err(UserServiceError::Request(format!(
                "invalid user id {:?}",
                user_id
            )));
        }

        let mut url = reqwest::Url::parse(&self.config.base_url)
            .map_err(|e| UserServiceError::Request(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| {
                UserServiceError::Request(format!("{} cannot be a base URL", self.config.base_url))
            })?
            .pop_if_empty()
            .push("users")
            .push(user_id);
        Ok(url)
    }

    async fn current_usage_count(&self, user_id: &str) -> Result<u64, UserServiceError> {
        let response = self
            .http_client
            .get(self.user_url(user_id)?)
            .send()
            .await
            .map_err(|e| UserServiceError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(UserServiceError::UnexpectedStatus {
                status: response.status().as_u16(),
            });
        }

        let envelope: UserEnvelope = response
            .json()
            .await
            .map_err(|e| UserServiceError::Decode(e.to_string()))?;

        Ok(envelope
            .user
            .and_then(|u| u.ai_usage_count)
            .unwrap_or_default())
    }
}

#[async_trait]
impl UserService for HttpUserService {
    async fn set_premium(&self, user_id: &str, is_premium: bool) -> Result<(), UserServiceError> {
        let ai_usage_count = match (is_premium, self.config.premium_usage_bonus) {
            (true, Some(bonus)) => {
                let current = self.current_usage_count(user_id).await?;
                Some(current.saturating_add(u64::from(bonus)))
            }
            _ => None,
        };

        let body = PremiumUpdate {
            is_premium,
            ai_usage_count,
        };

        let response = self
            .http_client
            .put(self.user_url(user_id)?)
            .json(&body)
            .send()
            .await
            .map_err(|e| UserServiceError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(UserServiceError::UnexpectedStatus {
                status: response.status().as_u16(),
            });
        }

        tracing::debug!(user_id, is_premium, "Premium flag updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn service_for(server: &mockito::ServerGuard, bonus: Option<u32>) -> HttpUserService {
        let config = HttpUserServiceConfig::new(format!("{}/api", server.url()))
            .with_premium_usage_bonus(bonus);
        HttpUserService::new(config)
    }

    #[tokio::test]
    async fn grants_premium_with_plain_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/api/users/user_1")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({ "isPremium": true })))
            .with_status(200)
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;

        service_for(&server, None)
            .set_premium("user_1", true)
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn revokes_premium() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/api/users/user_1")
            .match_body(Matcher::Json(json!({ "isPremium": false })))
            .with_status(204)
            .create_async()
            .await;

        service_for(&server, None)
            .set_premium("user_1", false)
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("PUT", "/api/users/ghost")
            .with_status(404)
            .create_async()
            .await;

        let err = service_for(&server, None)
            .set_premium("ghost", true)
            .await
            .unwrap_err();

        assert!(matches!(err, UserServiceError::UnexpectedStatus { status: 404 }));
    }

    #[tokio::test]
    async fn unreachable_service_is_a_request_error() {
        let service = HttpUserService::new(HttpUserServiceConfig::new("http://127.0.0.1:1/api"));

        let err = service.set_premium("user_1", true).await.unwrap_err();

        assert!(matches!(err, UserServiceError::Request(_)));
    }

    #[tokio::test]
    async fn usage_bonus_is_added_when_granting() {
        let mut server = mockito::Server::new_async().await;
        let get = server
            .mock("GET", "/api/users/user_1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"user":{"_id":"user_1","aiUsageCount":5}}"#)
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/api/users/user_1")
            .match_body(Matcher::Json(json!({ "isPremium": true, "aiUsageCount": 25 })))
            .with_status(200)
            .create_async()
            .await;

        service_for(&server, Some(20))
            .set_premium("user_1", true)
            .await
            .unwrap();

        get.assert_async().await;
        put.assert_async().await;
    }

    #[tokio::test]
    async fn usage_bonus_defaults_missing_count_to_zero() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/users/user_1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"user":{}}"#)
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/api/users/user_1")
            .match_body(Matcher::Json(json!({ "isPremium": true, "aiUsageCount": 20 })))
            .with_status(200)
            .create_async()
            .await;

        service_for(&server, Some(20))
            .set_premium("user_1", true)
            .await
            .unwrap();

        put.assert_async().await;
    }

    #[tokio::test]
    async fn usage_bonus_saturates_at_counter_max() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/users/user_1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "user": { "aiUsageCount": u64::MAX } }).to_string())
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/api/users/user_1")
            .match_body(Matcher::Json(json!({ "isPremium": true, "aiUsageCount": u64::MAX })))
            .with_status(200)
            .create_async()
            .await;

        service_for(&server, Some(20))
            .set_premium("user_1", true)
            .await
            .unwrap();

        put.assert_async().await;
    }

    #[test]
    fn user_url_escapes_id_as_single_segment() {
        let service = HttpUserService::new(HttpUserServiceConfig::new("http://localhost:3004/api"));

        let url = service.user_url("a/b?c#d").unwrap();

        assert_eq!(url.as_str(), "http://localhost:3004/api/users/a%2Fb%3Fc%23d");
        assert_eq!(url.path_segments().unwrap().count(), 3);
    }

    #[test]
    fn user_url_handles_root_base() {
        let service = HttpUserService::new(HttpUserServiceConfig::new("http://localhost:3004/"));

        let url = service.user_url("user_1").unwrap();

        assert_eq!(url.as_str(), "http://localhost:3004/users/user_1");
    }

    #[tokio::test]
    async fn dot_segment_ids_are_rejected_without_a_request() {
        let mut server = mockito::Server::new_async().await;
        let any = server
            .mock("PUT", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        for id in ["..", "."] {
            let err = service_for(&server, None)
                .set_premium(id, true)
                .await
                .unwrap_err();
            assert!(matches!(err, UserServiceError::Request(_)));
        }

        any.assert_async().await;
    }

    #[tokio::test]
    async fn usage_bonus_never_touches_revocation() {
        let mut server = mockito::Server::new_async().await;
        let get = server
            .mock("GET", "/api/users/user_1")
            .expect(0)
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/api/users/user_1")
            .match_body(Matcher::Json(json!({ "isPremium": false })))
            .with_status(200)
            .create_async()
            .await;

        service_for(&server, Some(20))
            .set_premium("user_1", false)
            .await
            .unwrap();

        get.assert_async().await;
        put.assert_async().await;
    }
}
