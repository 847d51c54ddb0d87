//! Push notification delivery
//!
//! The mobile apps register device tokens with a push gateway; this
//! service addresses users and lets the gateway fan out to devices.

use crate::config::PushConfig;
use crate::domain::StringUuid;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// A push notification addressed to one user
#[derive(Debug, Clone, Serialize)]
pub struct PushMessage {
    pub user_id: StringUuid,
    pub title: String,
    pub body: String,
    /// The receiving app surfaces these as "needs your attention"
    pub action_required: bool,
    pub high_priority: bool,
}

impl PushMessage {
    pub fn new(user_id: StringUuid, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            user_id,
            title: title.into(),
            body: body.into(),
            action_required: false,
            high_priority: false,
        }
    }

    pub fn action_required(mut self) -> Self {
        self.action_required = true;
        self
    }

    pub fn high_priority(mut self) -> Self {
        self.high_priority = true;
        self
    }
}

/// Push provider error types
#[derive(Error, Debug)]
pub enum PushProviderError {
    #[error("Push provider not configured")]
    NotConfigured,

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Send failed: {0}")]
    SendFailed(String),
}

/// Trait for push providers
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PushProvider: Send + Sync {
    /// Deliver a push message
    async fn send(&self, message: &PushMessage) -> Result<(), PushProviderError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}

/// Gateway-backed push provider
pub struct HttpPushProvider {
    client: reqwest::Client,
    config: PushConfig,
}

impl HttpPushProvider {
    pub fn new(config: PushConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }
}

#[async_trait]
impl PushProvider for HttpPushProvider {
    async fn send(&self, message: &PushMessage) -> Result<(), PushProviderError> {
        let mut request = self
            .client
            .post(&self.config.gateway_url)
            .json(message);

        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PushProviderError::ConnectionError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PushProviderError::SendFailed(format!(
                "Gateway responded {}",
                response.status()
            )));
        }

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "http_gateway"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_message_builders() {
        let msg = PushMessage::new(StringUuid::new_v4(), "Title", "Body")
            .action_required()
            .high_priority();
        assert!(msg.action_required);
        assert!(msg.high_priority);
    }

    #[tokio::test]
    async fn test_send_posts_json_with_auth() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/push"))
            .and(header("authorization", "Bearer gateway-key"))
            .and(body_partial_json(serde_json::json!({
                "title": "Guest still present",
                "action_required": false,
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let provider = HttpPushProvider::new(PushConfig {
            gateway_url: format!("{}/push", server.uri()),
            api_key: Some("gateway-key".to_string()),
        });

        let message = PushMessage::new(
            StringUuid::new_v4(),
            "Guest still present",
            "Your cleaner reported the previous guest has not left yet.",
        );

        assert!(provider.send(&message).await.is_ok());
    }

    #[tokio::test]
    async fn test_send_surfaces_gateway_errors() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let provider = HttpPushProvider::new(PushConfig {
            gateway_url: server.uri(),
            api_key: None,
        });

        let message = PushMessage::new(StringUuid::new_v4(), "t", "b");
        let err = provider.send(&message).await.unwrap_err();
        assert!(matches!(err, PushProviderError::SendFailed(_)));
    }
}
