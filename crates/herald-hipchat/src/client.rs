//! HipChat room-message client
//!
//! Posts notifications to the v1 room message API. Transient failures are
//! retried with exponential backoff; anything else is reported right away.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use herald_core::{ChatError, ChatResult, ChatService, Color};

use crate::config::HipChatConfig;
use crate::retry::{with_backoff, RetryPolicy};

/// Body returned by the API on success.
#[derive(Debug, Deserialize)]
struct SendResponse {
    status: String,
}

/// `ChatService` backed by the HipChat HTTP API.
pub struct HipChatClient {
    config: HipChatConfig,
    http_client: reqwest::Client,
}

impl HipChatClient {
    /// Create a client; fails when the token or room is missing.
    pub fn new(config: HipChatConfig) -> ChatResult<Self> {
        if config.auth_token.trim().is_empty() {
            return Err(ChatError::Config("auth token is empty".to_string()));
        }
        if config.room.trim().is_empty() {
            return Err(ChatError::Config("room is empty".to_string()));
        }

        let http_client = reqwest::Client::builder()
            .user_agent(concat!("herald-hipchat/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ChatError::Http(e.to_string()))?;

        Ok(HipChatClient {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &HipChatConfig {
        &self.config
    }

    /// Form fields for one message.
    pub fn message_form(&self, message: &str, color: Color) -> Vec<(&'static str, String)> {
        vec![
            ("room_id", self.config.room.clone()),
            ("from", self.config.sender_name()),
            ("message", message.to_string()),
            ("message_format", "text".to_string()),
            ("color", color.as_str().to_string()),
            (
                "notify",
                if self.config.notify_room { "1" } else { "0" }.to_string(),
            ),
        ]
    }

    /// A single POST without retries.
    async fn send_once(&self, form: &[(&'static str, String)]) -> ChatResult<()> {
        let response = self
            .http_client
            .post(self.config.message_endpoint())
            .query(&self.config.message_query())
            .form(form)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(ChatError::Status {
                code: status.as_u16(),
                body,
            });
        }

        match serde_json::from_str::<SendResponse>(&body) {
            Ok(parsed) => debug!(status = %parsed.status, "Room message accepted"),
            Err(_) => debug!(body = %body, "Room message accepted with unexpected body"),
        }
        Ok(())
    }
}

/// The request url carries the auth token, so it is stripped from errors.
fn transport_error(err: reqwest::Error) -> ChatError {
    ChatError::Http(err.without_url().to_string())
}

#[async_trait]
impl ChatService for HipChatClient {
    async fn publish(&self, message: &str, color: Color) -> ChatResult<()> {
        let form = self.message_form(message, color);
        let policy = RetryPolicy::new(self.config.max_retries, self.config.backoff_base_ms);

        let attempts = with_backoff(policy, || self.send_once(&form)).await?;
        info!(room = %self.config.room, color = %color, attempts, "Posted to HipChat");
        Ok(())
    }
}
