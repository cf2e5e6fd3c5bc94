//! HipChat sink configuration

use serde::{Deserialize, Serialize};

use herald_core::{DeliveryConfig, NotifierConfig};

/// Public HipChat API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.hipchat.com";

/// The room API rejects sender names longer than this.
pub const MAX_SENDER_LEN: usize = 15;

/// Settings for [`crate::HipChatClient`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HipChatConfig {
    /// API base url, without trailing slash.
    pub api_url: String,
    pub auth_token: String,
    /// Room name or id.
    pub room: String,
    pub send_as: String,
    /// Whether room members get a notification for the message.
    pub notify_room: bool,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl HipChatConfig {
    /// Create config for a room with default delivery settings.
    pub fn new(auth_token: &str, room: &str) -> Self {
        let delivery = DeliveryConfig::default();
        HipChatConfig {
            api_url: DEFAULT_API_URL.to_string(),
            auth_token: auth_token.to_string(),
            room: room.to_string(),
            send_as: herald_core::config::DEFAULT_SEND_AS.to_string(),
            notify_room: delivery.notify_room,
            timeout_ms: delivery.timeout_ms,
            max_retries: delivery.max_retries,
            backoff_base_ms: delivery.backoff_base_ms,
        }
    }

    /// Build from the resolved notifier settings and delivery tuning.
    pub fn from_notifier(notifier: &NotifierConfig, delivery: &DeliveryConfig) -> Self {
        let api_url = delivery
            .api_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(DEFAULT_API_URL)
            .trim_end_matches('/')
            .to_string();

        HipChatConfig {
            api_url,
            auth_token: notifier.auth_token.clone(),
            room: notifier.room.clone(),
            send_as: notifier.send_as.clone(),
            notify_room: delivery.notify_room,
            timeout_ms: delivery.timeout_ms,
            max_retries: delivery.max_retries,
            backoff_base_ms: delivery.backoff_base_ms,
        }
    }

    /// Set the API base url.
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    /// Set retry behaviour.
    pub fn with_retries(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Sender name cut to the length the API accepts.
    pub fn sender_name(&self) -> String {
        self.send_as.chars().take(MAX_SENDER_LEN).collect()
    }

    /// Url of the room message endpoint. The token goes in the query.
    pub fn message_endpoint(&self) -> String {
        format!("{}/v1/rooms/message", self.api_url)
    }

    /// Query parameters sent with every message.
    pub fn message_query(&self) -> [(&'static str, &str); 2] {
        [("format", "json"), ("auth_token", self.auth_token.as_str())]
    }
}
