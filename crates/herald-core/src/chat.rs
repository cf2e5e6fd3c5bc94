//! Outbound chat sink.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Color;

/// Errors reported by a chat service.
#[derive(Error, Debug)]
pub enum ChatError {
    /// Transport level failure (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(String),

    /// The service answered with a non-success status.
    #[error("chat service returned {code}: {body}")]
    Status { code: u16, body: String },

    /// The sink is missing required settings.
    #[error("chat service not configured: {0}")]
    Config(String),

    /// Every attempt failed.
    #[error("publish failed after {attempts} attempt(s): {last}")]
    RetriesExhausted { attempts: u32, last: String },
}

impl ChatError {
    /// Whether another attempt may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ChatError::Http(_) => true,
            ChatError::Status { code, .. } => *code == 429 || *code >= 500,
            ChatError::Config(_) | ChatError::RetriesExhausted { .. } => false,
        }
    }
}

/// Result type for chat operations
pub type ChatResult<T> = std::result::Result<T, ChatError>;

/// Destination for rendered notifications.
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Post `message` to the configured room with the given color.
    async fn publish(&self, message: &str, color: Color) -> ChatResult<()>;
}
