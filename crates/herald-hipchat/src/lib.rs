//! Herald HipChat sink
//!
//! Implements [`herald_core::ChatService`] on top of the HipChat room
//! message API, with bounded retries for transient failures.

pub mod client;
pub mod config;
pub mod retry;

pub use client::HipChatClient;
pub use config::{HipChatConfig, DEFAULT_API_URL, MAX_SENDER_LEN};
pub use retry::{with_backoff, RetryPolicy};
