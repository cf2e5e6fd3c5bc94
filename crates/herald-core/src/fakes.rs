//! In-memory chat services for tests and dry runs
//!
//! `RecordingChatService` keeps every published message, `FailingChatService`
//! rejects every publish with a fixed status code.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::chat::{ChatError, ChatResult, ChatService};
use crate::domain::Color;

// ---------------------------------------------------------------------------
// RecordingChatService
// ---------------------------------------------------------------------------

/// Chat service that records messages instead of sending them.
#[derive(Debug, Default)]
pub struct RecordingChatService {
    published: Mutex<Vec<(String, Color)>>,
}

impl RecordingChatService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages published so far, oldest first.
    pub fn published(&self) -> Vec<(String, Color)> {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ChatService for RecordingChatService {
    async fn publish(&self, message: &str, color: Color) -> ChatResult<()> {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((message.to_string(), color));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FailingChatService
// ---------------------------------------------------------------------------

/// Chat service whose every publish fails with the given HTTP status.
#[derive(Debug)]
pub struct FailingChatService {
    code: u16,
    attempts: AtomicU32,
}

impl FailingChatService {
    pub fn new(code: u16) -> Self {
        Self {
            code,
            attempts: AtomicU32::new(0),
        }
    }

    /// Number of publish calls received.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ChatService for FailingChatService {
    async fn publish(&self, _message: &str, _color: Color) -> ChatResult<()> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        Err(ChatError::Status {
            code: self.code,
            body: "simulated failure".to_string(),
        })
    }
}
