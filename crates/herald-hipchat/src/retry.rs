//! Retry with exponential backoff for outbound publishes.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use herald_core::{ChatError, ChatResult};

/// How often and how patiently to retry a failed publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one (0 = run once).
    pub max_retries: u32,
    /// Delay before the first retry; doubles on every further retry.
    pub backoff_base_ms: u64,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_base_ms: u64) -> Self {
        Self {
            max_retries,
            backoff_base_ms,
        }
    }

    /// Delay after failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.backoff_base_ms.saturating_mul(factor))
    }
}

/// Run `op` until it succeeds, fails permanently, or retries run out.
///
/// Only errors for which [`ChatError::is_transient`] holds are retried.
/// Returns the number of attempts used on success.
pub async fn with_backoff<F, Fut>(policy: RetryPolicy, op: F) -> ChatResult<u32>
where
    F: Fn() -> Fut,
    Fut: Future<Output = ChatResult<()>>,
{
    let max_attempts = policy.max_retries.saturating_add(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(()) => return Ok(attempt),
            Err(err) if !err.is_transient() => return Err(err),
            Err(err) if attempt >= max_attempts => {
                return Err(if max_attempts == 1 {
                    err
                } else {
                    ChatError::RetriesExhausted {
                        attempts: attempt,
                        last: err.to_string(),
                    }
                });
            }
            Err(err) => {
                let delay = policy.delay_for(attempt);
                warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Publish failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
