//! Bounded retry with exponential backoff for provider requests.
//!
//! Only transport failures (timeouts, refused connections, other transport errors)
//! are retried. HTTP error statuses are final for the attempt that produced them.

use std::future::Future;
use std::time::Duration;

use crate::error::ClientError;

pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts are `max_retries + 1`.
    pub max_retries: u32,
    /// Wait before retry `n` (counting from 0) is `base_delay * 2^n`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Run `operation` until it succeeds, fails with a non-transport error,
    /// or the retry budget is spent.
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, ClientError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let mut attempt = 0;
        loop {
            tracing::info!(endpoint = label, attempt = attempt + 1, "sending request");

            match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        tracing::info!(endpoint = label, "request succeeded after {attempt} retries");
                    }
                    return Ok(value);
                }
                Err(err) if err.is_transport() && attempt < self.max_retries => {
                    let delay = self.delay_for_attempt(attempt);
                    tracing::warn!(
                        endpoint = label,
                        attempt = attempt + 1,
                        error = %err,
                        "transport failure, retrying in {delay:?}"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    if err.is_transport() {
                        tracing::error!(
                            endpoint = label,
                            "all {} attempts failed: {err}",
                            self.max_retries + 1
                        );
                    }
                    return Err(err);
                }
            }
        }
    }
}
