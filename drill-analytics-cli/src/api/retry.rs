use anyhow::Result;
use std::time::Duration;
use tokio::time::sleep;

use super::error::ApiError;

/// Retry configuration with exponential backoff
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 500,
            max_delay_ms: 5000,
            backoff_factor: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries: max_retries.max(1),
            ..Default::default()
        }
    }

    /// Execute a function with retries and exponential backoff.
    ///
    /// An `ApiError` that is not retryable is returned immediately.
    pub async fn execute<F, Fut, T>(&self, mut func: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        let mut delay_ms = self.initial_delay_ms;

        loop {
            match func().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    attempt += 1;

                    let retryable = e
                        .downcast_ref::<ApiError>()
                        .map_or(true, ApiError::is_retryable);
                    if !retryable {
                        return Err(e);
                    }

                    if attempt >= self.max_retries {
                        tracing::warn!("Max retries ({}) exceeded", self.max_retries);
                        return Err(e);
                    }

                    tracing::debug!(
                        "Attempt {} failed, retrying in {}ms: {}",
                        attempt,
                        delay_ms,
                        e
                    );

                    sleep(Duration::from_millis(delay_ms)).await;

                    delay_ms = ((delay_ms as f64 * self.backoff_factor) as u64).min(self.max_delay_ms);
                }
            }
        }
    }
}
