//! Bounded retry with exponential backoff for provider HTTP calls

use crate::LlmError;
use reqwest::{RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::warn;

/// Default number of attempts per request
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the second attempt
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 1_000;

/// How many times a request is attempted and how long to wait between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one (at least 1)
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles after each failure
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base: Duration::from_millis(DEFAULT_BACKOFF_BASE_MS),
        }
    }
}

impl RetryPolicy {
    /// Delay after the given failed attempt (1-based): base, 2*base, 4*base, ...
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff_base
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// Send a request, retrying transport errors, timeouts, 429 and 5xx
///
/// `build` is called once per attempt. A 404 maps to `ModelNotAvailable` and
/// other 4xx responses fail immediately.
pub(crate) async fn send_with_retry<F>(
    policy: RetryPolicy,
    model: &str,
    build: F,
) -> Result<Response, LlmError>
where
    F: Fn() -> RequestBuilder,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        let error = match build().send().await {
            Ok(response) if response.status().is_success() => return Ok(response),
            Ok(response) if response.status() == StatusCode::NOT_FOUND => {
                return Err(LlmError::ModelNotAvailable(model.to_string()));
            }
            Ok(response) if response.status() == StatusCode::TOO_MANY_REQUESTS => {
                LlmError::RateLimitExceeded
            }
            Ok(response) => {
                let status = response.status();
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                let error = LlmError::Communication(format!("HTTP {}: {}", status, error_text));
                if !status.is_server_error() {
                    return Err(error);
                }
                error
            }
            Err(e) if e.is_timeout() => LlmError::Timeout(e.to_string()),
            Err(e) => LlmError::Communication(format!("Request failed: {}", e)),
        };

        if attempt < max_attempts {
            let delay = policy.delay_after(attempt);
            warn!(
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                "LLM request failed, retrying: {}",
                error
            );
            tokio::time::sleep(delay).await;
        }
        last_error = Some(error);
    }

    Err(last_error
        .unwrap_or_else(|| LlmError::Communication("Max retries exceeded".to_string())))
}
