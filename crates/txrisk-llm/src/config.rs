//! Configuration for the reasoning-model provider

use crate::retry::{RetryPolicy, DEFAULT_BACKOFF_BASE_MS, DEFAULT_MAX_ATTEMPTS};
use crate::{chat, ollama, ChatCompletionsProvider, LlmError, OllamaProvider, SharedProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Which provider implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI-compatible chat completions
    #[default]
    Chat,
    /// Local Ollama
    Ollama,
}

/// Provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider implementation
    pub provider: ProviderKind,

    /// Base URL of the provider API
    pub endpoint: String,

    /// Model identifier
    pub model: String,

    /// API key (required for `chat`)
    pub api_key: Option<String>,

    /// Sampling temperature
    pub temperature: f32,

    /// Per-request timeout (seconds)
    pub timeout_secs: u64,

    /// Total attempts per request
    pub max_attempts: u32,

    /// Delay before the second attempt (milliseconds)
    pub backoff_base_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Chat,
            endpoint: chat::DEFAULT_ENDPOINT.to_string(),
            model: chat::DEFAULT_MODEL.to_string(),
            api_key: None,
            temperature: 0.0,
            timeout_secs: ollama::DEFAULT_TIMEOUT_SECS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
        }
    }
}

impl LlmConfig {
    /// Per-request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Retry policy derived from the settings
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff_base: Duration::from_millis(self.backoff_base_ms),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.endpoint.is_empty() {
            return Err("llm.endpoint must not be empty".to_string());
        }
        if self.model.is_empty() {
            return Err("llm.model must not be empty".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("llm.timeout_secs must be greater than 0".to_string());
        }
        if self.max_attempts == 0 {
            return Err("llm.max_attempts must be greater than 0".to_string());
        }
        if self.provider == ProviderKind::Chat
            && self.api_key.as_deref().map_or(true, str::is_empty)
        {
            return Err("llm.api_key is required for the chat provider".to_string());
        }
        Ok(())
    }

    /// Construct the configured provider
    pub fn build(&self) -> Result<SharedProvider, LlmError> {
        self.validate().map_err(LlmError::Config)?;

        let provider: SharedProvider = match self.provider {
            ProviderKind::Chat => Arc::new(
                ChatCompletionsProvider::new(
                    &self.endpoint,
                    &self.model,
                    self.api_key.clone(),
                    self.timeout(),
                )?
                .with_temperature(self.temperature)
                .with_retry(self.retry_policy()),
            ),
            ProviderKind::Ollama => Arc::new(
                OllamaProvider::with_timeout(&self.endpoint, &self.model, self.timeout())?
                    .with_retry(self.retry_policy()),
            ),
        };
        Ok(provider)
    }
}
