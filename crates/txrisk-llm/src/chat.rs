//! OpenAI-compatible chat completions provider
//!
//! Works with any service exposing `POST {endpoint}/chat/completions`, such
//! as Groq serving `deepseek-r1-distill-llama-70b`. The prompt is sent as a
//! single user message and the first choice's content is returned verbatim,
//! reasoning span included.

use crate::retry::{send_with_retry, RetryPolicy};
use crate::LlmError;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use txrisk_domain::traits::LlmProvider as LlmProviderTrait;

/// Groq's OpenAI-compatible endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.groq.com/openai/v1";

/// Reasoning model used when none is configured
pub const DEFAULT_MODEL: &str = "deepseek-r1-distill-llama-70b";

/// Chat-completions provider
pub struct ChatCompletionsProvider {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    client: reqwest::Client,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl ChatCompletionsProvider {
    /// Create a provider
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.filter(|key| !key.is_empty()),
            temperature: 0.0,
            client,
            retry: RetryPolicy::default(),
        })
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Request a completion for the prompt
    pub async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.endpoint);
        let body = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = send_with_retry(self.retry, &self.model, || {
            let request = self.client.post(&url).json(&body);
            match &self.api_key {
                Some(key) => request.bearer_auth(key),
                None => request,
            }
        })
        .await?;

        let json: Value = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;
        let content = parse_chat_content(&json)?;

        debug!(model = %self.model, chars = content.len(), "chat completion received");
        Ok(content)
    }
}

fn parse_chat_content(json: &Value) -> Result<String, LlmError> {
    json.get("choices")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|msg| msg.get("content"))
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            LlmError::InvalidResponse("Completion is missing choices[0].message.content".to_string())
        })
}

#[async_trait]
impl LlmProviderTrait for ChatCompletionsProvider {
    type Error = LlmError;

    async fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        self.complete(prompt).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_chat_content() {
        let json = json!({
            "choices": [{ "message": { "role": "assistant", "content": "<think>x</think>done" } }]
        });
        assert_eq!(parse_chat_content(&json).unwrap(), "<think>x</think>done");
    }

    #[test]
    fn test_parse_chat_content_missing() {
        let json = json!({ "choices": [] });
        assert!(matches!(
            parse_chat_content(&json),
            Err(LlmError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_empty_key_is_dropped() {
        let provider = ChatCompletionsProvider::new(
            DEFAULT_ENDPOINT,
            DEFAULT_MODEL,
            Some(String::new()),
            Duration::from_secs(5),
        )
        .unwrap();
        assert!(provider.api_key.is_none());
        assert_eq!(provider.model_name(), DEFAULT_MODEL);
    }
}
