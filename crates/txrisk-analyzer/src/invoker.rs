//! Prompt/inference invoker

use crate::error::AnalysisError;
use crate::prompt::PromptBuilder;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::debug;
use txrisk_llm::SharedProvider;

/// Sends rendered prompts to the reasoning model under a deadline
///
/// Transient-failure retries live in the provider; this layer only bounds
/// the total time of one call.
#[derive(Clone)]
pub struct Invoker {
    provider: SharedProvider,
    timeout: Duration,
}

impl Invoker {
    /// Create an invoker
    pub fn new(provider: SharedProvider, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Model identifier of the provider
    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// Render the analysis prompt and return the raw completion
    pub async fn invoke(&self, context: &str, transaction: &str) -> Result<String, AnalysisError> {
        self.invoke_prompt(&PromptBuilder::new(context, transaction).build())
            .await
    }

    /// Send an already rendered prompt
    pub async fn invoke_prompt(&self, prompt: &str) -> Result<String, AnalysisError> {
        debug!(
            model = self.provider.model_name(),
            prompt_len = prompt.len(),
            "Invoking reasoning model"
        );
        let started = Instant::now();

        let reply = timeout(self.timeout, self.provider.generate(prompt))
            .await
            .map_err(|_| AnalysisError::Inference {
                message: format!("no completion within {}s", self.timeout.as_secs()),
                timed_out: true,
            })??;

        debug!(
            reply_len = reply.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Model replied"
        );
        Ok(reply)
    }
}
