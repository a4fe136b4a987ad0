//! Pipeline facade

use crate::context::AnalyzerContext;
use crate::error::AnalysisError;
use crate::parser::ParsedResponse;
use crate::prompt::PromptBuilder;
use crate::types::{AnalysisOutcome, SourceSummary};
use futures::future::join_all;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};
use txrisk_domain::{TransactionAnalysis, TransactionInput};
use txrisk_retrieval::{format_context, fuse, RetrievalResult};

/// Drives retrieval, fusion, formatting, inference and parsing
///
/// Holds no per-request state; clones share one `AnalyzerContext`.
#[derive(Clone)]
pub struct Analyzer {
    context: Arc<AnalyzerContext>,
}

impl Analyzer {
    /// Create an analyzer over a shared context
    pub fn new(context: Arc<AnalyzerContext>) -> Self {
        Self { context }
    }

    /// The shared context
    pub fn context(&self) -> &Arc<AnalyzerContext> {
        &self.context
    }

    /// Analyze a description and optional uploaded content
    ///
    /// Uploaded content, when non-empty, takes precedence over the
    /// description. The text is case-folded before retrieval.
    pub async fn analyze_transaction_text(
        &self,
        description: &str,
        file_content: Option<&str>,
    ) -> Result<TransactionAnalysis, AnalysisError> {
        let input = TransactionInput::new(description, file_content.map(str::to_string));
        Ok(self.analyze(&input).await?.analysis)
    }

    /// Run the full pipeline for one transaction
    #[instrument(skip(self, input))]
    pub async fn analyze(&self, input: &TransactionInput) -> Result<AnalysisOutcome, AnalysisError> {
        let text = input.effective_text();
        let config = &self.context.config;
        info!(text_len = text.len(), "Starting transaction analysis");

        let results = self.retrieve_all(&text).await?;
        let mut sources = SourceSummary::default();
        for result in &results {
            sources.record(result.source, result.documents.len());
        }

        let weights = config.weights.aligned(&results);
        let fused = fuse(results, &weights, config.rank_constant)?;
        let context = format_context(fused.iter().map(|f| &f.document), config.context_limit());
        sources.context_documents = context.included;
        sources.context_dropped = context.dropped;
        if context.dropped > 0 || context.truncated {
            debug!(
                dropped = context.dropped,
                truncated = context.truncated,
                "Context guard shortened the evidence"
            );
        }

        let parsed = self.infer(&context.text, &text).await?;
        info!(
            risk_score = parsed.analysis.risk_score,
            degraded = parsed.degraded,
            evidence = sources.total(),
            "Transaction analysis complete"
        );

        Ok(AnalysisOutcome {
            analysis: parsed.analysis,
            degraded: parsed.degraded,
            sources,
        })
    }

    /// Query every retriever concurrently; results come back in priority order
    async fn retrieve_all(&self, query: &str) -> Result<Vec<RetrievalResult>, AnalysisError> {
        let deadline = self.context.config.retrieval_timeout();

        let calls = self.context.retrievers.iter().map(|retriever| async move {
            let kind = retriever.kind();
            let documents = timeout(deadline, retriever.retrieve(query))
                .await
                .map_err(|_| AnalysisError::RemoteService {
                    service: kind,
                    message: format!("no response within {}s", deadline.as_secs()),
                })??;
            debug!(source = %kind, documents = documents.len(), "Retriever finished");
            Ok::<_, AnalysisError>(RetrievalResult::new(kind, documents))
        });

        let mut results = join_all(calls)
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;
        results.sort_by_key(|result| result.source);
        Ok(results)
    }

    /// Invoke the model, re-prompting on schema violations
    async fn infer(&self, context: &str, transaction: &str) -> Result<ParsedResponse, AnalysisError> {
        let max_retries = self.context.config.max_schema_retries;
        let mut prompt = PromptBuilder::new(context, transaction).build();
        let mut retries = 0;

        loop {
            let raw = self.context.invoker.invoke_prompt(&prompt).await?;
            match self.context.parser.parse(&raw) {
                Ok(parsed) => return Ok(parsed),
                Err(AnalysisError::Schema(violation)) if retries < max_retries => {
                    retries += 1;
                    warn!(
                        attempt = retries,
                        violation = %violation,
                        "Model reply broke the analysis schema; re-prompting"
                    );
                    prompt = PromptBuilder::new(context, transaction)
                        .with_correction(violation)
                        .build();
                }
                Err(e) => return Err(e),
            }
        }
    }
}
