//! Process-lifetime analyzer context
//!
//! Holds everything that is expensive to build: HTTP clients, the embedding
//! model and the guidance index. It is built once at startup, shared by
//! `Arc`, and only read afterwards.

use crate::config::{AnalyzerConfig, PipelineConfig};
use crate::error::AnalysisError;
use crate::invoker::Invoker;
use crate::parser::ResponseParser;
use std::sync::Arc;
use tracing::{info, warn};
use txrisk_llm::SharedProvider;
use txrisk_retrieval::SharedRetriever;

/// Shared handles used by every analysis
pub struct AnalyzerContext {
    pub(crate) retrievers: Vec<SharedRetriever>,
    pub(crate) invoker: Invoker,
    pub(crate) parser: ResponseParser,
    pub(crate) config: AnalyzerConfig,
}

impl AnalyzerContext {
    /// Build providers, retrievers and the guidance index
    pub async fn initialize(config: &PipelineConfig) -> Result<Arc<Self>, AnalysisError> {
        config.validate().map_err(AnalysisError::Configuration)?;

        let provider = config.llm.build()?;
        let sanctions: SharedRetriever = Arc::new(config.sanctions.build()?);
        let wiki: SharedRetriever = Arc::new(config.wiki.build()?);
        let instructions: SharedRetriever = Arc::new(config.instructions.build().await?);

        let context = Self::new(
            vec![sanctions, wiki, instructions],
            provider,
            config.analyzer.clone(),
        )?;
        info!(
            model = context.invoker.model_name(),
            retrievers = context.retrievers.len(),
            "Analyzer context initialized"
        );
        Ok(Arc::new(context))
    }

    /// Assemble a context from already built parts
    pub fn new(
        mut retrievers: Vec<SharedRetriever>,
        provider: SharedProvider,
        config: AnalyzerConfig,
    ) -> Result<Self, AnalysisError> {
        config.validate().map_err(AnalysisError::Configuration)?;
        if retrievers.is_empty() {
            return Err(AnalysisError::Configuration(
                "at least one retriever is required".to_string(),
            ));
        }
        retrievers.sort_by_key(|retriever| retriever.kind());

        Ok(Self {
            retrievers,
            invoker: Invoker::new(provider, config.inference_timeout()),
            parser: ResponseParser::new(config.strict_schema),
            config,
        })
    }

    /// Pipeline settings
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Retrievers in priority order
    pub fn retrievers(&self) -> &[SharedRetriever] {
        &self.retrievers
    }

    /// Release the shared handles
    ///
    /// Succeeds only for the last reference; otherwise the context stays
    /// alive with its remaining owners.
    pub fn shutdown(self: Arc<Self>) -> bool {
        match Arc::try_unwrap(self) {
            Ok(context) => {
                info!(
                    retrievers = context.retrievers.len(),
                    "Analyzer context shut down"
                );
                drop(context);
                true
            }
            Err(shared) => {
                warn!(
                    references = Arc::strong_count(&shared),
                    "Analyzer context still in use at shutdown"
                );
                false
            }
        }
    }
}
