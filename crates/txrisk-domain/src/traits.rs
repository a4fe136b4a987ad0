//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::{EvidenceDocument, RetrieverKind, StoredAnalysis, TransactionAnalysis, TransactionRecord};
use async_trait::async_trait;

/// A source of evidence documents for a query
///
/// Implemented by the retrieval layer (txrisk-retrieval)
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Error type for retrieval operations
    type Error;

    /// Which source this retriever represents
    fn kind(&self) -> RetrieverKind;

    /// Retrieve documents for a query, best match first
    async fn retrieve(&self, query: &str) -> Result<Vec<EvidenceDocument>, Self::Error>;
}

/// Trait for reasoning-model operations
///
/// Implemented by the infrastructure layer (txrisk-llm)
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Error type for LLM operations
    type Error;

    /// Generate a text completion for a rendered prompt
    async fn generate(&self, prompt: &str) -> Result<String, Self::Error>;

    /// Model identifier, for logging
    fn model_name(&self) -> &str;
}

/// Trait for storing analyzed transactions
///
/// Implemented by the infrastructure layer (txrisk-store)
pub trait AnalysisStore {
    /// Error type for store operations
    type Error;

    /// Persist a transaction and its analysis together
    fn save(
        &mut self,
        transaction: &TransactionRecord,
        analysis: &TransactionAnalysis,
        degraded: bool,
    ) -> Result<(), Self::Error>;

    /// Most recent transactions, newest first
    fn recent(&self, limit: usize) -> Result<Vec<TransactionRecord>, Self::Error>;

    /// Load a transaction and its analysis
    fn load(&self, id: &str) -> Result<Option<StoredAnalysis>, Self::Error>;
}
