//! txrisk Retrieval
//!
//! Evidence gathering for transaction analysis: three source retrievers, a
//! weighted rank-fusion ensemble and the context formatter.
//!
//! # Architecture
//!
//! ```text
//! query ─┬─ SanctionsRetriever    (remote entity matching)  ─┐
//!        ├─ WikiRetriever         (remote summaries)         ├─ fuse → format_context → prompt context
//!        └─ InstructionsRetriever (local HNSW index)         ─┘
//! ```
//!
//! Every retriever implements `txrisk_domain::traits::Retriever` with
//! `RetrievalError` as its error type, so the analyzer can hold them as
//! `SharedRetriever` trait objects.

#![warn(missing_docs)]

mod chunking;
pub mod config;
pub mod context;
pub mod ensemble;
mod error;
pub mod instructions;
pub mod sanctions;
pub mod wiki;

use std::sync::Arc;
use txrisk_domain::traits::Retriever;

pub use chunking::{ChunkStrategy, TextChunker};
pub use config::{
    EmbeddingConfig, EmbeddingProvider, InstructionsConfig, SanctionsConfig, WikiConfig,
};
pub use context::{format_context, ContextBlock};
pub use ensemble::{fuse, EnsembleWeights, FusedDocument, RetrievalResult};
pub use error::RetrievalError;
pub use instructions::InstructionsRetriever;
pub use sanctions::SanctionsRetriever;
pub use wiki::WikiRetriever;

/// A shareable retriever handle
pub type SharedRetriever = Arc<dyn Retriever<Error = RetrievalError>>;
