//! Error types for retrieval

use thiserror::Error;
use txrisk_domain::RetrieverKind;
use txrisk_store::{EmbeddingError, VectorIndexError};

/// Errors that can occur while gathering or fusing evidence
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// A retriever's backing service is unreachable or answered with a failure
    #[error("{service} service error: {message}")]
    RemoteService {
        /// Which retriever failed
        service: RetrieverKind,
        /// What went wrong
        message: String,
    },

    /// Invalid weights or missing credentials
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Embedding the corpus or the query failed
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Vector index failure
    #[error("Index error: {0}")]
    Index(#[from] VectorIndexError),

    /// Reading the guidance corpus failed
    #[error("Failed to read guidance corpus: {0}")]
    Io(#[from] std::io::Error),
}

impl RetrievalError {
    pub(crate) fn remote(service: RetrieverKind, message: impl Into<String>) -> Self {
        RetrievalError::RemoteService {
            service,
            message: message.into(),
        }
    }
}
