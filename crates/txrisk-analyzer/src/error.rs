//! Error types for the analyzer

use thiserror::Error;
use txrisk_domain::RetrieverKind;
use txrisk_llm::LlmError;
use txrisk_retrieval::RetrievalError;

/// Errors surfaced by the analysis pipeline
///
/// Retrieval and inference failures reach the caller unmodified in kind;
/// the pipeline never downgrades them to a partial verdict.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// A retriever's backing service is unreachable or failed
    #[error("{service} service error: {message}")]
    RemoteService {
        /// Which retriever failed
        service: RetrieverKind,
        /// What went wrong
        message: String,
    },

    /// Invalid weights, missing credentials or other bad settings
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The reasoning-model call failed or timed out
    #[error("Inference error: {message}")]
    Inference {
        /// What went wrong
        message: String,
        /// Whether the call ran out of time
        timed_out: bool,
    },

    /// The model's JSON block does not fit the analysis schema
    #[error("Schema error: {0}")]
    Schema(String),
}

impl AnalysisError {
    /// Whether this is an inference timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, AnalysisError::Inference { timed_out: true, .. })
    }
}

impl From<RetrievalError> for AnalysisError {
    fn from(e: RetrievalError) -> Self {
        match e {
            RetrievalError::RemoteService { service, message } => {
                AnalysisError::RemoteService { service, message }
            }
            RetrievalError::Configuration(message) => AnalysisError::Configuration(message),
            RetrievalError::Embedding(e) => AnalysisError::RemoteService {
                service: RetrieverKind::Instructions,
                message: e.to_string(),
            },
            other => AnalysisError::Configuration(other.to_string()),
        }
    }
}

impl From<LlmError> for AnalysisError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::Config(message) => AnalysisError::Configuration(message),
            other => AnalysisError::Inference {
                timed_out: other.is_timeout(),
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn llm_timeout_keeps_timeout_flag() {
        let err = AnalysisError::from(LlmError::Timeout("120s".to_string()));
        assert!(err.is_timeout());

        let err = AnalysisError::from(LlmError::Communication("reset".to_string()));
        assert!(!err.is_timeout());
        assert!(matches!(err, AnalysisError::Inference { .. }));
    }

    #[test]
    fn retrieval_errors_keep_their_kind() {
        let err = AnalysisError::from(RetrievalError::RemoteService {
            service: RetrieverKind::Sanctions,
            message: "HTTP 503".to_string(),
        });
        assert!(matches!(
            err,
            AnalysisError::RemoteService {
                service: RetrieverKind::Sanctions,
                ..
            }
        ));

        let err = AnalysisError::from(RetrievalError::Configuration("weights".to_string()));
        assert!(matches!(err, AnalysisError::Configuration(_)));
    }
}
