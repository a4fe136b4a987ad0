//! Configuration for the evidence sources

use crate::chunking::ChunkStrategy;
use crate::{InstructionsRetriever, RetrievalError, SanctionsRetriever, TextChunker, WikiRetriever};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use txrisk_store::{EmbeddingModel, HashingEmbeddingModel, HttpEmbeddingModel};

/// Sanctions matching service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SanctionsConfig {
    /// Base URL of the matching API
    pub endpoint: String,

    /// Dataset collection queried through `/match/{dataset}`
    pub dataset: String,

    /// API key (required)
    pub api_key: Option<String>,

    /// Request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for SanctionsConfig {
    fn default() -> Self {
        Self {
            endpoint: crate::sanctions::DEFAULT_ENDPOINT.to_string(),
            dataset: crate::sanctions::DEFAULT_DATASET.to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

impl SanctionsConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.endpoint.is_empty() {
            return Err("sanctions.endpoint must not be empty".to_string());
        }
        if self.dataset.is_empty() {
            return Err("sanctions.dataset must not be empty".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("sanctions.timeout_secs must be greater than 0".to_string());
        }
        if self.api_key.as_deref().map_or(true, |key| key.trim().is_empty()) {
            return Err("sanctions.api_key is required".to_string());
        }
        Ok(())
    }

    /// Construct the retriever
    pub fn build(&self) -> Result<SanctionsRetriever, RetrievalError> {
        self.validate().map_err(RetrievalError::Configuration)?;
        let api_key = self.api_key.clone().unwrap_or_default();
        SanctionsRetriever::new(
            &self.endpoint,
            &self.dataset,
            api_key,
            Duration::from_secs(self.timeout_secs),
        )
    }
}

/// Encyclopedic summary service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WikiConfig {
    /// MediaWiki API URL (`.../w/api.php`)
    pub endpoint: String,

    /// Maximum pages returned per query
    pub top_k: usize,

    /// Summaries are cut to this many characters
    pub max_chars: usize,

    /// Request timeout (seconds)
    pub timeout_secs: u64,

    /// When set, a failing service yields no documents instead of an error
    pub best_effort: bool,
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            endpoint: crate::wiki::DEFAULT_ENDPOINT.to_string(),
            top_k: 3,
            max_chars: 4000,
            timeout_secs: 15,
            best_effort: true,
        }
    }
}

impl WikiConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.endpoint.is_empty() {
            return Err("wiki.endpoint must not be empty".to_string());
        }
        if self.top_k == 0 {
            return Err("wiki.top_k must be greater than 0".to_string());
        }
        if self.max_chars == 0 {
            return Err("wiki.max_chars must be greater than 0".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("wiki.timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Construct the retriever
    pub fn build(&self) -> Result<WikiRetriever, RetrievalError> {
        self.validate().map_err(RetrievalError::Configuration)?;
        Ok(WikiRetriever::new(
            &self.endpoint,
            Duration::from_secs(self.timeout_secs),
        )?
        .with_top_k(self.top_k)
        .with_max_chars(self.max_chars)
        .with_best_effort(self.best_effort))
    }
}

/// Embedding backend for the guidance index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Offline feature hashing
    #[default]
    Hashing,
    /// OpenAI-compatible `/embeddings` endpoint
    Http,
}

/// Embedding model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Backend
    pub provider: EmbeddingProvider,

    /// Vector dimension
    pub dimension: usize,

    /// Endpoint for the `http` provider
    pub endpoint: Option<String>,

    /// Model name for the `http` provider
    pub model: String,

    /// API key for the `http` provider
    pub api_key: Option<String>,

    /// Request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Hashing,
            dimension: 384,
            endpoint: None,
            model: "all-MiniLM-L6-v2".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

impl EmbeddingConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.dimension == 0 {
            return Err("instructions.embedding.dimension must be greater than 0".to_string());
        }
        if self.provider == EmbeddingProvider::Http
            && self.endpoint.as_deref().map_or(true, str::is_empty)
        {
            return Err(
                "instructions.embedding.endpoint is required for the http provider".to_string(),
            );
        }
        Ok(())
    }

    /// Construct the embedding model
    pub fn build(&self) -> Result<Arc<dyn EmbeddingModel>, RetrievalError> {
        self.validate().map_err(RetrievalError::Configuration)?;
        let model: Arc<dyn EmbeddingModel> = match self.provider {
            EmbeddingProvider::Hashing => Arc::new(HashingEmbeddingModel::new(self.dimension)),
            EmbeddingProvider::Http => Arc::new(HttpEmbeddingModel::new(
                self.endpoint.clone().unwrap_or_default(),
                &self.model,
                self.api_key.clone(),
                self.dimension,
                Duration::from_secs(self.timeout_secs),
            )?),
        };
        Ok(model)
    }
}

/// Guidance corpus settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstructionsConfig {
    /// Path of the guidance document
    pub path: PathBuf,

    /// Passages returned per query
    pub top_k: usize,

    /// Maximum passage length (characters)
    pub chunk_chars: usize,

    /// How the document is split
    pub chunk_strategy: ChunkStrategy,

    /// Embedding model
    pub embedding: EmbeddingConfig,
}

impl Default for InstructionsConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("config/guidance.md"),
            top_k: 4,
            chunk_chars: 1000,
            chunk_strategy: ChunkStrategy::ByParagraph,
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl InstructionsConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.top_k == 0 {
            return Err("instructions.top_k must be greater than 0".to_string());
        }
        if self.chunk_chars == 0 {
            return Err("instructions.chunk_chars must be greater than 0".to_string());
        }
        self.embedding.validate()
    }

    /// Read, chunk and index the guidance document
    pub async fn build(&self) -> Result<InstructionsRetriever, RetrievalError> {
        self.validate().map_err(RetrievalError::Configuration)?;
        let embedder = self.embedding.build()?;
        let chunker = TextChunker::new(self.chunk_strategy, self.chunk_chars);
        InstructionsRetriever::from_file(&self.path, embedder, &chunker, self.top_k).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let wiki = WikiConfig::default();
        assert_eq!(wiki.top_k, 3);
        assert_eq!(wiki.max_chars, 4000);
        assert!(wiki.best_effort);

        let instructions = InstructionsConfig::default();
        assert_eq!(instructions.top_k, 4);
        assert_eq!(instructions.embedding.provider, EmbeddingProvider::Hashing);
    }

    #[test]
    fn sanctions_requires_api_key() {
        let config = SanctionsConfig::default();
        assert!(config.validate().unwrap_err().contains("api_key"));
        assert!(matches!(
            config.build(),
            Err(RetrievalError::Configuration(_))
        ));

        let config = SanctionsConfig {
            api_key: Some("secret".to_string()),
            ..SanctionsConfig::default()
        };
        assert!(config.validate().is_ok());
        assert!(config.build().is_ok());
    }

    #[test]
    fn http_embedding_requires_endpoint() {
        let config = EmbeddingConfig {
            provider: EmbeddingProvider::Http,
            ..EmbeddingConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: InstructionsConfig = toml::from_str(
            r#"
            path = "guidance/aml.md"
            chunk_strategy = "by_section"

            [embedding]
            dimension = 128
            "#,
        )
        .unwrap();

        assert_eq!(config.path, PathBuf::from("guidance/aml.md"));
        assert_eq!(config.chunk_strategy, ChunkStrategy::BySection);
        assert_eq!(config.embedding.dimension, 128);
        assert_eq!(config.top_k, 4);
    }
}
