//! Embedding Models for Text Vectorization
//!
//! Text-to-vector conversion for the guidance corpus and incoming queries.
//!
//! # Models
//!
//! - **HashingEmbeddingModel**: Offline feature-hashing embeddings. Texts
//!   that share words land close together, which is enough to rank the
//!   paragraphs of a guidance document against a transaction description.
//! - **HttpEmbeddingModel**: Any OpenAI-compatible `/embeddings` endpoint
//!   (e.g. a server hosting all-MiniLM-L6-v2).
//!
//! # Examples
//!
//! ```rust
//! use txrisk_store::embedding::{HashingEmbeddingModel, EmbeddingModel};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let model = HashingEmbeddingModel::new(384);
//! let embedding = model.embed("The sky is blue").await.unwrap();
//! assert_eq!(embedding.len(), 384);
//!
//! // Same text always produces same embedding
//! let embedding2 = model.embed("The sky is blue").await.unwrap();
//! assert_eq!(embedding, embedding2);
//! # }
//! ```

use async_trait::async_trait;
use serde_json::Value;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during embedding generation
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Invalid input text
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Remote embedding service failed
    #[error("Embedding service error: {0}")]
    Remote(String),

    /// Model returned something unusable
    #[error("Model inference failed: {0}")]
    InferenceFailed(String),
}

/// Trait for embedding models
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Generate an embedding vector for the given text
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embed several texts, preserving order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    /// Get the dimension of embeddings produced by this model
    fn dimension(&self) -> usize;
}

/// Feature-hashing embedding model
///
/// Each lower-cased alphanumeric token is hashed to a bucket and a sign; the
/// resulting vector is normalized to unit length. The embeddings are:
///
/// - **Deterministic**: Same text always produces same embedding
/// - **Normalized**: All vectors have unit length (for cosine similarity)
/// - **Lexical**: Texts sharing vocabulary have positive similarity
pub struct HashingEmbeddingModel {
    dimension: usize,
}

impl HashingEmbeddingModel {
    /// Create a new hashing model
    ///
    /// # Parameters
    ///
    /// - `dimension`: The embedding dimension (e.g., 384)
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn bucket(token: &str, dimension: usize) -> (usize, f32) {
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        let hash = hasher.finish();
        let index = (hash % dimension as u64) as usize;
        let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
        (index, sign)
    }
}

#[async_trait]
impl EmbeddingModel for HashingEmbeddingModel {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if self.dimension == 0 {
            return Err(EmbeddingError::InvalidInput(
                "Embedding dimension must be greater than 0".to_string(),
            ));
        }

        let mut embedding = vec![0.0f32; self.dimension];
        let mut tokens = 0usize;

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let (index, sign) = Self::bucket(&token.to_lowercase(), self.dimension);
            embedding[index] += sign;
            tokens += 1;
        }

        if tokens == 0 {
            return Err(EmbeddingError::InvalidInput(
                "Empty text cannot be embedded".to_string(),
            ));
        }

        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude == 0.0 {
            // Opposite-signed collisions cancelled out; fall back to a fixed direction
            embedding[0] = 1.0;
        } else {
            for value in &mut embedding {
                *value /= magnitude;
            }
        }

        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Embedding model behind an OpenAI-compatible `/embeddings` endpoint
pub struct HttpEmbeddingModel {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    dimension: usize,
    client: reqwest::Client,
}

impl HttpEmbeddingModel {
    /// Create a remote embedding model
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        dimension: usize,
        timeout: Duration,
    ) -> Result<Self, EmbeddingError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EmbeddingError::Remote(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.filter(|key| !key.is_empty()),
            dimension,
            client,
        })
    }
}

#[async_trait]
impl EmbeddingModel for HttpEmbeddingModel {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut batch = self.embed_batch(&[text.to_string()]).await?;
        batch
            .pop()
            .ok_or_else(|| EmbeddingError::InferenceFailed("Empty embedding response".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.iter().any(|t| t.trim().is_empty()) {
            return Err(EmbeddingError::InvalidInput(
                "Empty text cannot be embedded".to_string(),
            ));
        }

        let url = format!("{}/embeddings", self.endpoint);
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let mut request = self.client.post(url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| EmbeddingError::Remote(format!("Request failed: {}", e)))?;
        let status = response.status();
        if !status.is_success() {
            return Err(EmbeddingError::Remote(format!("HTTP {}", status)));
        }
        let json: Value = response
            .json()
            .await
            .map_err(|e| EmbeddingError::Remote(format!("Failed to parse response: {}", e)))?;

        let embeddings = parse_embedding_response(&json)?;
        if embeddings.len() != texts.len() {
            return Err(EmbeddingError::InferenceFailed(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                embeddings.len()
            )));
        }
        if let Some(bad) = embeddings.iter().find(|e| e.len() != self.dimension) {
            return Err(EmbeddingError::InferenceFailed(format!(
                "Expected dimension {}, got {}",
                self.dimension,
                bad.len()
            )));
        }
        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

fn parse_embedding_response(json: &Value) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let data = json
        .get("data")
        .and_then(|v| v.as_array())
        .ok_or_else(|| EmbeddingError::InferenceFailed("Response is missing data array".to_string()))?;

    let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());
    for (fallback_index, item) in data.iter().enumerate() {
        let index = item
            .get("index")
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
            .unwrap_or(fallback_index);
        let values = item
            .get("embedding")
            .and_then(|v| v.as_array())
            .ok_or_else(|| EmbeddingError::InferenceFailed("Item missing embedding array".to_string()))?;
        let vector = values
            .iter()
            .map(|v| {
                v.as_f64()
                    .map(|n| n as f32)
                    .ok_or_else(|| EmbeddingError::InferenceFailed("Embedding value must be numeric".to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        indexed.push((index, vector));
    }

    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, vector)| vector).collect())
}

/// Calculate cosine similarity between two embedding vectors
///
/// Returns a value in `[-1, 1]`; zero-length vectors score 0.
///
/// # Panics
///
/// Panics if vectors have different lengths
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "Vectors must have same length");

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_hashing_embedding_deterministic() {
        let model = HashingEmbeddingModel::new(384);

        let text = "The quick brown fox jumps over the lazy dog";
        let embedding1 = model.embed(text).await.unwrap();
        let embedding2 = model.embed(text).await.unwrap();

        assert_eq!(embedding1, embedding2);
    }

    #[tokio::test]
    async fn test_hashing_embedding_normalized() {
        let model = HashingEmbeddingModel::new(128);
        let embedding = model.embed("test text").await.unwrap();

        assert_eq!(embedding.len(), 128);
        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 0.0001);
    }

    #[tokio::test]
    async fn test_hashing_embedding_case_insensitive() {
        let model = HashingEmbeddingModel::new(256);
        let upper = model.embed("Shell Company Offshore").await.unwrap();
        let lower = model.embed("shell company offshore").await.unwrap();
        assert_eq!(upper, lower);
    }

    #[tokio::test]
    async fn test_shared_vocabulary_is_closer() {
        let model = HashingEmbeddingModel::new(1024);
        let query = model.embed("wire transfer to a sanctioned bank").await.unwrap();
        let related = model
            .embed("transfers involving a sanctioned bank are high risk")
            .await
            .unwrap();
        let unrelated = model.embed("quarterly gardening newsletter").await.unwrap();

        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_hashing_embedding_empty_text() {
        let model = HashingEmbeddingModel::new(384);

        let result = model.embed("  ...  ").await;
        assert!(result.unwrap_err().to_string().contains("Empty text"));
    }

    #[test]
    fn test_parse_embeddings_in_index_order() {
        let json = json!({
            "data": [
                { "index": 1, "embedding": [2.0, 3.0] },
                { "index": 0, "embedding": [0.5, 1.5] }
            ]
        });
        let parsed = parse_embedding_response(&json).unwrap();
        assert_eq!(parsed, vec![vec![0.5, 1.5], vec![2.0, 3.0]]);
    }

    #[test]
    fn test_parse_embeddings_rejects_non_numeric() {
        let json = json!({ "data": [{ "embedding": ["a"] }] });
        assert!(parse_embedding_response(&json).is_err());
    }

    #[test]
    fn test_cosine_similarity_identical() {
        let vec = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&vec, &vec) - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let similarity = cosine_similarity(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]);
        assert!(similarity.abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let similarity = cosine_similarity(&[1.0, 0.0, 0.0], &[-1.0, 0.0, 0.0]);
        assert!((similarity + 1.0).abs() < 0.0001);
    }
}
