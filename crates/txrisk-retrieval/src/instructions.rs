//! Static-instructions retriever
//!
//! The guidance document is chunked and embedded once when the retriever is
//! built. After that the index is only read, so one retriever can serve any
//! number of concurrent analyses without locking.

use crate::{RetrievalError, TextChunker};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use txrisk_domain::traits::Retriever;
use txrisk_domain::{EvidenceDocument, InstructionEvidence, RetrieverKind};
use txrisk_store::vector_index::DEFAULT_EF_SEARCH;
use txrisk_store::{EmbeddingError, EmbeddingModel, VectorIndex};

/// Retriever over an in-memory index of guidance passages
pub struct InstructionsRetriever {
    passages: Vec<String>,
    index: VectorIndex,
    embedder: Arc<dyn EmbeddingModel>,
    top_k: usize,
    source: String,
}

impl InstructionsRetriever {
    /// Index an in-memory guidance text
    pub async fn build(
        text: &str,
        source: impl Into<String>,
        embedder: Arc<dyn EmbeddingModel>,
        chunker: &TextChunker,
        top_k: usize,
    ) -> Result<Self, RetrievalError> {
        let passages = chunker.chunk(text);
        let embeddings = if passages.is_empty() {
            Vec::new()
        } else {
            embedder.embed_batch(&passages).await?
        };

        let mut index = VectorIndex::new(embedder.dimension(), passages.len());
        for (id, embedding) in embeddings.iter().enumerate() {
            index.add(id, embedding)?;
        }

        let source = source.into();
        info!(source = %source, passages = passages.len(), "Guidance index built");

        Ok(Self {
            passages,
            index,
            embedder,
            top_k,
            source,
        })
    }

    /// Read and index a guidance file
    pub async fn from_file(
        path: &Path,
        embedder: Arc<dyn EmbeddingModel>,
        chunker: &TextChunker,
        top_k: usize,
    ) -> Result<Self, RetrievalError> {
        let text = std::fs::read_to_string(path)?;
        Self::build(&text, path.display().to_string(), embedder, chunker, top_k).await
    }

    /// Number of indexed passages
    pub fn len(&self) -> usize {
        self.passages.len()
    }

    /// Whether the corpus is empty
    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }
}

#[async_trait]
impl Retriever for InstructionsRetriever {
    type Error = RetrievalError;

    fn kind(&self) -> RetrieverKind {
        RetrieverKind::Instructions
    }

    #[instrument(skip(self, query), fields(source = %self.source))]
    async fn retrieve(&self, query: &str) -> Result<Vec<EvidenceDocument>, RetrievalError> {
        if self.index.is_empty() {
            return Ok(Vec::new());
        }

        let embedding = match self.embedder.embed(query).await {
            Ok(embedding) => embedding,
            // Nothing embeddable in the query, so nothing can be similar to it
            Err(EmbeddingError::InvalidInput(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let hits = self
            .index
            .search(&embedding, self.top_k, DEFAULT_EF_SEARCH)?;
        debug!(hits = hits.len(), "Guidance search complete");

        Ok(hits
            .into_iter()
            .filter_map(|(chunk, similarity)| {
                self.passages.get(chunk).map(|text| {
                    EvidenceDocument::Instructions(InstructionEvidence {
                        text: text.clone(),
                        chunk,
                        similarity,
                        source: self.source.clone(),
                    })
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChunkStrategy;
    use txrisk_store::HashingEmbeddingModel;

    const GUIDANCE: &str = "Sanctions screening: check sender and receiver against sanctions lists.\n\n\
        Structuring: repeated cash deposits just below reporting thresholds.\n\n\
        Shell companies: opaque ownership and offshore registration raise risk.";

    async fn retriever(top_k: usize) -> InstructionsRetriever {
        InstructionsRetriever::build(
            GUIDANCE,
            "guidance.md",
            Arc::new(HashingEmbeddingModel::new(256)),
            &TextChunker::new(ChunkStrategy::ByParagraph, 80),
            top_k,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn builds_one_passage_per_paragraph() {
        assert_eq!(retriever(2).await.len(), 3);
    }

    #[tokio::test]
    async fn best_passage_ranks_first() {
        let retriever = retriever(2).await;
        let documents = retriever
            .retrieve("cash deposits below reporting thresholds")
            .await
            .unwrap();

        assert_eq!(documents.len(), 2);
        assert!(documents[0].content().starts_with("Structuring"));
        let EvidenceDocument::Instructions(top) = &documents[0] else {
            panic!("expected instruction evidence");
        };
        assert_eq!(top.chunk, 1);
        assert_eq!(top.source, "guidance.md");
    }

    #[tokio::test]
    async fn unembeddable_query_returns_nothing() {
        let retriever = retriever(2).await;
        assert!(retriever.retrieve("  ... ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_corpus_returns_nothing() {
        let retriever = InstructionsRetriever::build(
            "",
            "empty.md",
            Arc::new(HashingEmbeddingModel::new(64)),
            &TextChunker::new(ChunkStrategy::ByParagraph, 80),
            4,
        )
        .await
        .unwrap();

        assert!(retriever.is_empty());
        assert!(retriever.retrieve("anything").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let result = InstructionsRetriever::from_file(
            Path::new("/nonexistent/guidance.md"),
            Arc::new(HashingEmbeddingModel::new(64)),
            &TextChunker::new(ChunkStrategy::ByParagraph, 80),
            4,
        )
        .await;
        assert!(matches!(result, Err(RetrievalError::Io(_))));
    }
}
