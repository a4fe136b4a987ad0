//! Weighted rank fusion
//!
//! Each retriever's documents score `weight / (rank + rank_constant)` where
//! `rank` is the 1-based position in that retriever's own list. All
//! documents are pooled and sorted by score. Documents from different
//! retrievers are never merged, even when their text is similar.
//!
//! Equal scores are ordered by retriever priority (sanctions, then wiki, then
//! instructions) and then by rank.

use crate::RetrievalError;
use serde::{Deserialize, Serialize};
use txrisk_domain::{EvidenceDocument, RetrieverKind};

/// Default rank constant; `1 / (rank + 1)` decay
pub const DEFAULT_RANK_CONSTANT: f64 = 1.0;

/// The documents one retriever returned, best first
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalResult {
    /// Retriever that produced the documents
    pub source: RetrieverKind,
    /// Documents in the retriever's own order
    pub documents: Vec<EvidenceDocument>,
}

impl RetrievalResult {
    /// Create a result
    pub fn new(source: RetrieverKind, documents: Vec<EvidenceDocument>) -> Self {
        Self { source, documents }
    }

    /// An empty result, used when a source contributed nothing
    pub fn empty(source: RetrieverKind) -> Self {
        Self::new(source, Vec::new())
    }
}

/// A document with its fused score
#[derive(Debug, Clone, PartialEq)]
pub struct FusedDocument {
    /// The evidence
    pub document: EvidenceDocument,
    /// Aggregate fusion score
    pub score: f64,
    /// Retriever that produced it
    pub source: RetrieverKind,
    /// 1-based rank within its retriever
    pub rank: usize,
}

/// Per-retriever fusion weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleWeights {
    /// Sanctions-matching weight
    pub sanctions: f64,
    /// Encyclopedic weight
    pub wiki: f64,
    /// Guidance corpus weight
    pub instructions: f64,
}

impl Default for EnsembleWeights {
    fn default() -> Self {
        Self {
            sanctions: 0.5,
            wiki: 0.25,
            instructions: 0.25,
        }
    }
}

impl EnsembleWeights {
    /// Weight for one retriever
    pub fn for_kind(&self, kind: RetrieverKind) -> f64 {
        match kind {
            RetrieverKind::Sanctions => self.sanctions,
            RetrieverKind::Wiki => self.wiki,
            RetrieverKind::Instructions => self.instructions,
        }
    }

    /// Weights lined up with `results`
    pub fn aligned(&self, results: &[RetrievalResult]) -> Vec<f64> {
        results.iter().map(|r| self.for_kind(r.source)).collect()
    }

    /// Validate the weights
    pub fn validate(&self) -> Result<(), RetrievalError> {
        validate_weights(&[self.sanctions, self.wiki, self.instructions])
    }
}

fn validate_weights(weights: &[f64]) -> Result<(), RetrievalError> {
    if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(RetrievalError::Configuration(format!(
            "Fusion weights must be finite and non-negative, got {}",
            bad
        )));
    }
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Err(RetrievalError::Configuration(
            "Fusion weights must sum to a positive value".to_string(),
        ));
    }
    Ok(())
}

/// Fuse ranked results into one list, highest score first
///
/// `weights[i]` applies to `results[i]`.
pub fn fuse(
    results: Vec<RetrievalResult>,
    weights: &[f64],
    rank_constant: f64,
) -> Result<Vec<FusedDocument>, RetrievalError> {
    if results.len() != weights.len() {
        return Err(RetrievalError::Configuration(format!(
            "Expected {} fusion weights, got {}",
            results.len(),
            weights.len()
        )));
    }
    validate_weights(weights)?;
    if !rank_constant.is_finite() || rank_constant < 0.0 {
        return Err(RetrievalError::Configuration(format!(
            "Rank constant must be finite and non-negative, got {}",
            rank_constant
        )));
    }

    let mut fused: Vec<FusedDocument> = results
        .into_iter()
        .zip(weights)
        .flat_map(|(result, &weight)| {
            let source = result.source;
            result
                .documents
                .into_iter()
                .enumerate()
                .map(move |(position, document)| {
                    let rank = position + 1;
                    FusedDocument {
                        document,
                        score: weight / (rank as f64 + rank_constant),
                        source,
                        rank,
                    }
                })
        })
        .collect();

    fused.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(a.source.cmp(&b.source))
            .then(a.rank.cmp(&b.rank))
    });

    Ok(fused)
}
