//! Pipeline output types

use serde::Serialize;
use txrisk_domain::{RetrieverKind, TransactionAnalysis};

/// Per-source evidence counts for one analysis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSummary {
    /// Sanctions documents retrieved
    pub sanctions: usize,
    /// Encyclopedic documents retrieved
    pub wiki: usize,
    /// Guidance passages retrieved
    pub instructions: usize,
    /// Documents that made it into the prompt
    pub context_documents: usize,
    /// Documents the context guard left out
    pub context_dropped: usize,
}

impl SourceSummary {
    pub(crate) fn record(&mut self, kind: RetrieverKind, count: usize) {
        match kind {
            RetrieverKind::Sanctions => self.sanctions += count,
            RetrieverKind::Wiki => self.wiki += count,
            RetrieverKind::Instructions => self.instructions += count,
        }
    }

    /// Documents retrieved across all sources
    pub fn total(&self) -> usize {
        self.sanctions + self.wiki + self.instructions
    }
}

/// Result of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisOutcome {
    /// The verdict
    pub analysis: TransactionAnalysis,
    /// The reply had no JSON block and `analysis` is the empty default
    pub degraded: bool,
    /// Where the evidence came from
    pub sources: SourceSummary,
}
