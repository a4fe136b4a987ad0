//! The canonical transaction verdict

use serde::{Deserialize, Serialize};

/// Sentinel the model uses for fields it cannot determine
pub const NOT_AVAILABLE: &str = "N/A";

/// Prefix of the note that carries the model's reasoning trace
pub const THOUGHT_PROCESS_PREFIX: &str = "Thought process: ";

/// Structured risk verdict for one transaction
///
/// Field names serialize in camelCase, matching the JSON contract the
/// reasoning model is prompted with and the stored representation.
/// `Default` yields the type-appropriate zero value of every field, which is
/// what a reply without a JSON block degrades to.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionAnalysis {
    /// Originating party
    pub sender: String,

    /// Receiving party
    pub receiver: String,

    /// Amount as written by the model (may be `N/A`)
    pub amount: String,

    /// Currency code or name (may be `N/A`)
    pub currency: String,

    /// Kind of transaction, e.g. "Funds Transfer"
    pub transaction_type: String,

    /// Date as written by the model (may be `N/A`)
    pub transaction_date: String,

    /// Risk score in `0..=100`
    pub risk_score: u8,

    /// Categorical risk level, e.g. "Moderate Risk"
    pub risk_level: String,

    /// Model confidence in `0.0..=1.0`
    pub confidence_score: f64,

    /// Entity category, e.g. "Corporation"
    pub category: String,

    /// Free-form notes; the reasoning trace, when present, is always last
    pub notes: Vec<String>,
}

impl TransactionAnalysis {
    /// Append the reasoning trace as the final note
    ///
    /// The trace is trimmed; an empty trace appends nothing.
    pub fn append_reasoning(&mut self, trace: &str) {
        let trace = trace.trim();
        if trace.is_empty() {
            return;
        }
        self.notes.push(format!("{THOUGHT_PROCESS_PREFIX}{trace}"));
    }

    /// The reasoning trace carried in the last note, if any
    pub fn reasoning(&self) -> Option<&str> {
        self.notes
            .last()
            .and_then(|note| note.strip_prefix(THOUGHT_PROCESS_PREFIX))
    }
}
