//! txrisk Domain Layer
//!
//! Core types and trait seams for transaction risk analysis. Everything
//! that crosses a crate boundary (the canonical verdict, evidence documents,
//! persisted transaction records) is defined here, together with the traits
//! the infrastructure crates implement.
//!
//! ## Key Concepts
//!
//! - **Transaction Analysis**: The canonical verdict produced for one input
//! - **Evidence Document**: A piece of retrieved context, tagged by the
//!   retriever that produced it
//! - **Query Hints**: `Company:` / `Person:` markers embedded in free text
//! - **Transaction Input**: Caller input and the rules that pick the text to analyze
//!
//! ## Architecture
//!
//! - Pure data and rules only, no I/O
//! - Infrastructure implementations live in other crates
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod evidence;
pub mod query;
pub mod traits;
pub mod transaction;

// Re-exports for convenience
pub use analysis::{TransactionAnalysis, NOT_AVAILABLE, THOUGHT_PROCESS_PREFIX};
pub use evidence::{
    EvidenceDocument, InstructionEvidence, RetrieverKind, SanctionsEvidence, WikiEvidence,
};
pub use query::QueryHints;
pub use transaction::{StoredAnalysis, TransactionInput, TransactionRecord};
