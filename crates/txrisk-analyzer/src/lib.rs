//! txrisk Analyzer
//!
//! Turns a transaction description into a structured sanctions-risk verdict.
//!
//! # Architecture
//!
//! ```text
//! input → retrievers (concurrent) → fuse → format_context → prompt → model
//!       → ResponseParser → TransactionAnalysis
//! ```
//!
//! The [`AnalyzerContext`] owns everything built once per process (model
//! client, HTTP clients, the guidance index). The [`Analyzer`] facade is
//! stateless between calls.
//!
//! # Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use txrisk_analyzer::{Analyzer, AnalyzerConfig, AnalyzerContext};
//! use txrisk_llm::MockProvider;
//! use txrisk_retrieval::{InstructionsRetriever, SharedRetriever, TextChunker, ChunkStrategy};
//! use txrisk_store::HashingEmbeddingModel;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let guidance: SharedRetriever = Arc::new(
//!     InstructionsRetriever::build(
//!         "Screen both parties against sanctions lists.",
//!         "guidance.md",
//!         Arc::new(HashingEmbeddingModel::new(256)),
//!         &TextChunker::new(ChunkStrategy::ByParagraph, 1000),
//!         4,
//!     )
//!     .await?,
//! );
//! let model = MockProvider::new("```json\n{\"notes\": []}\n```");
//! let context = AnalyzerContext::new(vec![guidance], Arc::new(model), AnalyzerConfig::lenient())?;
//!
//! let analyzer = Analyzer::new(Arc::new(context));
//! let analysis = analyzer
//!     .analyze_transaction_text("Company: Acme Ltd, Person: Ivan Petrov", None)
//!     .await?;
//! println!("risk score: {}", analysis.risk_score);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod analyzer;
mod config;
mod context;
mod error;
mod invoker;
pub mod parser;
mod prompt;
mod types;


pub use analyzer::Analyzer;
pub use config::{AnalyzerConfig, PipelineConfig};
pub use context::AnalyzerContext;
pub use error::AnalysisError;
pub use invoker::Invoker;
pub use parser::{ParsedResponse, ResponseParser};
pub use prompt::PromptBuilder;
pub use types::{AnalysisOutcome, SourceSummary};
