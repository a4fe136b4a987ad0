//! Caller input and the persisted transaction record

use crate::analysis::TransactionAnalysis;
use serde::{Deserialize, Serialize};

/// Number of characters of uploaded content kept in a generated description
pub const UPLOAD_PREVIEW_CHARS: usize = 50;

/// What a caller submits for analysis
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransactionInput {
    /// Free-text description
    #[serde(default)]
    pub description: String,

    /// Text of an uploaded file, if any
    #[serde(default)]
    pub file_content: Option<String>,
}

impl TransactionInput {
    /// Create an input from a description and optional uploaded content
    pub fn new(description: impl Into<String>, file_content: Option<String>) -> Self {
        Self {
            description: description.into(),
            file_content,
        }
    }

    /// Uploaded content, when present and non-empty
    pub fn file(&self) -> Option<&str> {
        self.file_content.as_deref().filter(|content| !content.is_empty())
    }

    /// The text that is analyzed
    ///
    /// Uploaded content takes precedence over the description whenever it is
    /// present, not only when the description is empty. The result is
    /// lower-cased before retrieval and inference.
    ///
    /// # Examples
    ///
    /// ```
    /// use txrisk_domain::TransactionInput;
    ///
    /// let input = TransactionInput::new("ignored", Some("Wire to ACME".to_string()));
    /// assert_eq!(input.effective_text(), "wire to acme");
    /// ```
    pub fn effective_text(&self) -> String {
        self.file().unwrap_or(&self.description).to_lowercase()
    }

    /// True when there is nothing to analyze
    pub fn is_blank(&self) -> bool {
        self.file().unwrap_or(&self.description).trim().is_empty()
    }

    /// Description recorded with the transaction
    ///
    /// An empty description with uploaded content becomes
    /// `"File upload: "` followed by the first 50 characters of the
    /// case-folded content and an ellipsis.
    pub fn stored_description(&self) -> String {
        match self.file() {
            Some(content) if self.description.is_empty() => {
                let preview: String = content
                    .to_lowercase()
                    .chars()
                    .take(UPLOAD_PREVIEW_CHARS)
                    .collect();
                format!("File upload: {preview}...")
            }
            _ => self.description.clone(),
        }
    }

    /// Raw content recorded with the transaction (not case-folded)
    pub fn original_content(&self) -> String {
        self.file().unwrap_or(&self.description).to_string()
    }
}

/// A persisted transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Generated identifier (UUIDv4)
    pub id: String,

    /// Description shown to users
    pub description: String,

    /// Creation time, RFC 3339
    pub timestamp: String,

    /// Content that was submitted
    pub original_content: Option<String>,
}

impl TransactionRecord {
    /// Build a record for an input with a fresh identifier
    pub fn from_input(input: &TransactionInput, timestamp: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            description: input.stored_description(),
            timestamp: timestamp.into(),
            original_content: Some(input.original_content()),
        }
    }
}

/// A transaction together with its analysis, as loaded from storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAnalysis {
    /// The transaction
    pub transaction: TransactionRecord,

    /// Its analysis
    pub analysis: TransactionAnalysis,

    /// Whether the analysis came from a reply without a JSON verdict
    pub degraded: bool,
}
