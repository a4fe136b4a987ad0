//! txrisk Storage Layer
//!
//! Implements the `AnalysisStore` trait on SQLite and hosts the embedding
//! models and vector index used by the guidance retriever.
//!
//! # Architecture
//!
//! - SQLite for transactions and their analyses (two tables, linked 1:1)
//! - HNSW for nearest-neighbour search over the guidance corpus
//! - Pluggable embedding models (offline hashing, remote HTTP)
//!
//! # Examples
//!
//! ```
//! use txrisk_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for analysis records
//! ```

#![warn(missing_docs)]

pub mod embedding;
pub mod vector_index;

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};
use txrisk_domain::traits::AnalysisStore;
use txrisk_domain::{StoredAnalysis, TransactionAnalysis, TransactionRecord};

pub use embedding::{
    cosine_similarity, EmbeddingError, EmbeddingModel, HashingEmbeddingModel,
    HttpEmbeddingModel,
};
pub use vector_index::{VectorIndex, VectorIndexError};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A transaction exists without its analysis
    #[error("Analysis not found for transaction {0}")]
    MissingAnalysis(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// SQLite-based implementation of AnalysisStore
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Share a store behind a mutex or
/// give each thread its own instance.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(include_str!("schema.sql"))?;
        Ok(())
    }

    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<TransactionRecord> {
        Ok(TransactionRecord {
            id: row.get(0)?,
            description: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            timestamp: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            original_content: row.get(3)?,
        })
    }
}

impl AnalysisStore for SqliteStore {
    type Error = StoreError;

    fn save(
        &mut self,
        transaction: &TransactionRecord,
        analysis: &TransactionAnalysis,
        degraded: bool,
    ) -> Result<(), Self::Error> {
        let analysis_json = serde_json::to_string(analysis)
            .map_err(|e| StoreError::InvalidData(format!("Failed to encode analysis: {}", e)))?;

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO transactions (id, description, timestamp, original_content)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                &transaction.id,
                &transaction.description,
                &transaction.timestamp,
                &transaction.original_content,
            ],
        )?;
        tx.execute(
            "INSERT INTO analyses (transaction_id, analysis, degraded) VALUES (?1, ?2, ?3)",
            params![&transaction.id, &analysis_json, degraded],
        )?;
        tx.commit()?;
        debug!(id = %transaction.id, degraded, "Analysis stored");

        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<TransactionRecord>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, description, timestamp, original_content FROM transactions
             ORDER BY timestamp DESC, rowid DESC LIMIT ?1",
        )?;

        let records = stmt
            .query_map(params![limit as i64], Self::row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn load(&self, id: &str) -> Result<Option<StoredAnalysis>, Self::Error> {
        let transaction = self
            .conn
            .query_row(
                "SELECT id, description, timestamp, original_content FROM transactions WHERE id = ?1",
                params![id],
                Self::row_to_record,
            )
            .optional()?;

        let Some(transaction) = transaction else {
            return Ok(None);
        };

        let (analysis_json, degraded): (String, bool) = self
            .conn
            .query_row(
                "SELECT analysis, degraded FROM analyses WHERE transaction_id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?
            .ok_or_else(|| {
                warn!(id, "Transaction has no analysis row");
                StoreError::MissingAnalysis(id.to_string())
            })?;

        let analysis: TransactionAnalysis = serde_json::from_str(&analysis_json)
            .map_err(|e| StoreError::InvalidData(format!("Stored analysis is not valid: {}", e)))?;

        Ok(Some(StoredAnalysis {
            transaction,
            analysis,
            degraded,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, timestamp: &str) -> TransactionRecord {
        TransactionRecord {
            id: id.to_string(),
            description: format!("payment {id}"),
            timestamp: timestamp.to_string(),
            original_content: Some(format!("Payment {id}")),
        }
    }

    #[test]
    fn test_load_missing_transaction() {
        let store = SqliteStore::new(":memory:").unwrap();
        assert!(store.load("nope").unwrap().is_none());
    }

    #[test]
    fn test_transaction_without_analysis() {
        let store = SqliteStore::new(":memory:").unwrap();
        store
            .conn
            .execute(
                "INSERT INTO transactions (id, description, timestamp, original_content)
                 VALUES ('t1', 'd', '2026-01-01T00:00:00Z', NULL)",
                [],
            )
            .unwrap();

        assert!(matches!(
            store.load("t1"),
            Err(StoreError::MissingAnalysis(id)) if id == "t1"
        ));
    }

    #[test]
    fn test_duplicate_id_rolls_back() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        let analysis = TransactionAnalysis::default();
        store
            .save(&record("t1", "2026-01-01T00:00:00Z"), &analysis, false)
            .unwrap();

        let result = store.save(&record("t1", "2026-01-02T00:00:00Z"), &analysis, false);
        assert!(matches!(result, Err(StoreError::Database(_))));
        assert_eq!(store.recent(10).unwrap().len(), 1);
    }

    #[test]
    fn test_recent_is_newest_first_and_limited() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        let analysis = TransactionAnalysis::default();
        for day in 1..=12 {
            let ts = format!("2026-01-{day:02}T00:00:00Z");
            store.save(&record(&format!("t{day}"), &ts), &analysis, false).unwrap();
        }

        let recent = store.recent(10).unwrap();
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].id, "t12");
        assert_eq!(recent[9].id, "t3");
    }
}
