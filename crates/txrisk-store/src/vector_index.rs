//! HNSW Vector Index for Semantic Search
//!
//! A wrapper around the HNSW algorithm for nearest-neighbor search over
//! embedding vectors keyed by caller-chosen `usize` ids (chunk positions for
//! the guidance corpus).
//!
//! The index is only mutated while it is built (`add` takes `&mut self`).
//! Afterwards it is read through `&self`, so a built index can be shared
//! behind an `Arc` and searched from many tasks without a lock.
//!
//! # HNSW Parameters
//!
//! - **M**: Number of bi-directional links per node (default: 16)
//!   Higher M = better accuracy but more memory
//! - **efConstruction**: Size of dynamic candidate list during construction (default: 200)
//!   Higher efConstruction = better index quality but slower build
//! - **efSearch**: Size of dynamic candidate list during search (default: 64)
//!   Higher efSearch = better recall but slower queries

use hnsw_rs::prelude::*;
use thiserror::Error;

const DEFAULT_M: usize = 16;
const DEFAULT_EF_CONSTRUCTION: usize = 200;

/// Default search breadth
pub const DEFAULT_EF_SEARCH: usize = 64;

/// Errors that can occur during vector index operations
#[derive(Error, Debug)]
pub enum VectorIndexError {
    /// Invalid embedding dimension
    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension provided
        actual: usize,
    },

    /// More vectors than the index was sized for
    #[error("Index is full ({0} vectors)")]
    CapacityExceeded(usize),
}

/// A wrapper around HNSW for vector similarity search
///
/// # Examples
///
/// ```
/// use txrisk_store::vector_index::VectorIndex;
///
/// let mut index = VectorIndex::new(3, 10);
/// index.add(7, &[1.0, 0.0, 0.0]).unwrap();
///
/// let results = index.search(&[1.0, 0.0, 0.0], 5, 64).unwrap();
/// assert_eq!(results[0].0, 7);
/// ```
pub struct VectorIndex {
    dimension: usize,
    capacity: usize,
    hnsw: Hnsw<'static, f32, DistCosine>,
    len: usize,
}

impl VectorIndex {
    /// Create a new vector index
    ///
    /// # Parameters
    ///
    /// - `dimension`: Embedding vector dimension
    /// - `capacity`: Maximum number of vectors
    pub fn new(dimension: usize, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        // Calculate number of layers based on expected data size
        let nb_layer = 16.min((capacity as f32).ln().trunc() as usize).max(1);

        let hnsw = Hnsw::<'static, f32, DistCosine>::new(
            DEFAULT_M,
            capacity,
            nb_layer,
            DEFAULT_EF_CONSTRUCTION,
            DistCosine {},
        );

        Self {
            dimension,
            capacity,
            hnsw,
            len: 0,
        }
    }

    /// Add an embedding under `id`
    pub fn add(&mut self, id: usize, embedding: &[f32]) -> Result<(), VectorIndexError> {
        self.check_dimension(embedding)?;
        if self.len >= self.capacity {
            return Err(VectorIndexError::CapacityExceeded(self.capacity));
        }

        let embedding_vec = embedding.to_vec();
        self.hnsw.insert((&embedding_vec, id));
        self.len += 1;

        Ok(())
    }

    /// Search for the k nearest neighbors to the given embedding
    ///
    /// Returns `(id, similarity)` pairs sorted by similarity, highest first.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        ef_search: usize,
    ) -> Result<Vec<(usize, f32)>, VectorIndexError> {
        self.check_dimension(query)?;
        if self.len == 0 || k == 0 {
            return Ok(Vec::new());
        }

        let mut results: Vec<(usize, f32)> = self
            .hnsw
            .search(query, k, ef_search.max(k))
            .into_iter()
            // HNSW returns cosine distance; convert to similarity
            .map(|neighbour| (neighbour.d_id, 1.0 - neighbour.distance))
            .collect();

        results.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        results.truncate(k);
        Ok(results)
    }

    /// Number of vectors in the index
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Embedding dimension
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn check_dimension(&self, embedding: &[f32]) -> Result<(), VectorIndexError> {
        if embedding.len() != self.dimension {
            return Err(VectorIndexError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }
        Ok(())
    }
}
