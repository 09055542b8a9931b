//! Vector database abstraction layer for similarity records
//!
//! This module provides a generic interface for vector database operations,
//! allowing different implementations (in-memory, LanceDB) to be swapped
//! without changing the agent pipeline.

use anyhow::Result;
use async_trait::async_trait;

/// A stored (summary embedding -> generated insight) pair
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityRecord {
  /// Summary hash of the summary the insight was generated for
  pub id: String,
  pub embedding: Vec<f32>,
  /// Generated insight text
  pub document: String,
}

/// Closest stored record to a query vector
#[derive(Debug, Clone, PartialEq)]
pub struct NearestMatch {
  pub id: String,
  pub document: String,
  /// Squared Euclidean distance to the query (0.0 is identical)
  pub distance: f32,
}

/// Vector database interface for storing and querying similarity records
#[async_trait]
pub trait VectorDatabase: Send + Sync {
  /// Nearest stored record, or None when the database is empty
  async fn query_nearest(&self, query_embedding: &[f32]) -> Result<Option<NearestMatch>>;

  /// Store a record; a record with the same id is replaced
  async fn insert(&self, record: SimilarityRecord) -> Result<()>;

  /// Number of stored records
  async fn count(&self) -> Result<usize>;
}
