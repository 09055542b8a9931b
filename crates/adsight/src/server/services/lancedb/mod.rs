//! LanceDB implementation of the VectorDatabase trait
//!
//! Persists similarity records in a local LanceDB table so retrieval survives
//! server restarts.

pub mod records;
pub mod search;

use anyhow::{anyhow, Result};
use arrow::record_batch::RecordBatchIterator;
use async_trait::async_trait;
use lancedb::{connect, Connection, Table};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::server::services::vector_database::{NearestMatch, SimilarityRecord, VectorDatabase};
use records::records_to_arrow_batch;
use search::search_nearest;

pub const DEFAULT_TABLE_NAME: &str = "ad_insights";

pub struct LanceDbVectorDatabase {
  connection: Connection,
  table_name: String,
  /// Serializes delete-then-add so replacement stays last-write-wins
  write_lock: Mutex<()>,
}

impl LanceDbVectorDatabase {
  /// Open (or create) the database directory
  pub async fn new(data_dir: PathBuf, table_name: &str) -> Result<Self> {
    ensure_data_directory_exists(&data_dir)?;

    let connection = connect(&data_dir.to_string_lossy())
      .execute()
      .await
      .map_err(|e| anyhow!("Failed to connect to LanceDB: {}", e))?;

    tracing::info!(path = %data_dir.display(), table = table_name, "Opened LanceDB store");
    Ok(Self { connection, table_name: table_name.to_string(), write_lock: Mutex::new(()) })
  }

  async fn table_exists(&self) -> Result<bool> {
    let tables = self
      .connection
      .table_names()
      .execute()
      .await
      .map_err(|e| anyhow!("Failed to list tables: {}", e))?;
    Ok(tables.contains(&self.table_name))
  }

  async fn open_table(&self) -> Result<Table> {
    self
      .connection
      .open_table(&self.table_name)
      .execute()
      .await
      .map_err(|e| anyhow!("Failed to open table '{}': {}", self.table_name, e))
  }

  async fn create_table_with_first_record(&self, record: &SimilarityRecord) -> Result<()> {
    let batch = records_to_arrow_batch(std::slice::from_ref(record))?;
    let schema = batch.schema();
    let batch_iter = RecordBatchIterator::new(vec![Ok(batch)], schema);

    self
      .connection
      .create_table(&self.table_name, batch_iter)
      .execute()
      .await
      .map_err(|e| anyhow!("Failed to create table with first record: {}", e))?;

    tracing::info!(table = %self.table_name, id = %record.id, "Created similarity table");
    Ok(())
  }

  async fn replace_record(&self, table: &Table, record: &SimilarityRecord) -> Result<()> {
    table
      .delete(&format!("id = '{}'", escape_literal(&record.id)))
      .await
      .map_err(|e| anyhow!("Failed to remove previous record: {}", e))?;

    let batch = records_to_arrow_batch(std::slice::from_ref(record))?;
    let schema = batch.schema();
    let batch_iter = RecordBatchIterator::new(vec![Ok(batch)], schema);

    table
      .add(batch_iter)
      .execute()
      .await
      .map_err(|e| anyhow!("Failed to store record: {}", e))?;
    Ok(())
  }
}

#[async_trait]
impl VectorDatabase for LanceDbVectorDatabase {
  async fn query_nearest(&self, query_embedding: &[f32]) -> Result<Option<NearestMatch>> {
    if !self.table_exists().await? {
      return Ok(None);
    }
    let table = self.open_table().await?;
    search_nearest(&table, query_embedding).await
  }

  async fn insert(&self, record: SimilarityRecord) -> Result<()> {
    let _guard = self.write_lock.lock().await;

    if self.table_exists().await? {
      let table = self.open_table().await?;
      self.replace_record(&table, &record).await
    } else {
      self.create_table_with_first_record(&record).await
    }
  }

  async fn count(&self) -> Result<usize> {
    if !self.table_exists().await? {
      return Ok(0);
    }
    let table = self.open_table().await?;
    Ok(table.count_rows(None).await?)
  }
}

fn ensure_data_directory_exists(data_dir: &Path) -> Result<()> {
  if !data_dir.exists() {
    std::fs::create_dir_all(data_dir)
      .map_err(|e| anyhow!("Failed to create data directory: {}", e))?;
  }
  Ok(())
}

/// Quote-escape a value for a SQL string literal
fn escape_literal(value: &str) -> String {
  value.replace('\'', "''")
}

#[cfg(test)]
mod tests {
  use super::*;

  fn record(id: &str, embedding: Vec<f32>, document: &str) -> SimilarityRecord {
    SimilarityRecord { id: id.to_string(), embedding, document: document.to_string() }
  }

  #[tokio::test]
  async fn test_persisted_records_are_queryable_and_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let db = LanceDbVectorDatabase::new(dir.path().join("db"), "test_insights").await.unwrap();

    assert!(db.query_nearest(&[1.0, 0.0, 0.0]).await.unwrap().is_none());
    assert_eq!(db.count().await.unwrap(), 0);

    db.insert(record("a", vec![1.0, 0.0, 0.0], "first")).await.unwrap();
    db.insert(record("b", vec![0.0, 1.0, 0.0], "second")).await.unwrap();
    db.insert(record("a", vec![1.0, 0.0, 0.0], "first, revised")).await.unwrap();

    assert_eq!(db.count().await.unwrap(), 2);
    let nearest = db.query_nearest(&[0.9, 0.1, 0.0]).await.unwrap().unwrap();
    assert_eq!(nearest.id, "a");
    assert_eq!(nearest.document, "first, revised");
  }

  #[test]
  fn test_escape_literal() {
    assert_eq!(escape_literal("it's"), "it''s");
  }
}
