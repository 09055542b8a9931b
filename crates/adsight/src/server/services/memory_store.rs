//! Process-lifetime vector database

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;

use super::embeddings::squared_l2;
use super::vector_database::{NearestMatch, SimilarityRecord, VectorDatabase};

/// In-memory collection with exhaustive nearest-neighbour search
#[derive(Default)]
pub struct InMemoryVectorDatabase {
  records: RwLock<Vec<SimilarityRecord>>,
}

impl InMemoryVectorDatabase {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl VectorDatabase for InMemoryVectorDatabase {
  async fn query_nearest(&self, query_embedding: &[f32]) -> Result<Option<NearestMatch>> {
    let records = self.records.read().await;

    let mut nearest: Option<(&SimilarityRecord, f32)> = None;
    for record in records.iter() {
      if record.embedding.len() != query_embedding.len() {
        return Err(anyhow!(
          "Dimension mismatch: stored {} vs query {}",
          record.embedding.len(),
          query_embedding.len()
        ));
      }
      let distance = squared_l2(&record.embedding, query_embedding);
      if nearest.map_or(true, |(_, best)| distance < best) {
        nearest = Some((record, distance));
      }
    }

    Ok(nearest.map(|(record, distance)| NearestMatch {
      id: record.id.clone(),
      document: record.document.clone(),
      distance,
    }))
  }

  async fn insert(&self, record: SimilarityRecord) -> Result<()> {
    let mut records = self.records.write().await;
    match records.iter_mut().find(|existing| existing.id == record.id) {
      Some(existing) => *existing = record,
      None => records.push(record),
    }
    Ok(())
  }

  async fn count(&self) -> Result<usize> {
    Ok(self.records.read().await.len())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn record(id: &str, embedding: Vec<f32>, document: &str) -> SimilarityRecord {
    SimilarityRecord { id: id.to_string(), embedding, document: document.to_string() }
  }

  #[tokio::test]
  async fn test_empty_database_has_no_nearest() {
    let db = InMemoryVectorDatabase::new();
    assert!(db.query_nearest(&[1.0, 0.0]).await.unwrap().is_none());
    assert!(db.query_nearest(&[]).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn test_nearest_record_is_returned() {
    let db = InMemoryVectorDatabase::new();
    db.insert(record("a", vec![1.0, 0.0], "first")).await.unwrap();
    db.insert(record("b", vec![0.0, 1.0], "second")).await.unwrap();

    let nearest = db.query_nearest(&[0.1, 0.9]).await.unwrap().unwrap();
    assert_eq!(nearest.id, "b");
    assert_eq!(nearest.document, "second");
    assert!((nearest.distance - 0.02).abs() < 1e-5);
  }

  #[tokio::test]
  async fn test_same_id_is_last_write_wins() {
    let db = InMemoryVectorDatabase::new();
    db.insert(record("same", vec![1.0, 0.0], "old")).await.unwrap();
    db.insert(record("same", vec![1.0, 0.0], "new")).await.unwrap();

    assert_eq!(db.count().await.unwrap(), 1);
    let nearest = db.query_nearest(&[1.0, 0.0]).await.unwrap().unwrap();
    assert_eq!(nearest.document, "new");
  }

  #[tokio::test]
  async fn test_dimension_mismatch_is_an_error() {
    let db = InMemoryVectorDatabase::new();
    db.insert(record("a", vec![1.0, 0.0, 0.0], "doc")).await.unwrap();
    assert!(db.query_nearest(&[1.0, 0.0]).await.is_err());
  }
}
