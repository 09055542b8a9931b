//! Arrow RecordBatch conversion for similarity records

use anyhow::{anyhow, Result};
use arrow::array::{Array, FixedSizeListBuilder, Float32Array, Float32Builder, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::Utc;
use std::sync::Arc;

use crate::server::services::vector_database::SimilarityRecord;

/// Convert similarity records to a single RecordBatch
///
/// All records must share one embedding dimension; it fixes the column type.
pub fn records_to_arrow_batch(records: &[SimilarityRecord]) -> Result<RecordBatch> {
  let dimension = embedding_dimension(records)?;
  let schema = similarity_record_schema(dimension);

  let stored_at = Utc::now().to_rfc3339();
  let ids = StringArray::from_iter_values(records.iter().map(|r| r.id.as_str()));
  let documents = StringArray::from_iter_values(records.iter().map(|r| r.document.as_str()));
  let created = StringArray::from_iter_values(records.iter().map(|_| stored_at.as_str()));
  let embeddings = embedding_array(records, dimension);

  let columns: Vec<Arc<dyn Array>> =
    vec![Arc::new(ids), Arc::new(documents), Arc::new(embeddings), Arc::new(created)];

  RecordBatch::try_new(schema, columns).map_err(|e| anyhow!("Failed to create RecordBatch: {}", e))
}

/// Arrow schema of the similarity table
pub fn similarity_record_schema(dimension: usize) -> Arc<Schema> {
  Arc::new(Schema::new(vec![
    Field::new("id", DataType::Utf8, false),
    Field::new("document", DataType::Utf8, false),
    Field::new(
      "embedding",
      DataType::FixedSizeList(
        Arc::new(Field::new("item", DataType::Float32, true)),
        dimension as i32,
      ),
      false,
    ),
    Field::new("created_at", DataType::Utf8, false),
  ]))
}

fn embedding_dimension(records: &[SimilarityRecord]) -> Result<usize> {
  let first = records.first().ok_or_else(|| anyhow!("Cannot create RecordBatch from empty records"))?;
  let dimension = first.embedding.len();
  if dimension == 0 {
    return Err(anyhow!("Cannot store an empty embedding"));
  }
  if records.iter().any(|r| r.embedding.len() != dimension) {
    return Err(anyhow!("All embeddings in a batch must have {} dimensions", dimension));
  }
  Ok(dimension)
}

fn embedding_array(
  records: &[SimilarityRecord],
  dimension: usize,
) -> arrow::array::FixedSizeListArray {
  let mut builder =
    FixedSizeListBuilder::new(Float32Builder::with_capacity(dimension * records.len()), dimension as i32);

  for record in records {
    builder.values().append_slice(&record.embedding);
    builder.append(true);
  }

  builder.finish()
}

/// Read back the `_distance` column lance attaches to search results
pub fn distance_column(batch: &RecordBatch) -> Option<&Float32Array> {
  batch.column_by_name("_distance").and_then(|col| col.as_any().downcast_ref::<Float32Array>())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_batch_has_one_row_per_record() {
    let records = vec![
      SimilarityRecord { id: "a".into(), embedding: vec![0.1, 0.2], document: "x".into() },
      SimilarityRecord { id: "b".into(), embedding: vec![0.3, 0.4], document: "y".into() },
    ];
    let batch = records_to_arrow_batch(&records).unwrap();
    assert_eq!(batch.num_rows(), 2);
    assert_eq!(batch.num_columns(), 4);
  }

  #[test]
  fn test_mixed_dimensions_rejected() {
    let records = vec![
      SimilarityRecord { id: "a".into(), embedding: vec![0.1, 0.2], document: "x".into() },
      SimilarityRecord { id: "b".into(), embedding: vec![0.3], document: "y".into() },
    ];
    assert!(records_to_arrow_batch(&records).is_err());
    assert!(records_to_arrow_batch(&[]).is_err());
  }
}
