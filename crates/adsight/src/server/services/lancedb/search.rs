//! Nearest-neighbour search over the LanceDB similarity table

use anyhow::{anyhow, Result};
use arrow::array::{Array, StringArray};
use arrow::record_batch::RecordBatch;
use futures::stream::StreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::Table;

use super::records::distance_column;
use crate::server::services::vector_database::NearestMatch;

/// The single closest record, using lance's default L2 metric
pub async fn search_nearest(table: &Table, query_embedding: &[f32]) -> Result<Option<NearestMatch>> {
  let mut results = table
    .vector_search(query_embedding)?
    .column("embedding")
    .limit(1)
    .execute()
    .await
    .map_err(|e| anyhow!("Vector search failed: {}", e))?;

  while let Some(batch) = results.next().await {
    let batch = batch.map_err(|e| anyhow!("Error reading batch: {}", e))?;
    if let Some(found) = first_match(&batch)? {
      return Ok(Some(found));
    }
  }
  Ok(None)
}

fn first_match(batch: &RecordBatch) -> Result<Option<NearestMatch>> {
  if batch.num_rows() == 0 {
    return Ok(None);
  }

  let ids = string_column(batch, "id")?;
  let documents = string_column(batch, "document")?;
  let distances =
    distance_column(batch).ok_or_else(|| anyhow!("Search result has no '_distance' column"))?;

  if distances.is_null(0) {
    return Err(anyhow!("Search result has a null distance"));
  }

  Ok(Some(NearestMatch {
    id: ids.value(0).to_string(),
    document: documents.value(0).to_string(),
    distance: distances.value(0),
  }))
}

fn string_column<'a>(batch: &'a RecordBatch, column_name: &str) -> Result<&'a StringArray> {
  batch
    .column_by_name(column_name)
    .ok_or_else(|| anyhow!("Missing '{}' column", column_name))?
    .as_any()
    .downcast_ref::<StringArray>()
    .ok_or_else(|| anyhow!("Failed to cast '{}' column to StringArray", column_name))
}
