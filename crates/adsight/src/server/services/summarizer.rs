//! Uploaded table parsing and per-column metric summaries

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;

use crate::error::AgentError;

/// A parsed CSV upload: header names plus string cells
#[derive(Debug, Clone, PartialEq)]
pub struct AdTable {
  columns: Vec<String>,
  rows: Vec<Vec<String>>,
}

impl AdTable {
  /// Parse a CSV byte stream with a header row
  ///
  /// Repeated header names get `.1`, `.2`, ... suffixes. Rows shorter than
  /// the header are padded with blank cells; longer rows are rejected.
  pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self, AgentError> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).flexible(true).from_reader(bytes);

    let headers: Vec<String> = reader
      .headers()
      .map_err(|e| AgentError::invalid_input(format!("unreadable header row: {e}")))?
      .iter()
      .map(str::to_string)
      .collect();

    if headers.is_empty() || headers.iter().all(|c| c.trim().is_empty()) {
      return Err(AgentError::invalid_input("no columns to parse from upload"));
    }
    let columns = dedupe_headers(headers);

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
      let record =
        record.map_err(|e| AgentError::invalid_input(format!("row {}: {e}", index + 1)))?;
      if record.len() > columns.len() {
        return Err(AgentError::invalid_input(format!(
          "row {}: expected at most {} fields, found {}",
          index + 1,
          columns.len(),
          record.len()
        )));
      }

      let mut row: Vec<String> = record.iter().map(str::to_string).collect();
      row.resize(columns.len(), String::new());
      rows.push(row);
    }

    Ok(Self { columns, rows })
  }

  pub fn columns(&self) -> &[String] {
    &self.columns
  }

  pub fn num_rows(&self) -> usize {
    self.rows.len()
  }

  /// First `limit` rows, for previews
  pub fn head(&self, limit: usize) -> &[Vec<String>] {
    &self.rows[..self.rows.len().min(limit)]
  }

  /// All cells of one column, top to bottom
  pub fn column_values(&self, index: usize) -> impl Iterator<Item = &str> + '_ {
    self.rows.iter().filter_map(move |row| row.get(index).map(String::as_str))
  }
}

/// Rename repeated headers `name`, `name.1`, `name.2`, skipping names already taken
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
  let mut counts: HashMap<String, usize> = HashMap::new();
  let mut columns = Vec::with_capacity(headers.len());

  for name in headers {
    let seen = counts.get(&name).copied().unwrap_or(0);
    if seen == 0 {
      counts.insert(name.clone(), 1);
      columns.push(name);
      continue;
    }

    let mut suffix = seen;
    let mut candidate = format!("{name}.{suffix}");
    while counts.contains_key(&candidate) {
      suffix += 1;
      candidate = format!("{name}.{suffix}");
    }
    counts.insert(name, suffix + 1);
    counts.insert(candidate.clone(), 1);
    columns.push(candidate);
  }

  columns
}

/// Mean, minimum and maximum of one numeric column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
  pub mean: f64,
  pub min: f64,
  pub max: f64,
}

/// Numeric column name -> stats, in upload column order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdMetricsSummary {
  entries: Vec<(String, ColumnStats)>,
}

impl AdMetricsSummary {
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn get(&self, column: &str) -> Option<&ColumnStats> {
    self.entries.iter().find(|(name, _)| name == column).map(|(_, stats)| stats)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnStats)> {
    self.entries.iter().map(|(name, stats)| (name.as_str(), stats))
  }

  /// Compact JSON text used in prompts and as the hashing input
  pub fn render(&self) -> String {
    serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
  }

  /// SHA-256 of the rendered summary, lowercase hex
  pub fn summary_hash(&self) -> String {
    hex::encode(Sha256::digest(self.render().as_bytes()))
  }
}

impl Serialize for AdMetricsSummary {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.entries.len()))?;
    for (name, stats) in &self.entries {
      map.serialize_entry(name, stats)?;
    }
    map.end()
  }
}

impl<'de> Deserialize<'de> for AdMetricsSummary {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    struct SummaryVisitor;

    impl<'de> Visitor<'de> for SummaryVisitor {
      type Value = AdMetricsSummary;

      fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of column name to {mean, min, max}")
      }

      fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::new();
        while let Some((name, stats)) = access.next_entry::<String, ColumnStats>()? {
          entries.push((name, stats));
        }
        Ok(AdMetricsSummary { entries })
      }
    }

    deserializer.deserialize_map(SummaryVisitor)
  }
}

/// Summarize every all-numeric column of the table
pub fn summarize_ad_metrics(table: &AdTable) -> AdMetricsSummary {
  let entries = table
    .columns()
    .iter()
    .enumerate()
    .filter_map(|(index, name)| {
      column_stats(table.column_values(index)).map(|stats| (name.clone(), stats))
    })
    .collect();

  AdMetricsSummary { entries }
}

/// Stats for a column, or None when any present cell is non-numeric
fn column_stats<'a>(cells: impl Iterator<Item = &'a str>) -> Option<ColumnStats> {
  let mut count = 0usize;
  let mut sum = 0.0f64;
  let mut min = f64::INFINITY;
  let mut max = f64::NEG_INFINITY;

  for cell in cells {
    let Some(value) = parse_cell(cell)? else {
      continue;
    };
    count += 1;
    sum += value;
    min = min.min(value);
    max = max.max(value);
  }

  if count == 0 {
    return None;
  }

  // float summation can drift a hair past the extremes
  let mean = (sum / count as f64).clamp(min, max);
  Some(ColumnStats { mean, min, max })
}

/// Some(None) for a missing cell, Some(Some(v)) for a number, None for text
fn parse_cell(cell: &str) -> Option<Option<f64>> {
  let trimmed = cell.trim();
  if trimmed.is_empty() {
    return Some(None);
  }
  match trimmed.parse::<f64>() {
    Ok(value) if value.is_finite() => Some(Some(value)),
    Ok(_) => Some(None),
    Err(_) => None,
  }
}
