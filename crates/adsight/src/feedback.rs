//! Append-only feedback log for generated insights

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Feedback file written when no path is given
pub const DEFAULT_FEEDBACK_FILE: &str = "feedback_log.csv";

#[derive(Error, Debug)]
pub enum FeedbackError {
  #[error("Rating must be between 1 and 5, got {0}")]
  InvalidRating(u8),

  #[error("Failed to write feedback log {path}: {message}")]
  Write { path: PathBuf, message: String },
}

/// One user judgement of an agent run
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackRecord {
  pub timestamp: String,
  pub rating: u8,
  pub comment: String,
  pub insights: String,
  pub summary: String,
}

impl FeedbackRecord {
  /// Build a record stamped with the current local time
  pub fn new(rating: u8, comment: &str, insights: &str, summary: &str) -> Result<Self, FeedbackError> {
    Self::at(Local::now(), rating, comment, insights, summary)
  }

  pub fn at(
    when: DateTime<Local>,
    rating: u8,
    comment: &str,
    insights: &str,
    summary: &str,
  ) -> Result<Self, FeedbackError> {
    if !(1..=5).contains(&rating) {
      return Err(FeedbackError::InvalidRating(rating));
    }

    Ok(Self {
      timestamp: when.to_rfc3339(),
      rating,
      comment: comment.to_string(),
      insights: insights.to_string(),
      summary: summary.to_string(),
    })
  }
}

pub struct FeedbackLog {
  path: PathBuf,
}

impl FeedbackLog {
  pub fn new<P: AsRef<Path>>(path: P) -> Self {
    Self { path: path.as_ref().to_path_buf() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Append a record, writing the header first when the file is new or empty
  pub fn append(&self, record: &FeedbackRecord) -> Result<(), FeedbackError> {
    let write_error = |message: String| FeedbackError::Write { path: self.path.clone(), message };

    let needs_header = std::fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true);

    let file = OpenOptions::new()
      .create(true)
      .append(true)
      .open(&self.path)
      .map_err(|e| write_error(e.to_string()))?;

    let mut writer = csv::WriterBuilder::new().has_headers(needs_header).from_writer(file);
    writer.serialize(record).map_err(|e| write_error(e.to_string()))?;
    writer.flush().map_err(|e| write_error(e.to_string()))?;

    tracing::debug!(path = %self.path.display(), rating = record.rating, "Feedback recorded");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn test_rating_bounds() {
    assert!(matches!(FeedbackRecord::new(0, "", "i", "s"), Err(FeedbackError::InvalidRating(0))));
    assert!(matches!(FeedbackRecord::new(6, "", "i", "s"), Err(FeedbackError::InvalidRating(6))));
    assert!(FeedbackRecord::new(1, "", "i", "s").is_ok());
    assert!(FeedbackRecord::new(5, "", "i", "s").is_ok());
  }

  #[test]
  fn test_header_written_once() {
    let temp = TempDir::new().unwrap();
    let log = FeedbackLog::new(temp.path().join("feedback.csv"));

    log.append(&FeedbackRecord::new(5, "great", "- spend more", "{}").unwrap()).unwrap();
    log.append(&FeedbackRecord::new(2, "meh, vague", "- line one\n- line two", "{}").unwrap()).unwrap();

    let content = std::fs::read_to_string(log.path()).unwrap();
    assert_eq!(content.matches("timestamp,rating,comment,insights,summary").count(), 1);
    assert!(content.starts_with("timestamp,rating,comment,insights,summary\n"));

    let mut reader = csv::Reader::from_path(log.path()).unwrap();
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[1][1], "2");
    assert_eq!(&rows[1][2], "meh, vague");
    assert_eq!(&rows[1][3], "- line one\n- line two");
  }

  #[test]
  fn test_timestamp_is_rfc3339() {
    let record = FeedbackRecord::new(3, "", "i", "s").unwrap();
    assert!(DateTime::parse_from_rfc3339(&record.timestamp).is_ok());
  }
}
