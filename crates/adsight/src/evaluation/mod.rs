//! Evaluation of generated insights against reference answers
//!
//! Reads a CSV with `output` and `reference` columns, scores every row and
//! averages the scores. The rendered report line is the stable text contract
//! shared by the `adsight_eval` binary and the CLI that parses it.

pub mod metrics;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use thiserror::Error;

pub use metrics::PairScores;

/// Evaluation file read when no path is given
pub const DEFAULT_EVALUATION_FILE: &str = "outputs_vs_refs.csv";

/// Rows between progress messages
const PROGRESS_INTERVAL: usize = 1000;

/// Sample file with the expected layout
pub const SAMPLE_EVALUATION_CSV: &str = "output,reference\n\
Increase ad spend for high CTR campaigns,Consider increasing budget for top CTR ads\n\
Use carousel ads for e-commerce,Carousel ads work well for e-commerce\n";

static REPORT_LINE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"ROUGE-1: ([0-9.]+), ROUGE-L: ([0-9.]+), F1: ([0-9.]+)").expect("report pattern is valid")
});

#[derive(Error, Debug)]
pub enum EvaluationError {
  #[error("CSV must have columns named 'output' and 'reference' (case-insensitive, no extra spaces).")]
  MissingColumns,

  #[error("No data found in CSV.")]
  NoData,

  #[error("Failed to read or process CSV: {0}")]
  Unreadable(String),
}

impl EvaluationError {
  /// Stable key used in API error bodies
  pub fn key(&self) -> &'static str {
    match self {
      EvaluationError::MissingColumns => "missing_columns",
      EvaluationError::NoData => "no_data",
      EvaluationError::Unreadable(_) => "unreadable_csv",
    }
  }
}

impl From<csv::Error> for EvaluationError {
  fn from(e: csv::Error) -> Self {
    EvaluationError::Unreadable(e.to_string())
  }
}

impl From<std::io::Error> for EvaluationError {
  fn from(e: std::io::Error) -> Self {
    EvaluationError::Unreadable(e.to_string())
  }
}

/// One generated output and the answer it is judged against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationPair {
  pub output: String,
  pub reference: String,
}

/// Averaged scores over every evaluated row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
  pub rows: usize,
  pub rouge1: f64,
  pub rouge_l: f64,
  pub f1: f64,
}

impl fmt::Display for EvaluationReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Average ROUGE-1: {:.2}, ROUGE-L: {:.2}, F1: {:.2}", self.rouge1, self.rouge_l, self.f1)
  }
}

/// Scores recovered from a rendered report line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportedScores {
  pub rouge1: f64,
  pub rouge_l: f64,
  pub f1: f64,
}

impl From<&EvaluationReport> for ReportedScores {
  fn from(report: &EvaluationReport) -> Self {
    Self { rouge1: report.rouge1, rouge_l: report.rouge_l, f1: report.f1 }
  }
}

/// Find the report line in evaluation output and parse its three numbers
pub fn parse_report_line(output: &str) -> Option<ReportedScores> {
  let captures = REPORT_LINE.captures(output)?;
  let number = |i: usize| captures.get(i).and_then(|m| m.as_str().parse::<f64>().ok());

  Some(ReportedScores { rouge1: number(1)?, rouge_l: number(2)?, f1: number(3)? })
}

/// Read output/reference pairs from CSV
///
/// Header names are matched after trimming and lowercasing. The header is
/// checked before any row is read.
pub fn read_pairs<R: Read>(reader: R) -> Result<Vec<EvaluationPair>, EvaluationError> {
  let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

  let headers: Vec<String> =
    csv_reader.headers()?.iter().map(|h| h.trim_start_matches('\u{feff}').trim().to_lowercase()).collect();

  let output_col = headers.iter().position(|h| h == "output").ok_or(EvaluationError::MissingColumns)?;
  let reference_col = headers.iter().position(|h| h == "reference").ok_or(EvaluationError::MissingColumns)?;

  let mut pairs = Vec::new();
  for (i, record) in csv_reader.records().enumerate() {
    let record = record?;
    pairs.push(EvaluationPair {
      output: record.get(output_col).unwrap_or_default().to_string(),
      reference: record.get(reference_col).unwrap_or_default().to_string(),
    });

    if (i + 1) % PROGRESS_INTERVAL == 0 {
      tracing::info!("Processed {} rows...", i + 1);
    }
  }

  Ok(pairs)
}

/// Average per-row scores; zero rows is an error
pub fn score_pairs(pairs: &[EvaluationPair]) -> Result<EvaluationReport, EvaluationError> {
  if pairs.is_empty() {
    return Err(EvaluationError::NoData);
  }

  let (mut rouge1, mut rouge_l, mut f1) = (0.0, 0.0, 0.0);
  for pair in pairs {
    let scores = PairScores::compute(&pair.output, &pair.reference);
    rouge1 += scores.rouge1;
    rouge_l += scores.rouge_l;
    f1 += scores.f1;
  }

  let n = pairs.len() as f64;
  Ok(EvaluationReport { rows: pairs.len(), rouge1: rouge1 / n, rouge_l: rouge_l / n, f1: f1 / n })
}

/// Evaluate CSV content from any reader
pub fn evaluate_reader<R: Read>(reader: R) -> Result<EvaluationReport, EvaluationError> {
  let pairs = read_pairs(reader)?;
  score_pairs(&pairs)
}

/// Evaluate the CSV file at `path`
pub fn evaluate_path<P: AsRef<Path>>(path: P) -> Result<EvaluationReport, EvaluationError> {
  let path = path.as_ref();
  let file = File::open(path).map_err(|e| EvaluationError::Unreadable(format!("{}: {}", path.display(), e)))?;
  evaluate_reader(BufReader::new(file))
}
