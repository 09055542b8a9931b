//! Errors surfaced by the agent pipeline

use thiserror::Error;

/// Failures on the required path of an agent run
///
/// Retrieval and knowledge lookups never produce these; they degrade to
/// absence instead.
#[derive(Error, Debug)]
pub enum AgentError {
  #[error("Upload is not a parseable table: {message}")]
  InvalidInputFormat { message: String },

  #[error("Request is missing the '{field}' upload field")]
  MissingUpload { field: String },

  #[error("Language model unavailable: {message}")]
  ModelUnavailable { message: String },

  #[error("Language model did not answer within {seconds} seconds")]
  ModelTimeout { seconds: u64 },
}

impl AgentError {
  pub fn invalid_input(message: impl Into<String>) -> Self {
    AgentError::InvalidInputFormat { message: message.into() }
  }

  pub fn model_unavailable(message: impl Into<String>) -> Self {
    AgentError::ModelUnavailable { message: message.into() }
  }

  /// Stable key used in API error bodies
  pub fn key(&self) -> &'static str {
    match self {
      AgentError::InvalidInputFormat { .. } => "invalid_input_format",
      AgentError::MissingUpload { .. } => "missing_upload",
      AgentError::ModelUnavailable { .. } => "model_unavailable",
      AgentError::ModelTimeout { .. } => "model_timeout",
    }
  }
}
