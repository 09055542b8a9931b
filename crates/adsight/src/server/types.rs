//! REST API request and response types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::evaluation::EvaluationReport;
use crate::server::services::agent::AgentReport;

// Base Response Structure
// ======================

/// Base response object for all API endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct BaseResponse<T> {
  /// API versioning information
  pub versioning: VersionInfo,

  /// Transaction ID for logging correlation
  pub transaction_id: Uuid,

  /// Optional error information
  #[serde(skip_serializing_if = "Vec::is_empty", default)]
  pub errors: Vec<ApiError>,

  /// Response data (generic for different endpoint types)
  #[serde(flatten)]
  pub data: T,
}

/// API versioning information
#[derive(Debug, Serialize, Deserialize)]
pub struct VersionInfo {
  /// The latest version of the API
  pub latest: String,

  /// The version of the API requested by the client
  pub requested: String,

  /// The version of the API that was used in producing the response
  pub resolved: String,
}

/// API error information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
  /// Error key, unique to the error source
  pub key: String,

  /// Human readable error message
  pub message: String,

  /// Additional error context
  #[serde(default)]
  pub context: serde_json::Value,
}

// Status/Version Endpoints
// =======================

/// Response for /status endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
  pub status: String,
  pub version: String,
  /// Model the agent prompts
  pub model: String,
  /// Insights currently held by the similarity store
  pub stored_insights: usize,
}

/// Response for /version endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct VersionResponse {
  /// Current API version
  pub version: String,
}

// Agent Endpoint
// ==============

/// Response for /run-agent; the report fields sit at the top level
pub type RunAgentResponse = AgentReport;

// Evaluation Endpoint
// ===================

/// Response for /evaluate
#[derive(Debug, Serialize, Deserialize)]
pub struct EvaluationResponse {
  #[serde(flatten)]
  pub report: EvaluationReport,

  /// The report rendered in the evaluation script's output format
  pub summary_line: String,
}

// Helper Functions
// ================

impl<T> BaseResponse<T> {
  /// Create a successful response
  pub fn success(data: T, transaction_id: Uuid) -> Self {
    Self { versioning: VersionInfo::current(), transaction_id, errors: Vec::new(), data }
  }

  /// Create an error response
  pub fn error(errors: Vec<ApiError>, transaction_id: Uuid) -> BaseResponse<()> {
    BaseResponse { versioning: VersionInfo::current(), transaction_id, errors, data: () }
  }
}

impl VersionInfo {
  fn current() -> Self {
    let version = env!("CARGO_PKG_VERSION");
    Self {
      latest: version.to_string(),
      requested: version.to_string(),
      resolved: version.to_string(),
    }
  }
}

impl ApiError {
  /// Create a new API error
  pub fn new(key: &str, message: &str) -> Self {
    Self { key: key.to_string(), message: message.to_string(), context: serde_json::Value::Null }
  }
}
