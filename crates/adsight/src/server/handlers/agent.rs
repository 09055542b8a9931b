//! Agent endpoint handler

use axum::{
  extract::{Extension, Multipart, State},
  http::StatusCode,
  response::Json as ResponseJson,
};
use std::sync::Arc;

use super::{error_response, read_upload, HandlerError};
use crate::error::AgentError;
use crate::server::middleware::RequestContext;
use crate::server::routing::AppState;
use crate::server::types::{BaseResponse, RunAgentResponse};

/// Multipart field carrying the CSV upload
pub const UPLOAD_FIELD: &str = "file";

/// POST /run-agent - Analyze one uploaded ad performance CSV
pub async fn run_agent(
  State(state): State<Arc<AppState>>,
  Extension(context): Extension<RequestContext>,
  mut multipart: Multipart,
) -> Result<ResponseJson<BaseResponse<RunAgentResponse>>, HandlerError> {
  let transaction_id = context.request_id;

  let upload = match read_upload(&mut multipart, UPLOAD_FIELD, transaction_id).await? {
    Some(bytes) => bytes,
    None => {
      let err = AgentError::MissingUpload { field: UPLOAD_FIELD.to_string() };
      return Err(agent_error_response(&err, transaction_id));
    }
  };

  tracing::info!(bytes = upload.len(), "Running agent on upload");

  match state.agent.run(&upload).await {
    Ok(report) => {
      tracing::info!(rows = report.num_rows, rag = report.rag, "Agent run finished");
      Ok(ResponseJson(BaseResponse::success(report, transaction_id)))
    }
    Err(e) => {
      tracing::warn!(error = %e, "Agent run failed");
      Err(agent_error_response(&e, transaction_id))
    }
  }
}

/// HTTP status for each agent failure
pub fn agent_error_status(err: &AgentError) -> StatusCode {
  match err {
    AgentError::InvalidInputFormat { .. } | AgentError::MissingUpload { .. } => StatusCode::BAD_REQUEST,
    AgentError::ModelUnavailable { .. } => StatusCode::BAD_GATEWAY,
    AgentError::ModelTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
  }
}

fn agent_error_response(err: &AgentError, transaction_id: uuid::Uuid) -> HandlerError {
  error_response(agent_error_status(err), err.key(), &err.to_string(), transaction_id)
}
