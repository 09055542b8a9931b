//! Evaluation endpoint handler

use axum::{
  extract::{Extension, Multipart},
  http::StatusCode,
  response::Json as ResponseJson,
};

use super::agent::UPLOAD_FIELD;
use super::{error_response, read_upload, HandlerError};
use crate::error::AgentError;
use crate::evaluation::evaluate_reader;
use crate::server::middleware::RequestContext;
use crate::server::types::{BaseResponse, EvaluationResponse};

/// POST /evaluate - Score an uploaded output/reference CSV
pub async fn evaluate(
  Extension(context): Extension<RequestContext>,
  mut multipart: Multipart,
) -> Result<ResponseJson<BaseResponse<EvaluationResponse>>, HandlerError> {
  let transaction_id = context.request_id;

  let upload = read_upload(&mut multipart, UPLOAD_FIELD, transaction_id).await?.ok_or_else(|| {
    let err = AgentError::MissingUpload { field: UPLOAD_FIELD.to_string() };
    error_response(StatusCode::BAD_REQUEST, err.key(), &err.to_string(), transaction_id)
  })?;

  // Scoring is CPU bound; keep it off the async workers
  let scored = tokio::task::spawn_blocking(move || evaluate_reader(upload.as_slice())).await;

  match scored {
    Ok(Ok(report)) => {
      tracing::info!(rows = report.rows, "Evaluation finished");
      let summary_line = report.to_string();
      Ok(ResponseJson(BaseResponse::success(EvaluationResponse { report, summary_line }, transaction_id)))
    }
    Ok(Err(e)) => Err(error_response(StatusCode::UNPROCESSABLE_ENTITY, e.key(), &e.to_string(), transaction_id)),
    Err(e) => Err(error_response(
      StatusCode::INTERNAL_SERVER_ERROR,
      "evaluation_failed",
      &format!("Evaluation task failed: {e}"),
      transaction_id,
    )),
  }
}
