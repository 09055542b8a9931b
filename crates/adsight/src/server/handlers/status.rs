//! Status and version endpoint handlers

use axum::{extract::State, http::StatusCode, response::Json};
use std::sync::Arc;
use uuid::Uuid;

use super::{error_response, HandlerError};
use crate::server::routing::AppState;
use crate::server::types::{BaseResponse, StatusResponse, VersionResponse};

/// GET /status - Health check endpoint
pub async fn status(State(state): State<Arc<AppState>>) -> Result<Json<BaseResponse<StatusResponse>>, HandlerError> {
  let transaction_id = Uuid::new_v4();

  match state.agent.store().count().await {
    Ok(stored_insights) => {
      let response = StatusResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: state.agent.model_name(),
        stored_insights,
      };
      Ok(Json(BaseResponse::success(response, transaction_id)))
    }
    Err(e) => Err(error_response(
      StatusCode::SERVICE_UNAVAILABLE,
      "store_unavailable",
      &format!("Similarity store unavailable: {e}"),
      transaction_id,
    )),
  }
}

/// GET /version - Returns current API version
pub async fn version() -> Json<BaseResponse<VersionResponse>> {
  let transaction_id = Uuid::new_v4();
  let response = VersionResponse { version: env!("CARGO_PKG_VERSION").to_string() };

  Json(BaseResponse::success(response, transaction_id))
}
