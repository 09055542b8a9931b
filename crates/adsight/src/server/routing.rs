//! Axum router configuration for all endpoints

use axum::{
  extract::DefaultBodyLimit,
  middleware,
  routing::{get, post},
  Router,
};
use std::sync::Arc;

use crate::server::handlers::{agent, evaluation, status};
use crate::server::middleware::request_context_middleware;
use crate::server::services::agent::AgentService;

/// Shared state handed to every handler
pub struct AppState {
  pub agent: AgentService,
}

impl AppState {
  pub fn new(agent: AgentService) -> Self {
    Self { agent }
  }
}

/// Create the main application router
pub fn create_router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
  Router::new()
    // Status and version endpoints
    .route("/status", get(status::status))
    .route("/version", get(status::version))
    // Agent and evaluation endpoints
    .route("/run-agent", post(agent::run_agent))
    .route("/evaluate", post(evaluation::evaluate))
    .layer(DefaultBodyLimit::max(max_upload_bytes))
    .layer(middleware::from_fn(request_context_middleware))
    .with_state(state)
}
