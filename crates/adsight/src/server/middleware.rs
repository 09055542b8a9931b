//! Request context and middleware for the adsight REST API
//!
//! Every request gets a request id and a tracing span; start and completion
//! are logged with status and duration.

use axum::{
  extract::Request,
  http::{HeaderMap, Method, Uri},
  middleware::Next,
  response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

/// Request metadata injected into handler extensions
#[derive(Clone, Debug)]
pub struct RequestContext {
  /// Unique ID for this request
  pub request_id: Uuid,
  pub method: Method,
  pub uri: Uri,
  pub headers: HeaderMap,
}

impl RequestContext {
  pub fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
    Self { request_id: Uuid::new_v4(), method, uri, headers }
  }

  fn user_agent(&self) -> &str {
    self.headers.get("user-agent").and_then(|v| v.to_str().ok()).unwrap_or("none")
  }

  pub fn log_request_start(&self) {
    tracing::info!(user_agent = self.user_agent(), "Request started");
  }

  pub fn log_request_complete(&self, status_code: u16, duration_ms: f64) {
    if status_code >= 500 {
      tracing::error!(status = status_code, duration_ms, "Request completed");
    } else if status_code >= 400 {
      tracing::warn!(status = status_code, duration_ms, "Request completed");
    } else {
      tracing::info!(status = status_code, duration_ms, "Request completed");
    }
  }
}

/// Middleware to inject RequestContext into all requests
pub async fn request_context_middleware(mut request: Request, next: Next) -> Response {
  let context = RequestContext::new(
    request.method().clone(),
    request.uri().clone(),
    request.headers().clone(),
  );

  let span = tracing::info_span!(
    "http-request",
    request_id = %context.request_id,
    method = %context.method,
    path = context.uri.path()
  );

  async move {
    let start_time = std::time::Instant::now();
    context.log_request_start();

    request.extensions_mut().insert(context.clone());
    let response = next.run(request).await;

    let duration_ms = start_time.elapsed().as_secs_f64() * 1000.0;
    context.log_request_complete(response.status().as_u16(), duration_ms);
    response
  }
  .instrument(span)
  .await
}
