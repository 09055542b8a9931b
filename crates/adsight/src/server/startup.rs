//! REST server startup and configuration

use anyhow::Result;
use axum::serve;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AdsightConfig;
use crate::server::routing::{create_router, AppState};
use crate::server::services::agent::AgentService;

/// Start the REST server
pub async fn start_server(config: AdsightConfig) -> Result<()> {
  config.validate()?;
  let addr = config.bind;

  tracing::info!(
    %addr,
    model = %config.model.name,
    ollama = %config.model.ollama_url,
    "Starting adsight REST server"
  );

  let agent = AgentService::from_config(&config).await?;
  let state = Arc::new(AppState::new(agent));

  let app = create_router(state, config.max_upload_bytes)
    .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()));

  let listener = TcpListener::bind(addr).await?;
  tracing::info!(%addr, "Server listening");

  match serve(listener, app).with_graceful_shutdown(shutdown_signal()).await {
    Ok(()) => {
      tracing::info!("Server shutdown gracefully");
      Ok(())
    }
    Err(e) => {
      tracing::error!(error = %e, "Server error");
      Err(anyhow::anyhow!("Server error: {}", e))
    }
  }
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::warn!(error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
}
