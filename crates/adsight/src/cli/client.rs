//! HTTP client for the adsight REST API
//!
//! Thin wrapper the CLI uses to talk to a local or remote agent server.

use anyhow::{anyhow, Result};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use std::time::Duration;
use tokio::time::timeout;

use crate::server::services::agent::AgentReport;
use crate::server::types::{BaseResponse, StatusResponse};

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for the adsight HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
  /// Base URL of the agent server (e.g., "http://127.0.0.1:8000")
  pub base_url: String,
  /// Read timeout in seconds; covers the model call on the server
  pub timeout_secs: u64,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self { base_url: DEFAULT_SERVER_URL.to_string(), timeout_secs: DEFAULT_TIMEOUT_SECS }
  }
}

/// HTTP client for the adsight REST API
pub struct AdsightClient {
  client: Client,
  config: ClientConfig,
}

impl AdsightClient {
  /// Create a new client with custom configuration
  pub fn with_config(config: ClientConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

    Ok(Self { client, config })
  }

  pub fn config(&self) -> &ClientConfig {
    &self.config
  }

  /// Upload a CSV and run the agent on it
  pub async fn run_agent(&self, file_name: &str, contents: Vec<u8>) -> Result<AgentReport> {
    let part = Part::bytes(contents).file_name(file_name.to_string()).mime_str("text/csv")?;
    let form = Form::new().part("file", part);

    let url = format!("{}/run-agent", self.config.base_url);
    let response = timeout(
      Duration::from_secs(self.config.timeout_secs),
      self.client.post(&url).multipart(form).send(),
    )
    .await
    .map_err(|_| anyhow!("No response from the agent within {} seconds", self.config.timeout_secs))??;

    if !response.status().is_success() {
      return Err(anyhow!("Error from backend: {}", backend_error_text(response).await));
    }

    let result: BaseResponse<AgentReport> = response.json().await?;
    Ok(result.data)
  }

  /// Server status
  pub async fn status(&self) -> Result<StatusResponse> {
    let url = format!("{}/status", self.config.base_url);
    let response = timeout(
      Duration::from_secs(5), // Shorter timeout for health check
      self.client.get(&url).send(),
    )
    .await??;

    if !response.status().is_success() {
      return Err(anyhow!("Server health check failed: {}", response.status()));
    }

    let result: BaseResponse<StatusResponse> = response.json().await?;
    Ok(result.data)
  }

  /// Check if the server is reachable
  pub async fn health_check(&self) -> Result<()> {
    self.status().await.map(|_| ())
  }
}

/// The first API error message, or the raw body when it is not an API error
async fn backend_error_text(response: Response) -> String {
  let status = response.status();
  let body = match response.text().await {
    Ok(body) => body,
    Err(e) => return format!("HTTP {status}: {e}"),
  };

  match serde_json::from_str::<BaseResponse<serde_json::Value>>(&body) {
    Ok(parsed) if !parsed.errors.is_empty() => {
      parsed.errors.iter().map(|e| e.message.as_str()).collect::<Vec<_>>().join("; ")
    }
    _ if body.trim().is_empty() => format!("HTTP {status}"),
    _ => body,
  }
}

/// Get the configured client (checks environment variables)
pub fn get_client() -> Result<AdsightClient> {
  let base_url = std::env::var("ADSIGHT_SERVER_URL").unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string());

  let timeout_secs = std::env::var("ADSIGHT_TIMEOUT_SECS")
    .ok()
    .and_then(|v| v.parse().ok())
    .unwrap_or(DEFAULT_TIMEOUT_SECS);

  let config = ClientConfig { base_url: base_url.trim_end_matches('/').to_string(), timeout_secs };

  AdsightClient::with_config(config)
}
