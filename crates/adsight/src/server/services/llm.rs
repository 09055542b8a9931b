//! Local language model client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::AgentError;

/// Text in, text out
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
  async fn generate(&self, prompt: &str) -> Result<String, AgentError>;

  fn model_name(&self) -> String;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
  model: &'a str,
  prompt: &'a str,
  stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
  response: String,
}

/// Client for the Ollama `/api/generate` endpoint
///
/// Carries no timeout of its own; the insight generator bounds each call.
pub struct OllamaClient {
  client: Client,
  base_url: String,
  model: String,
}

impl OllamaClient {
  pub fn new(base_url: &str, model: &str) -> Self {
    Self {
      client: Client::new(),
      base_url: base_url.trim_end_matches('/').to_string(),
      model: model.to_string(),
    }
  }
}

#[async_trait]
impl LanguageModel for OllamaClient {
  async fn generate(&self, prompt: &str) -> Result<String, AgentError> {
    let url = format!("{}/api/generate", self.base_url);
    let request = GenerateRequest { model: &self.model, prompt, stream: false };

    let response = self
      .client
      .post(&url)
      .json(&request)
      .send()
      .await
      .map_err(|e| AgentError::model_unavailable(format!("{url}: {e}")))?;

    if !response.status().is_success() {
      let status = response.status();
      let body = response.text().await.unwrap_or_default();
      return Err(AgentError::model_unavailable(format!("{status}: {body}")));
    }

    let parsed: GenerateResponse = response
      .json()
      .await
      .map_err(|e| AgentError::model_unavailable(format!("unreadable response: {e}")))?;
    Ok(parsed.response)
  }

  fn model_name(&self) -> String {
    self.model.clone()
  }
}
