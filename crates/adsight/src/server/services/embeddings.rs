//! Embedding functions for the similarity store

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Turns text into a fixed-length vector
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Embedder: Send + Sync {
  async fn embed(&self, text: &str) -> Result<Vec<f32>>;

  /// Identifier recorded in logs
  fn version(&self) -> String;
}

/// Deterministic signed feature hashing over word unigrams and bigrams
///
/// Offline fallback when no embedding model is available. Identical text
/// always maps to the identical unit vector.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
  dimensions: usize,
}

impl HashingEmbedder {
  pub fn new(dimensions: usize) -> Self {
    Self { dimensions: dimensions.max(1) }
  }

  pub fn embed_sync(&self, text: &str) -> Vec<f32> {
    let tokens = tokenize(text);
    let mut vector = vec![0.0f32; self.dimensions];

    for token in &tokens {
      self.accumulate(&mut vector, token);
    }
    for pair in tokens.windows(2) {
      self.accumulate(&mut vector, &format!("{} {}", pair[0], pair[1]));
    }

    normalize(&mut vector);
    vector
  }

  fn accumulate(&self, vector: &mut [f32], feature: &str) {
    let digest = Sha256::digest(feature.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    let hash = u64::from_le_bytes(bytes);

    let index = (hash % self.dimensions as u64) as usize;
    let sign = if hash >> 63 == 1 { -1.0 } else { 1.0 };
    vector[index] += sign;
  }
}

#[async_trait]
impl Embedder for HashingEmbedder {
  async fn embed(&self, text: &str) -> Result<Vec<f32>> {
    Ok(self.embed_sync(text))
  }

  fn version(&self) -> String {
    format!("feature-hash-{}", self.dimensions)
  }
}

#[derive(Serialize)]
struct OllamaEmbeddingRequest<'a> {
  model: &'a str,
  prompt: &'a str,
}

#[derive(Deserialize)]
struct OllamaEmbeddingResponse {
  embedding: Vec<f32>,
}

/// Embeddings from a local Ollama runtime
pub struct OllamaEmbedder {
  client: Client,
  base_url: String,
  model: String,
}

impl OllamaEmbedder {
  pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
    let client = Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      client,
      base_url: base_url.trim_end_matches('/').to_string(),
      model: model.to_string(),
    })
  }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
  async fn embed(&self, text: &str) -> Result<Vec<f32>> {
    let url = format!("{}/api/embeddings", self.base_url);
    let request = OllamaEmbeddingRequest { model: &self.model, prompt: text };

    let response = self
      .client
      .post(&url)
      .json(&request)
      .send()
      .await
      .map_err(|e| anyhow!("Embedding request failed: {}", e))?;

    if !response.status().is_success() {
      let status = response.status();
      let body = response.text().await.unwrap_or_default();
      return Err(anyhow!("Embedding service returned {}: {}", status, body));
    }

    let parsed: OllamaEmbeddingResponse =
      response.json().await.map_err(|e| anyhow!("Invalid embedding response: {}", e))?;

    if parsed.embedding.is_empty() {
      return Err(anyhow!("Embedding service returned an empty vector"));
    }
    Ok(parsed.embedding)
  }

  fn version(&self) -> String {
    format!("ollama:{}", self.model)
  }
}

/// Lowercase alphanumeric runs; '.' and '-' stay inside numbers
fn tokenize(text: &str) -> Vec<String> {
  text
    .to_lowercase()
    .split(|c: char| !(c.is_alphanumeric() || c == '.' || c == '-'))
    .map(|token| token.trim_matches(|c: char| c == '.' || c == '-'))
    .filter(|token| !token.is_empty())
    .map(str::to_string)
    .collect()
}

/// Average the token vectors of a `[batch, tokens, hidden]` tensor where the attention mask is set
pub fn masked_mean_pool(shape: &[i64], data: &[f32], mask: &[u32]) -> Result<Vec<f32>> {
  let &[_, tokens, hidden] = shape else {
    return Err(anyhow!("Expected a [batch, tokens, hidden] tensor, got shape {:?}", shape));
  };
  let (tokens, hidden) = (tokens.max(0) as usize, hidden.max(0) as usize);
  if hidden == 0 || data.len() < tokens * hidden {
    return Err(anyhow!("Tensor data does not match shape {:?}", shape));
  }

  let mut pooled = vec![0.0f32; hidden];
  let mut kept = 0usize;
  for (token, row) in data.chunks(hidden).take(tokens).enumerate() {
    if mask.get(token).copied().unwrap_or(0) == 0 {
      continue;
    }
    kept += 1;
    pooled.iter_mut().zip(row).for_each(|(sum, value)| *sum += value);
  }

  if kept > 0 {
    pooled.iter_mut().for_each(|sum| *sum /= kept as f32);
  }
  Ok(pooled)
}

/// Scale to unit length; zero vectors are left as they are
pub fn normalize(vector: &mut [f32]) {
  let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
  if norm > 0.0 {
    vector.iter_mut().for_each(|v| *v /= norm);
  }
}

/// Squared Euclidean distance
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
  a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
