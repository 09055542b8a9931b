//! Configuration for the agent service
//!
//! Values come from (lowest to highest precedence) built-in defaults, a YAML
//! file, and command line flags / `ADSIGHT_*` environment variables applied by
//! the server binary.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Config file names probed in the working directory
const LOCAL_CONFIG_FILES: [&str; 2] = ["adsight.yaml", ".adsight.yaml"];

/// Which embedding function backs the similarity store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum EmbedderKind {
  /// Local sentence-transformer model through ONNX Runtime (requires the `onnx` feature)
  Onnx,
  /// Deterministic feature hashing, no model at all
  Hashing,
  /// Embeddings served by the local Ollama runtime
  Ollama,
}

/// Which vector database keeps the similarity records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum VectorStoreKind {
  /// Process-lifetime in-memory collection
  Memory,
  /// On-disk LanceDB table (requires the `lancedb` feature)
  Lancedb,
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdsightConfig {
  /// Address the agent service listens on
  #[serde(default = "default_bind")]
  pub bind: SocketAddr,
  /// Language model settings
  #[serde(default)]
  pub model: ModelConfig,
  /// Similarity store settings
  #[serde(default)]
  pub similarity: SimilarityConfig,
  /// Largest accepted upload in bytes
  #[serde(default = "default_max_upload_bytes")]
  pub max_upload_bytes: usize,
}

/// Local language model runtime settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
  /// Base URL of the Ollama runtime
  #[serde(default = "default_ollama_url")]
  pub ollama_url: String,
  /// Model used to generate insights
  #[serde(default = "default_model_name")]
  pub name: String,
  /// Upper bound for a single generation call
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

/// Similarity store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityConfig {
  /// Prior insights are reused only below this distance
  #[serde(default = "default_threshold")]
  pub threshold: f32,
  #[serde(default = "default_embedder")]
  pub embedder: EmbedderKind,
  /// Hugging Face repository of the ONNX embedder
  #[serde(default = "default_onnx_model")]
  pub onnx_model: String,
  /// Model name for the Ollama embedder
  #[serde(default = "default_embedding_model")]
  pub embedding_model: String,
  /// Vector size for the hashing embedder
  #[serde(default = "default_dimensions")]
  pub dimensions: usize,
  #[serde(default = "default_vector_store")]
  pub vector_store: VectorStoreKind,
  /// Data directory for the LanceDB backend
  #[serde(default = "default_lancedb_path")]
  pub lancedb_path: PathBuf,
}

fn default_bind() -> SocketAddr {
  SocketAddr::from(([127, 0, 0, 1], 8000))
}
fn default_max_upload_bytes() -> usize {
  25 * 1024 * 1024
}
fn default_ollama_url() -> String {
  "http://localhost:11434".to_string()
}
fn default_model_name() -> String {
  "vicuna".to_string()
}
fn default_timeout_secs() -> u64 {
  120
}
fn default_threshold() -> f32 {
  0.2
}
#[cfg(feature = "onnx")]
fn default_embedder() -> EmbedderKind {
  EmbedderKind::Onnx
}
#[cfg(not(feature = "onnx"))]
fn default_embedder() -> EmbedderKind {
  EmbedderKind::Hashing
}
fn default_onnx_model() -> String {
  "sentence-transformers/all-MiniLM-L6-v2".to_string()
}
fn default_embedding_model() -> String {
  "nomic-embed-text".to_string()
}
fn default_dimensions() -> usize {
  384
}
fn default_vector_store() -> VectorStoreKind {
  VectorStoreKind::Memory
}
fn default_lancedb_path() -> PathBuf {
  adsight_home().join("lancedb")
}

impl Default for ModelConfig {
  fn default() -> Self {
    Self {
      ollama_url: default_ollama_url(),
      name: default_model_name(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

impl Default for SimilarityConfig {
  fn default() -> Self {
    Self {
      threshold: default_threshold(),
      embedder: default_embedder(),
      onnx_model: default_onnx_model(),
      embedding_model: default_embedding_model(),
      dimensions: default_dimensions(),
      vector_store: default_vector_store(),
      lancedb_path: default_lancedb_path(),
    }
  }
}

impl Default for AdsightConfig {
  fn default() -> Self {
    Self {
      bind: default_bind(),
      model: ModelConfig::default(),
      similarity: SimilarityConfig::default(),
      max_upload_bytes: default_max_upload_bytes(),
    }
  }
}

impl AdsightConfig {
  /// Load configuration from a YAML file
  pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
      .map_err(|e| anyhow!("Failed to read config {}: {}", path.display(), e))?;
    let config: AdsightConfig = serde_yaml::from_str(&content)
      .map_err(|e| anyhow!("Invalid config {}: {}", path.display(), e))?;
    config.validate()?;
    Ok(config)
  }

  /// Load from an explicit path, the working directory, the home directory, or defaults
  pub fn load(explicit: Option<&Path>) -> Result<Self> {
    if let Some(path) = explicit {
      return Self::load_from_file(path);
    }

    for name in LOCAL_CONFIG_FILES {
      if Path::new(name).exists() {
        return Self::load_from_file(name);
      }
    }

    let home_config = adsight_home().join("config.yaml");
    if home_config.exists() {
      return Self::load_from_file(home_config);
    }

    Ok(Self::default())
  }

  /// Reject values the pipeline cannot work with
  pub fn validate(&self) -> Result<()> {
    if !(self.similarity.threshold.is_finite() && self.similarity.threshold >= 0.0) {
      return Err(anyhow!("similarity.threshold must be a non-negative number"));
    }
    if self.similarity.dimensions == 0 {
      return Err(anyhow!("similarity.dimensions must be greater than zero"));
    }
    if self.model.timeout_secs == 0 {
      return Err(anyhow!("model.timeout_secs must be greater than zero"));
    }
    Ok(())
  }
}

/// Base directory for adsight state (`$ADSIGHT_HOME` or `~/.adsight`)
pub fn adsight_home() -> PathBuf {
  if let Ok(dir) = std::env::var("ADSIGHT_HOME") {
    return PathBuf::from(dir);
  }
  dirs::home_dir().unwrap_or_else(std::env::temp_dir).join(".adsight")
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  #[test]
  fn test_defaults_match_documented_values() {
    let config = AdsightConfig::default();
    assert_eq!(config.bind.port(), 8000);
    assert_eq!(config.model.name, "vicuna");
    assert_eq!(config.model.timeout_secs, 120);
    assert!((config.similarity.threshold - 0.2).abs() < f32::EPSILON);
    let expected = if cfg!(feature = "onnx") { EmbedderKind::Onnx } else { EmbedderKind::Hashing };
    assert_eq!(config.similarity.embedder, expected);
    assert_eq!(config.similarity.onnx_model, "sentence-transformers/all-MiniLM-L6-v2");
    assert_eq!(config.similarity.vector_store, VectorStoreKind::Memory);
  }

  #[test]
  fn test_partial_yaml_keeps_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "model:\n  name: llama3\nsimilarity:\n  threshold: 0.35").unwrap();

    let config = AdsightConfig::load_from_file(file.path()).unwrap();
    assert_eq!(config.model.name, "llama3");
    assert_eq!(config.model.ollama_url, "http://localhost:11434");
    assert!((config.similarity.threshold - 0.35).abs() < 1e-6);
    assert_eq!(config.similarity.dimensions, 384);
  }

  #[test]
  fn test_embedder_kind_from_yaml() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "similarity:\n  embedder: onnx").unwrap();

    let config = AdsightConfig::load_from_file(file.path()).unwrap();
    assert_eq!(config.similarity.embedder, EmbedderKind::Onnx);
  }

  #[test]
  fn test_negative_threshold_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "similarity:\n  threshold: -1.0").unwrap();

    let err = AdsightConfig::load_from_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("threshold"));
  }

  #[test]
  fn test_missing_explicit_file_is_an_error() {
    let result = AdsightConfig::load(Some(Path::new("/definitely/not/here.yaml")));
    assert!(result.is_err());
  }
}
