//! Similarity store: embedding function plus vector database
//!
//! Retrieval is an enrichment step. Every failure here is reported as a value
//! so the agent can log it and carry on without a similar insight.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use super::embeddings::{Embedder, HashingEmbedder, OllamaEmbedder};
use super::memory_store::InMemoryVectorDatabase;
use super::vector_database::{NearestMatch, SimilarityRecord, VectorDatabase};
use crate::config::{EmbedderKind, ModelConfig, SimilarityConfig, VectorStoreKind};

/// Outcome of looking for a previously generated insight
#[derive(Debug, Clone, PartialEq)]
pub enum Retrieval {
  /// A stored insight closer than the threshold
  Similar(NearestMatch),
  /// Store empty or nothing close enough
  NoMatch,
  /// The embedder or database failed
  Unavailable(String),
}

impl Retrieval {
  /// The reusable insight text, if any
  pub fn document(&self) -> Option<&str> {
    match self {
      Retrieval::Similar(found) => Some(&found.document),
      _ => None,
    }
  }
}

pub struct SimilarityStore {
  embedder: Arc<dyn Embedder>,
  database: Arc<dyn VectorDatabase>,
  threshold: f32,
}

impl SimilarityStore {
  pub fn new(embedder: Arc<dyn Embedder>, database: Arc<dyn VectorDatabase>, threshold: f32) -> Self {
    Self { embedder, database, threshold }
  }

  /// Hashing embedder over an in-memory database
  pub fn in_memory(threshold: f32, dimensions: usize) -> Self {
    Self::new(
      Arc::new(HashingEmbedder::new(dimensions)),
      Arc::new(InMemoryVectorDatabase::new()),
      threshold,
    )
  }

  /// Build the embedder and backend selected in configuration
  pub async fn from_config(similarity: &SimilarityConfig, model: &ModelConfig) -> Result<Self> {
    let embedder: Arc<dyn Embedder> = match similarity.embedder {
      EmbedderKind::Onnx => match open_onnx(similarity).await {
        Ok(embedder) => embedder,
        Err(e) => {
          tracing::warn!(error = %e, "ONNX embedder unavailable, falling back to feature hashing");
          Arc::new(HashingEmbedder::new(similarity.dimensions))
        }
      },
      EmbedderKind::Hashing => Arc::new(HashingEmbedder::new(similarity.dimensions)),
      EmbedderKind::Ollama => Arc::new(OllamaEmbedder::new(
        &model.ollama_url,
        &similarity.embedding_model,
        Duration::from_secs(model.timeout_secs),
      )?),
    };

    let database: Arc<dyn VectorDatabase> = match similarity.vector_store {
      VectorStoreKind::Memory => Arc::new(InMemoryVectorDatabase::new()),
      VectorStoreKind::Lancedb => open_lancedb(similarity).await?,
    };

    tracing::info!(
      embedder = %embedder.version(),
      store = ?similarity.vector_store,
      threshold = similarity.threshold,
      "Similarity store ready"
    );
    Ok(Self::new(embedder, database, similarity.threshold))
  }

  pub fn threshold(&self) -> f32 {
    self.threshold
  }

  pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
    self.embedder.embed(text).await
  }

  /// Nearest stored insight if it lies strictly below the threshold
  pub async fn query(&self, embedding: &[f32]) -> Retrieval {
    match self.database.query_nearest(embedding).await {
      Ok(Some(found)) if found.distance < self.threshold => Retrieval::Similar(found),
      Ok(Some(found)) => {
        tracing::debug!(distance = found.distance, "Nearest insight above threshold");
        Retrieval::NoMatch
      }
      Ok(None) => Retrieval::NoMatch,
      Err(e) => Retrieval::Unavailable(e.to_string()),
    }
  }

  /// Embed the text and look for a similar stored insight
  pub async fn find_similar(&self, text: &str) -> Retrieval {
    match self.embed(text).await {
      Ok(embedding) => self.query(&embedding).await,
      Err(e) => Retrieval::Unavailable(e.to_string()),
    }
  }

  /// Record an insight under its summary hash
  pub async fn insert(&self, id: &str, embedding: Vec<f32>, document: &str) -> Result<()> {
    let record =
      SimilarityRecord { id: id.to_string(), embedding, document: document.to_string() };
    self.database.insert(record).await
  }

  pub async fn count(&self) -> Result<usize> {
    self.database.count().await
  }
}

#[cfg(feature = "onnx")]
async fn open_onnx(similarity: &SimilarityConfig) -> Result<Arc<dyn Embedder>> {
  Ok(Arc::new(super::onnx::OnnxEmbedder::load(&similarity.onnx_model).await?))
}

#[cfg(not(feature = "onnx"))]
async fn open_onnx(_similarity: &SimilarityConfig) -> Result<Arc<dyn Embedder>> {
  Err(anyhow::anyhow!("ONNX embedder requested but adsight was built without the 'onnx' feature"))
}

#[cfg(feature = "lancedb")]
async fn open_lancedb(similarity: &SimilarityConfig) -> Result<Arc<dyn VectorDatabase>> {
  let db = super::lancedb::LanceDbVectorDatabase::new(
    similarity.lancedb_path.clone(),
    super::lancedb::DEFAULT_TABLE_NAME,
  )
  .await?;
  Ok(Arc::new(db))
}

#[cfg(not(feature = "lancedb"))]
async fn open_lancedb(_similarity: &SimilarityConfig) -> Result<Arc<dyn VectorDatabase>> {
  Err(anyhow::anyhow!("LanceDB vector store requested but adsight was built without the 'lancedb' feature"))
}
