//! The agent pipeline: summarize, look up, retrieve, generate, remember

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::insight_generator::{build_context, InsightGenerator};
use super::knowledge::CampaignProfile;
use super::llm::{LanguageModel, OllamaClient};
use super::similarity::{Retrieval, SimilarityStore};
use super::summarizer::{summarize_ad_metrics, AdMetricsSummary, AdTable};
use crate::config::AdsightConfig;
use crate::error::AgentError;

/// Result of one agent run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentReport {
  /// Upload column names in order
  pub columns: Vec<String>,
  pub num_rows: usize,
  pub summary: AdMetricsSummary,
  /// Raw model output
  pub insights: String,
  /// Whether a previously generated insight was fed into the prompt
  pub rag: bool,
  /// Knowledge base tip, empty when none applies
  pub kg_tip: String,
}

pub struct AgentService {
  store: Arc<SimilarityStore>,
  generator: InsightGenerator,
}

impl AgentService {
  pub fn new(store: Arc<SimilarityStore>, model: Arc<dyn LanguageModel>, timeout: Duration) -> Self {
    Self { store, generator: InsightGenerator::new(model, timeout) }
  }

  /// Wire up the Ollama model and configured similarity store
  pub async fn from_config(config: &AdsightConfig) -> Result<Self> {
    let store = Arc::new(SimilarityStore::from_config(&config.similarity, &config.model).await?);
    let model = Arc::new(OllamaClient::new(&config.model.ollama_url, &config.model.name));
    Ok(Self::new(store, model, Duration::from_secs(config.model.timeout_secs)))
  }

  pub fn store(&self) -> &SimilarityStore {
    &self.store
  }

  pub fn model_name(&self) -> String {
    self.generator.model_name()
  }

  /// Run the full pipeline for one uploaded CSV
  pub async fn run(&self, upload: &[u8]) -> Result<AgentReport, AgentError> {
    let table = AdTable::from_csv_bytes(upload)?;
    let summary = summarize_ad_metrics(&table);
    let summary_text = summary.render();
    let summary_hash = summary.summary_hash();

    let kg_tip = CampaignProfile::from_table(&table).tip();

    let embedding = match self.store.embed(&summary_text).await {
      Ok(embedding) => Some(embedding),
      Err(e) => {
        tracing::warn!(error = %e, "Embedding failed; continuing without retrieval");
        None
      }
    };

    let retrieval = match &embedding {
      Some(embedding) => self.store.query(embedding).await,
      None => Retrieval::NoMatch,
    };
    if let Retrieval::Unavailable(reason) = &retrieval {
      tracing::warn!(%reason, "Similarity store unavailable; continuing without retrieval");
    }

    let similar = retrieval.document();
    let context = build_context(similar, &kg_tip);
    let insights = self.generator.generate(&context, &summary).await?;

    if let Some(embedding) = embedding {
      match self.store.insert(&summary_hash, embedding, &insights).await {
        Ok(()) => tracing::debug!(id = %summary_hash, "Stored insight for future retrieval"),
        Err(e) => tracing::warn!(error = %e, "Insight generated but storing it failed"),
      }
    }

    Ok(AgentReport {
      columns: table.columns().to_vec(),
      num_rows: table.num_rows(),
      summary,
      insights,
      rag: similar.is_some(),
      kg_tip,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::server::services::embeddings::HashingEmbedder;
  use crate::server::services::llm::MockLanguageModel;
  use crate::server::services::vector_database::{NearestMatch, SimilarityRecord, VectorDatabase};
  use async_trait::async_trait;

  const UPLOAD: &[u8] = b"platform,ad type,impressions,clicks\nFacebook,video,1000,50\nFacebook,video,3000,70\n";

  fn echo_model(times: usize) -> MockLanguageModel {
    let mut model = MockLanguageModel::new();
    model
      .expect_generate()
      .times(times)
      .returning(|prompt| Ok(format!("insights for {} chars", prompt.len())));
    model.expect_model_name().returning(|| "mock".to_string());
    model
  }

  fn service(model: MockLanguageModel) -> AgentService {
    AgentService::new(
      Arc::new(SimilarityStore::in_memory(0.2, 128)),
      Arc::new(model),
      Duration::from_secs(5),
    )
  }

  #[tokio::test]
  async fn test_first_run_reports_everything() {
    let agent = service(echo_model(1));
    let report = agent.run(UPLOAD).await.unwrap();

    assert_eq!(report.columns, vec!["platform", "ad type", "impressions", "clicks"]);
    assert_eq!(report.num_rows, 2);
    assert_eq!(report.summary.get("impressions").unwrap().mean, 2000.0);
    assert!(report.insights.starts_with("insights for"));
    assert!(!report.rag);
    assert!(report.kg_tip.contains("under 15 seconds"));
    assert_eq!(agent.store().count().await.unwrap(), 1);
  }

  #[tokio::test]
  async fn test_identical_reupload_uses_retrieval_and_keeps_one_record() {
    let mut model = MockLanguageModel::new();
    let mut seq = mockall::Sequence::new();
    model
      .expect_generate()
      .times(1)
      .in_sequence(&mut seq)
      .returning(|_| Ok("- first answer".to_string()));
    model
      .expect_generate()
      .withf(|prompt: &str| prompt.starts_with("Past similar campaign insights: - first answer"))
      .times(1)
      .in_sequence(&mut seq)
      .returning(|_| Ok("- second answer".to_string()));
    model.expect_model_name().returning(|| "mock".to_string());

    let agent = service(model);
    assert!(!agent.run(UPLOAD).await.unwrap().rag);

    let second = agent.run(UPLOAD).await.unwrap();
    assert!(second.rag);
    assert_eq!(second.insights, "- second answer");
    assert_eq!(agent.store().count().await.unwrap(), 1);
  }

  #[tokio::test]
  async fn test_invalid_upload_never_reaches_the_model() {
    let agent = service(echo_model(0));
    let err = agent.run(b"a,b\n1,2,3\n").await.unwrap_err();
    assert!(matches!(err, AgentError::InvalidInputFormat { .. }));
  }

  #[tokio::test]
  async fn test_text_only_upload_still_generates() {
    let agent = service(echo_model(1));
    let report = agent.run(b"platform,notes\nTwitter,hello\n").await.unwrap();
    assert!(report.summary.is_empty());
    assert!(report.kg_tip.is_empty());
  }

  struct SlowModel;

  #[async_trait]
  impl LanguageModel for SlowModel {
    async fn generate(&self, _prompt: &str) -> Result<String, AgentError> {
      tokio::time::sleep(Duration::from_secs(30)).await;
      Ok("too late".to_string())
    }

    fn model_name(&self) -> String {
      "slow".to_string()
    }
  }

  #[tokio::test(start_paused = true)]
  async fn test_model_timeout_skips_store_insert() {
    let store = Arc::new(SimilarityStore::in_memory(0.2, 128));
    let agent = AgentService::new(store.clone(), Arc::new(SlowModel), Duration::from_secs(2));

    let err = agent.run(UPLOAD).await.unwrap_err();
    assert!(matches!(err, AgentError::ModelTimeout { seconds: 2 }));
    assert_eq!(store.count().await.unwrap(), 0);
  }

  struct BrokenDatabase;

  #[async_trait]
  impl VectorDatabase for BrokenDatabase {
    async fn query_nearest(&self, _query: &[f32]) -> anyhow::Result<Option<NearestMatch>> {
      Err(anyhow::anyhow!("disk on fire"))
    }

    async fn insert(&self, _record: SimilarityRecord) -> anyhow::Result<()> {
      Err(anyhow::anyhow!("disk on fire"))
    }

    async fn count(&self) -> anyhow::Result<usize> {
      Err(anyhow::anyhow!("disk on fire"))
    }
  }

  #[tokio::test]
  async fn test_store_failures_degrade_silently() {
    let store = SimilarityStore::new(
      Arc::new(HashingEmbedder::new(32)),
      Arc::new(BrokenDatabase),
      0.2,
    );
    let agent = AgentService::new(Arc::new(store), Arc::new(echo_model(1)), Duration::from_secs(5));

    let report = agent.run(UPLOAD).await.unwrap();
    assert!(!report.rag);
    assert!(!report.insights.is_empty());
  }
}
