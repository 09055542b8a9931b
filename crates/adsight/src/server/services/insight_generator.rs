//! Prompt assembly and bounded model calls

use std::sync::Arc;
use std::time::Duration;

use super::llm::LanguageModel;
use super::summarizer::AdMetricsSummary;
use crate::error::AgentError;

const PROMPT_BODY: &str = "You are a marketing analytics expert. Given the following ad performance summary:
{summary}

1. Provide 2-3 actionable insights about the ad performance.
2. Suggest 2 creative improvements for future campaigns.
3. If you see any underperforming metrics, mention them and suggest how to improve.
Respond in clear bullet points.
";

/// Context block placed ahead of the instructions
pub fn build_context(similar_insight: Option<&str>, kg_tip: &str) -> String {
  let mut context = String::new();
  if let Some(similar) = similar_insight {
    context.push_str(&format!("Past similar campaign insights: {similar}\n\n"));
  }
  if !kg_tip.is_empty() {
    context.push_str(kg_tip);
    context.push_str("\n\n");
  }
  context
}

/// Full prompt text sent to the model
pub fn build_prompt(context: &str, summary: &AdMetricsSummary) -> String {
  format!("{context}{}", PROMPT_BODY.replace("{summary}", &summary.render()))
}

pub struct InsightGenerator {
  model: Arc<dyn LanguageModel>,
  timeout: Duration,
}

impl InsightGenerator {
  pub fn new(model: Arc<dyn LanguageModel>, timeout: Duration) -> Self {
    Self { model, timeout }
  }

  pub fn model_name(&self) -> String {
    self.model.model_name()
  }

  /// Ask the model for insights; the raw response is returned verbatim
  pub async fn generate(
    &self,
    context: &str,
    summary: &AdMetricsSummary,
  ) -> Result<String, AgentError> {
    let prompt = build_prompt(context, summary);
    tracing::debug!(model = %self.model.model_name(), prompt_len = prompt.len(), "Sending prompt");

    match tokio::time::timeout(self.timeout, self.model.generate(&prompt)).await {
      Ok(result) => result,
      Err(_) => Err(AgentError::ModelTimeout { seconds: self.timeout.as_secs() }),
    }
  }
}
