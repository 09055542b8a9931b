use anyhow::{anyhow, Context, Result};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

use crate::cli::client::get_client;
use crate::cli::display::{display_preview, display_report, display_scores};
use crate::cli::server_manager::{find_sibling_binary, ServerManager};
use crate::evaluation::{evaluate_path, parse_report_line, ReportedScores, SAMPLE_EVALUATION_CSV};
use crate::feedback::{FeedbackLog, FeedbackRecord};
use crate::server::services::summarizer::AdTable;

/// Rows shown before upload
const PREVIEW_ROWS: usize = 10;

/// Wall clock allowed for an external evaluation run
pub const EXTERNAL_EVALUATION_TIMEOUT: Duration = Duration::from_secs(180);

/// Rating and comment attached to an analysis
pub struct FeedbackInput {
  pub rating: u8,
  pub comment: String,
  pub log_path: PathBuf,
}

/// Preview a CSV, run the agent on it and show the report
pub async fn analyze(path: &Path, save: Option<&Path>, feedback: Option<FeedbackInput>) -> Result<()> {
  let contents =
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

  // Preview locally; the server stays the authority on whether the file parses
  match AdTable::from_csv_bytes(&contents) {
    Ok(table) => display_preview(table.columns(), table.head(PREVIEW_ROWS)),
    Err(e) => eprintln!("{} Could not preview {}: {}", "!".yellow(), path.display(), e),
  }

  let client = get_client()?;
  ServerManager::new(&client).ensure_server_running().await?;

  println!("{}", "Processing your file and generating insights... This may take a moment.".dimmed());
  let file_name = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_else(|| "upload.csv".into());
  let report = client.run_agent(&file_name, contents).await?;

  display_report(&report);

  if let Some(save_path) = save {
    std::fs::write(save_path, &report.insights)
      .with_context(|| format!("Failed to save insights to {}", save_path.display()))?;
    println!("{} Saved insights to {}", "✓".green(), save_path.display().to_string().cyan());
  }

  if let Some(input) = feedback {
    let record = FeedbackRecord::new(input.rating, &input.comment, &report.insights, &report.summary.render())?;
    FeedbackLog::new(&input.log_path).append(&record)?;
    println!("{} Thank you for your feedback!", "✓".green());
  }

  Ok(())
}

/// Score an evaluation CSV and show the metrics as percentages
pub async fn evaluate(path: &Path, external: bool) -> Result<()> {
  println!(
    "{}",
    "Running evaluation and benchmarking your agent (may take up to 3 minutes for large files)...".dimmed()
  );

  if external {
    let outcome = run_external_evaluation(path).await?;
    match outcome {
      ExternalEvaluation::Scores(scores) => display_scores(&scores),
      ExternalEvaluation::Unparsed(output) => {
        println!("{} Evaluation complete! Raw output:", "✓".green());
        println!("{output}");
      }
    }
    return Ok(());
  }

  let path = path.to_path_buf();
  let report = tokio::task::spawn_blocking(move || evaluate_path(path))
    .await
    .map_err(|e| anyhow!("Evaluation task failed: {}", e))??;

  tracing::debug!(rows = report.rows, "Evaluated rows");
  display_scores(&ReportedScores::from(&report));
  Ok(())
}

/// What an external evaluation printed
#[derive(Debug, PartialEq)]
pub enum ExternalEvaluation {
  Scores(ReportedScores),
  /// Succeeded without the expected report line
  Unparsed(String),
}

/// Run `adsight_eval` as a child process and parse its report line
pub async fn run_external_evaluation(path: &Path) -> Result<ExternalEvaluation> {
  let binary = find_sibling_binary("adsight_eval")?;
  run_evaluation_process(&binary, path, EXTERNAL_EVALUATION_TIMEOUT).await
}

pub async fn run_evaluation_process(binary: &Path, path: &Path, limit: Duration) -> Result<ExternalEvaluation> {
  let mut command = Command::new(binary);
  command.arg(path).kill_on_drop(true);

  let output = tokio::time::timeout(limit, command.output())
    .await
    .map_err(|_| anyhow!("Failed to run evaluation: timed out after {} seconds", limit.as_secs()))?
    .map_err(|e| anyhow!("Failed to run evaluation: {}", e))?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    return Err(anyhow!("Error running evaluation: {}", stderr.trim()));
  }

  let stdout = String::from_utf8_lossy(&output.stdout).to_string();
  Ok(match parse_report_line(&stdout) {
    Some(scores) => ExternalEvaluation::Scores(scores),
    None => ExternalEvaluation::Unparsed(stdout),
  })
}

/// Write the sample evaluation file
pub fn sample_eval(path: &Path) -> Result<()> {
  std::fs::write(path, SAMPLE_EVALUATION_CSV)
    .with_context(|| format!("Failed to write sample evaluation CSV to {}", path.display()))?;

  println!("{} Wrote sample evaluation CSV to {}", "✓".green(), path.display().to_string().cyan());
  println!("  Columns: {} (agent output) and {} (expected answer)", "output".bold(), "reference".bold());
  Ok(())
}
