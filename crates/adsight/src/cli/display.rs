//! Display formatting utilities for CLI output

use colored::*;

use crate::evaluation::ReportedScores;
use crate::server::services::agent::AgentReport;
use crate::server::services::summarizer::AdMetricsSummary;

/// Widest a preview cell may get before it is truncated
const MAX_CELL_WIDTH: usize = 24;

/// Render rows as a left-aligned text table
pub fn format_table(columns: &[String], rows: &[Vec<String>]) -> Vec<String> {
  let mut widths: Vec<usize> = columns.iter().map(|c| cell(c).chars().count()).collect();
  for row in rows {
    for (i, value) in row.iter().enumerate() {
      if let Some(width) = widths.get_mut(i) {
        *width = (*width).max(cell(value).chars().count());
      }
    }
  }

  let render = |values: &[String]| -> String {
    widths
      .iter()
      .enumerate()
      .map(|(i, &width)| {
        let value = values.get(i).map(|v| cell(v)).unwrap_or_default();
        format!("{value:<width$}")
      })
      .collect::<Vec<_>>()
      .join("  ")
      .trim_end()
      .to_string()
  };

  let mut lines = vec![render(columns)];
  lines.push(widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  "));
  lines.extend(rows.iter().map(|row| render(row)));
  lines
}

fn cell(value: &str) -> String {
  let value = value.replace(['\n', '\r'], " ");
  if value.chars().count() > MAX_CELL_WIDTH {
    let truncated: String = value.chars().take(MAX_CELL_WIDTH - 1).collect();
    format!("{truncated}…")
  } else {
    value
  }
}

/// Show the first rows of the upload before it is sent
pub fn display_preview(columns: &[String], rows: &[Vec<String>]) {
  println!("{}", "Preview of Uploaded Data".blue().bold());
  for line in format_table(columns, rows) {
    println!("{line}");
  }
  println!();
}

/// Format a statistic without trailing noise
pub fn format_number(value: f64) -> String {
  if value.fract() == 0.0 && value.abs() < 1e15 {
    format!("{value:.0}")
  } else {
    format!("{value:.4}").trim_end_matches('0').trim_end_matches('.').to_string()
  }
}

pub fn display_summary(summary: &AdMetricsSummary) {
  println!("{}", "Key Metrics Summary".blue().bold());
  if summary.is_empty() {
    println!("  {}", "No numeric columns found.".dimmed());
    println!();
    return;
  }

  let columns = vec!["metric".to_string(), "mean".to_string(), "min".to_string(), "max".to_string()];
  let rows: Vec<Vec<String>> = summary
    .iter()
    .map(|(name, stats)| {
      vec![name.to_string(), format_number(stats.mean), format_number(stats.min), format_number(stats.max)]
    })
    .collect();

  for line in format_table(&columns, &rows) {
    println!("  {line}");
  }
  println!();
}

/// Render a full agent report
pub fn display_report(report: &AgentReport) {
  println!("{} Insights generated!", "✓".green());
  println!();

  display_summary(&report.summary);

  println!("{}", "AI-Generated Insights & Suggestions".blue().bold());
  for line in report.insights.lines() {
    println!("  {}", line.bold());
  }
  println!();

  if report.rag {
    println!("{} {}", "↺".cyan(), "Informed by a similar earlier analysis".dimmed());
  }
  if !report.kg_tip.is_empty() {
    println!("{} {}", "Knowledge Graph Tip:".yellow().bold(), report.kg_tip);
  }

  println!("{} {}", "Columns:".dimmed(), report.columns.join(", "));
  println!("{} {}", "Number of rows:".dimmed(), report.num_rows);
}

/// Score as a percentage with one decimal
pub fn format_percentage(score: f64) -> String {
  format!("{:.1}%", score * 100.0)
}

pub fn display_scores(scores: &ReportedScores) {
  println!("{} Evaluation complete! Here are your results:", "✓".green());
  println!("  {:<10} {}", "ROUGE-1".bold(), format_percentage(scores.rouge1).cyan());
  println!("  {:<10} {}", "ROUGE-L".bold(), format_percentage(scores.rouge_l).cyan());
  println!("  {:<10} {}", "F1 Score".bold(), format_percentage(scores.f1).cyan());
}
