use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use adsight::cli::commands::{self, FeedbackInput};
use adsight::evaluation::DEFAULT_EVALUATION_FILE;
use adsight::feedback::DEFAULT_FEEDBACK_FILE;

#[derive(Parser)]
#[command(name = "adsight")]
#[command(
  about = "Adsight - Marketing Ad Insights Agent\nSummarize ad performance CSVs and get recommendations from a local LLM"
)]
#[command(version)]
struct Cli {
  /// Enable verbose logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Command,
}

/// Optional rating of the generated insights
#[derive(Args)]
struct FeedbackArgs {
  /// How helpful the insights were, 1 to 5
  #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
  rating: Option<u8>,

  /// Additional comment stored with the rating
  #[arg(long, requires = "rating", default_value = "")]
  comment: String,

  /// Feedback log to append to
  #[arg(long, default_value = DEFAULT_FEEDBACK_FILE)]
  feedback_log: PathBuf,
}

#[derive(Subcommand)]
enum Command {
  /// Upload an ad performance CSV and show the generated insights
  Analyze {
    /// Ad performance CSV
    path: PathBuf,
    /// Also write the insights text to this file
    #[arg(short, long)]
    save: Option<PathBuf>,
    #[command(flatten)]
    feedback: FeedbackArgs,
  },
  /// Score outputs against references with ROUGE-1, ROUGE-L and token F1
  Evaluate {
    /// CSV with `output` and `reference` columns
    #[arg(default_value = DEFAULT_EVALUATION_FILE)]
    path: PathBuf,
    /// Run the adsight_eval binary instead of scoring in-process
    #[arg(long)]
    external: bool,
  },
  /// Write a sample evaluation CSV
  SampleEval {
    /// Destination file
    #[arg(default_value = "outputs_vs_refs_sample.csv")]
    path: PathBuf,
  },
}

async fn handle(command: Command) -> Result<()> {
  match command {
    Command::Analyze { path, save, feedback } => {
      let feedback = feedback.rating.map(|rating| FeedbackInput {
        rating,
        comment: feedback.comment,
        log_path: feedback.feedback_log,
      });
      commands::analyze(&path, save.as_deref(), feedback).await
    }
    Command::Evaluate { path, external } => commands::evaluate(&path, external).await,
    Command::SampleEval { path } => commands::sample_eval(&path),
  }
}

#[tokio::main]
async fn main() {
  let cli = Cli::parse();

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
    EnvFilter::new(if cli.verbose { "adsight=debug,warn" } else { "warn" })
  });
  tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();

  if let Err(e) = handle(cli.command).await {
    eprintln!("{} {:#}", "Error:".red().bold(), e);
    std::process::exit(1);
  }
}
