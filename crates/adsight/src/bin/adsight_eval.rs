//! Scores generated insights against references
//!
//! Prints `Average ROUGE-1: <f>, ROUGE-L: <f>, F1: <f>` on success. Any
//! failure prints `ERROR: ...` to stderr and exits with status 1.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use adsight::evaluation::{evaluate_path, DEFAULT_EVALUATION_FILE};

#[derive(Parser)]
#[command(name = "adsight_eval")]
#[command(about = "Average ROUGE-1, ROUGE-L and token F1 over an output/reference CSV")]
#[command(version)]
struct Args {
  /// CSV with `output` and `reference` columns
  #[arg(default_value = DEFAULT_EVALUATION_FILE)]
  path: PathBuf,
}

fn main() -> ExitCode {
  let args = Args::parse();

  // Progress goes to stderr; stdout carries only the report line
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("adsight=info,warn"));
  tracing_subscriber::registry()
    .with(fmt::layer().with_writer(std::io::stderr).without_time().with_target(false))
    .with(filter)
    .init();

  match evaluate_path(&args.path) {
    Ok(report) => {
      println!("{report}");
      ExitCode::SUCCESS
    }
    Err(e) => {
      eprintln!("ERROR: {e}");
      ExitCode::FAILURE
    }
  }
}
