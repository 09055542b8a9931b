//! Adsight REST Server
//!
//! HTTP API for the ad insights agent: uploads in, summaries and
//! recommendations out.

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use adsight::config::{AdsightConfig, EmbedderKind, VectorStoreKind};
use adsight::server::startup::start_server;

#[derive(Parser)]
#[command(name = "adsight_server")]
#[command(about = "Adsight REST API Server")]
#[command(version)]
struct Args {
  /// YAML configuration file
  #[arg(long, env = "ADSIGHT_CONFIG")]
  config: Option<PathBuf>,

  /// Server bind address
  #[arg(long, env = "ADSIGHT_BIND")]
  bind: Option<SocketAddr>,

  /// Base URL of the Ollama runtime
  #[arg(long, env = "ADSIGHT_OLLAMA_URL")]
  ollama_url: Option<String>,

  /// Model used to generate insights
  #[arg(long, env = "ADSIGHT_MODEL")]
  model: Option<String>,

  /// Seconds to wait for one model answer
  #[arg(long, env = "ADSIGHT_MODEL_TIMEOUT_SECS")]
  model_timeout_secs: Option<u64>,

  /// Distance below which a stored insight is reused
  #[arg(long, env = "ADSIGHT_SIMILARITY_THRESHOLD")]
  threshold: Option<f32>,

  /// Embedding function for the similarity store
  #[arg(long, value_enum, env = "ADSIGHT_EMBEDDER")]
  embedder: Option<EmbedderKind>,

  /// Vector database backend
  #[arg(long, value_enum, env = "ADSIGHT_VECTOR_STORE")]
  vector_store: Option<VectorStoreKind>,

  /// Enable verbose logging
  #[arg(short, long)]
  verbose: bool,
}

impl Args {
  fn apply(self, mut config: AdsightConfig) -> AdsightConfig {
    if let Some(bind) = self.bind {
      config.bind = bind;
    }
    if let Some(url) = self.ollama_url {
      config.model.ollama_url = url;
    }
    if let Some(model) = self.model {
      config.model.name = model;
    }
    if let Some(secs) = self.model_timeout_secs {
      config.model.timeout_secs = secs;
    }
    if let Some(threshold) = self.threshold {
      config.similarity.threshold = threshold;
    }
    if let Some(embedder) = self.embedder {
      config.similarity.embedder = embedder;
    }
    if let Some(store) = self.vector_store {
      config.similarity.vector_store = store;
    }
    config
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  // RUST_LOG wins; otherwise keep lance and friends quiet
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
    if args.verbose {
      EnvFilter::new("debug,hyper=info,lance=warn,lance_datafusion=warn,datafusion=warn")
    } else {
      EnvFilter::new("adsight=info,tower_http=info,lance=error,lance_datafusion=error,datafusion=error,warn")
    }
  });

  tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

  let config = AdsightConfig::load(args.config.as_deref())?;
  let config = args.apply(config);

  tracing::info!("Starting Adsight REST Server v{}", env!("CARGO_PKG_VERSION"));
  tracing::info!("Binding to address: {}", config.bind);

  start_server(config).await?;

  Ok(())
}
