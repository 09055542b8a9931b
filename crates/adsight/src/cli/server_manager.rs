//! Server management for automatic server startup
//!
//! Starts a local `adsight_server` when the configured server is a loopback
//! address that does not answer yet.

use anyhow::{anyhow, Result};
use colored::*;
use reqwest::Url;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Duration;
use tokio::time::sleep;

use crate::cli::client::AdsightClient;

// Server startup configuration
const SERVER_STARTUP_TIMEOUT_SECS: u64 = 30;
const SERVER_CHECK_INTERVAL_MS: u64 = 500;

/// Manages the local agent server lifecycle
pub struct ServerManager<'a> {
  client: &'a AdsightClient,
}

impl<'a> ServerManager<'a> {
  pub fn new(client: &'a AdsightClient) -> Self {
    Self { client }
  }

  /// Ensure the server is running, starting it if necessary
  pub async fn ensure_server_running(&self) -> Result<()> {
    if self.client.health_check().await.is_ok() {
      return Ok(());
    }

    let bind = local_bind_address(&self.client.config().base_url).ok_or_else(|| {
      anyhow!("Failed to connect to backend at {}", self.client.config().base_url)
    })?;

    eprintln!("{} Starting local adsight server on {}...", "→".cyan(), bind);
    self.start_server(&bind)?;
    self.wait_for_server().await?;
    eprintln!("{} Adsight server is ready", "✓".green());
    Ok(())
  }

  fn start_server(&self, bind: &str) -> Result<()> {
    let server_binary = find_sibling_binary("adsight_server")?;

    Command::new(&server_binary)
      .args(["--bind", bind])
      .stdout(Stdio::null())
      .stderr(Stdio::null())
      .stdin(Stdio::null())
      .spawn()
      .map_err(|e| anyhow!("Failed to start adsight server {}: {}", server_binary.display(), e))?;

    Ok(())
  }

  async fn wait_for_server(&self) -> Result<()> {
    let max_attempts = (SERVER_STARTUP_TIMEOUT_SECS * 1000) / SERVER_CHECK_INTERVAL_MS;

    for _ in 0..max_attempts {
      if self.client.health_check().await.is_ok() {
        return Ok(());
      }
      sleep(Duration::from_millis(SERVER_CHECK_INTERVAL_MS)).await;
    }

    Err(anyhow!("Server failed to start within {} seconds", SERVER_STARTUP_TIMEOUT_SECS))
  }
}

/// `host:port` to bind when the URL points at this machine
pub fn local_bind_address(base_url: &str) -> Option<String> {
  let url = Url::parse(base_url).ok()?;
  let host = url.host_str()?;
  if !matches!(host, "127.0.0.1" | "localhost" | "[::1]" | "::1") {
    return None;
  }
  let port = url.port_or_known_default()?;
  let host = if host == "localhost" { "127.0.0.1" } else { host };
  Some(format!("{host}:{port}"))
}

/// Locate a companion binary: next to the running executable, then PATH
pub fn find_sibling_binary(name: &str) -> Result<PathBuf> {
  let file_name = format!("{name}{}", std::env::consts::EXE_SUFFIX);

  if let Some(dir) = std::env::current_exe().ok().and_then(|exe| exe.parent().map(PathBuf::from)) {
    let candidate = dir.join(&file_name);
    if candidate.is_file() {
      return Ok(candidate);
    }
  }

  if let Some(paths) = std::env::var_os("PATH") {
    for dir in std::env::split_paths(&paths) {
      let candidate = dir.join(&file_name);
      if candidate.is_file() {
        return Ok(candidate);
      }
    }
  }

  Err(anyhow!("{} binary not found. Please ensure it's installed or build it locally.", name))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_local_bind_address() {
    assert_eq!(local_bind_address("http://127.0.0.1:8000"), Some("127.0.0.1:8000".to_string()));
    assert_eq!(local_bind_address("http://localhost:9001"), Some("127.0.0.1:9001".to_string()));
    assert_eq!(local_bind_address("http://localhost"), Some("127.0.0.1:80".to_string()));
    assert_eq!(local_bind_address("http://agents.example.com:8000"), None);
    assert_eq!(local_bind_address("not a url"), None);
  }

  #[test]
  fn test_missing_binary_is_an_error() {
    let err = find_sibling_binary("adsight_binary_that_does_not_exist").unwrap_err();
    assert!(err.to_string().contains("not found"));
  }
}
