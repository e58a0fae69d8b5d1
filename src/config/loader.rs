//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    handler = %config.handler.name,
    feeds = config.feeds.len(),
    policy = ?config.handler.failure_policy,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig = toml::from_str(content).context("Failed to parse config.toml")?;
  validate_config(&config)?;
  Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - At least one feed, each with a unique non-empty id
/// - Non-empty feed addresses
/// - A usable worker pool size
fn validate_config(config: &AppConfig) -> Result<()> {
  anyhow::ensure!(
    !config.feeds.is_empty(),
    "At least one feed must be configured"
  );

  let mut seen = HashSet::new();
  for (i, feed) in config.feeds.iter().enumerate() {
    anyhow::ensure!(!feed.id.trim().is_empty(), "Feed {} has empty id", i);
    anyhow::ensure!(
      seen.insert(feed.id.as_str()),
      "Feed id `{}` is configured more than once",
      feed.id
    );
    anyhow::ensure!(
      !feed.address.trim().is_empty(),
      "Feed {} ({}) has empty address",
      i,
      feed.id
    );
  }

  anyhow::ensure!(
    config.handler.max_blocking_callbacks > 0,
    "max_blocking_callbacks must be positive"
  );

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::FailurePolicy;

  const MINIMAL: &str = r#"
[handler]
name = "test"

[[feeds]]
id = "coinbase"
address = "wss://ws-feed.exchange.coinbase.com"
"#;

  #[test]
  fn test_load_nonexistent_file() {
    let result = load_config("nonexistent.toml");
    assert!(result.is_err());
  }

  #[test]
  fn test_defaults_applied() {
    let config = parse_config(MINIMAL).unwrap();
    assert_eq!(config.handler.log_level, "info");
    assert_eq!(config.handler.failure_policy, FailurePolicy::Isolate);
    assert_eq!(config.handler.max_blocking_callbacks, 8);
    assert!(config.feeds[0].subscriptions.is_empty());
    assert!(!config.feeds[0].critical);
    assert!(config.metrics.enabled);
    assert_eq!(config.metrics.health_port, 8080);
  }

  #[test]
  fn test_full_config() {
    let config = parse_config(
      r#"
[handler]
name = "relay"
log_level = "debug"
failure_policy = "fail_fast"
max_blocking_callbacks = 2

[[feeds]]
id = "a"
address = "ws://localhost:1"
subscriptions = ['{"op":"subscribe"}']
critical = true

[metrics]
enabled = false
bind_address = "127.0.0.1:9100"
"#,
    )
    .unwrap();
    assert_eq!(config.handler.failure_policy, FailurePolicy::FailFast);
    assert_eq!(config.feeds[0].subscriptions.len(), 1);
    assert!(config.feeds[0].critical);
    assert!(!config.metrics.enabled);
    assert_eq!(config.metrics.bind_address, "127.0.0.1:9100");
  }

  #[test]
  fn test_rejects_duplicate_feed_ids() {
    let text = format!("{MINIMAL}\n[[feeds]]\nid = \"coinbase\"\naddress = \"wss://other\"\n");
    let err = parse_config(&text).unwrap_err();
    assert!(err.to_string().contains("more than once"));
  }

  #[test]
  fn test_rejects_no_feeds_and_empty_address() {
    assert!(parse_config("feeds = []\n[handler]\nname = \"x\"\n").is_err());
    assert!(
      parse_config("[handler]\nname = \"x\"\n[[feeds]]\nid = \"a\"\naddress = \"\"\n").is_err()
    );
  }

  #[test]
  fn test_rejects_zero_pool() {
    let text = MINIMAL.replace("name = \"test\"", "name = \"test\"\nmax_blocking_callbacks = 0");
    assert!(parse_config(&text).is_err());
  }
}
