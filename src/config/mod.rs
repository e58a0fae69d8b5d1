//! Configuration Module - TOML-based Handler Configuration
//!
//! Loads and validates configuration from `config.toml`.
//! Feed endpoints, subscription frames and the failure policy are
//! externalized here - nothing venue-specific is hardcoded in the
//! orchestration layer.

pub mod loader;

use serde::Deserialize;

/// Top-level handler configuration.
///
/// Loaded from `config.toml` at startup. All fields are validated
/// before any feed is started.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Handler identity and runtime knobs.
  pub handler: HandlerConfig,
  /// Feed connections, in start order.
  pub feeds: Vec<FeedConfig>,
  /// Metrics and monitoring.
  #[serde(default)]
  pub metrics: MetricsConfig,
}

/// Handler identity and runtime configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HandlerConfig {
  /// Human-readable handler name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// What a failed feed means for the others.
  #[serde(default)]
  pub failure_policy: FailurePolicy,
  /// Synchronous callbacks allowed to run at once on the worker pool.
  #[serde(default = "default_max_blocking_callbacks")]
  pub max_blocking_callbacks: usize,
}

/// Handler-wide failure policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
  /// A failed feed stops on its own; siblings keep running.
  #[default]
  Isolate,
  /// The first failed feed stops every feed.
  FailFast,
}

/// Individual feed configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
  /// Unique feed identity, also used as the `feed` field of its events.
  pub id: String,
  /// WebSocket endpoint.
  pub address: String,
  /// Text frames sent verbatim right after connecting.
  #[serde(default)]
  pub subscriptions: Vec<String>,
  /// Failure of a critical feed stops the whole handler.
  #[serde(default)]
  pub critical: bool,
}

/// Metrics and monitoring configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  /// Enable Prometheus metrics export.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Metrics server bind address.
  #[serde(default = "default_metrics_addr")]
  pub bind_address: String,
  /// Health check endpoint port.
  #[serde(default = "default_health_port")]
  pub health_port: u16,
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self {
      enabled: default_true(),
      bind_address: default_metrics_addr(),
      health_port: default_health_port(),
    }
  }
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_true() -> bool {
  true
}

fn default_max_blocking_callbacks() -> usize {
  8
}

fn default_metrics_addr() -> String {
  "0.0.0.0:9090".to_string()
}

fn default_health_port() -> u16 {
  8080
}
