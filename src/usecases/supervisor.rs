//! Feed Supervision - Deciding What a Feed Exit Means
//!
//! The orchestrator consults a `Supervisor` every time a feed task ends.
//! The supervisor only decides; the orchestrator carries out the verdict
//! (keep the siblings running, or abort them all and return the error).
//!
//! Policies:
//! - `Isolate`: a feed's failure affects only that feed (default)
//! - `FailFast`: the first failure stops every feed
//! - `CriticalFeeds`: failure of a named feed stops every feed

use std::collections::HashSet;
use std::sync::Arc;

use crate::config::{AppConfig, FailurePolicy};
use crate::error::FeedError;

/// How a feed task ended.
#[derive(Debug)]
pub enum FeedOutcome {
  /// Transport closed cleanly.
  Closed,
  /// Connect, subscribe, receive or handle failed, or the task panicked.
  Failed(FeedError),
}

impl FeedOutcome {
  pub const fn is_failure(&self) -> bool {
    matches!(self, Self::Failed(_))
  }
}

/// What the orchestrator should do after a feed task exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
  /// Leave sibling feeds running.
  Continue,
  /// Abort every remaining feed and return from `run()`.
  Shutdown,
}

/// Pluggable exit policy.
pub trait Supervisor: Send + Sync + 'static {
  fn on_exit(&self, feed: &str, outcome: &FeedOutcome) -> Verdict;
}

/// Every exit is isolated to its own feed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Isolate;

impl Supervisor for Isolate {
  fn on_exit(&self, _feed: &str, _outcome: &FeedOutcome) -> Verdict {
    Verdict::Continue
  }
}

/// Any failed feed brings the whole handler down.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailFast;

impl Supervisor for FailFast {
  fn on_exit(&self, _feed: &str, outcome: &FeedOutcome) -> Verdict {
    if outcome.is_failure() {
      Verdict::Shutdown
    } else {
      Verdict::Continue
    }
  }
}

/// Failures of the listed feeds are fatal; everything else is isolated.
#[derive(Debug, Clone, Default)]
pub struct CriticalFeeds {
  critical: HashSet<String>,
}

impl CriticalFeeds {
  pub fn new<I, S>(feeds: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      critical: feeds.into_iter().map(Into::into).collect(),
    }
  }

  pub fn is_critical(&self, feed: &str) -> bool {
    self.critical.contains(feed)
  }
}

impl Supervisor for CriticalFeeds {
  fn on_exit(&self, feed: &str, outcome: &FeedOutcome) -> Verdict {
    if outcome.is_failure() && self.is_critical(feed) {
      Verdict::Shutdown
    } else {
      Verdict::Continue
    }
  }
}

/// Pick the supervision policy described by the configuration.
pub fn build_supervisor(config: &AppConfig) -> Arc<dyn Supervisor> {
  if config.handler.failure_policy == FailurePolicy::FailFast {
    return Arc::new(FailFast);
  }

  let critical: Vec<&str> = config
    .feeds
    .iter()
    .filter(|f| f.critical)
    .map(|f| f.id.as_str())
    .collect();

  if critical.is_empty() {
    Arc::new(Isolate)
  } else {
    Arc::new(CriticalFeeds::new(critical))
  }
}
