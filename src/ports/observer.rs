//! Feed Observer Port - Lifecycle Hooks for Metrics
//!
//! Lets an outer layer (Prometheus, tests) watch feed tasks without the
//! orchestrator depending on any metrics backend.

use std::time::Duration;

use crate::usecases::feed_status::FeedState;

/// Receives feed lifecycle notifications. All hooks default to no-ops.
pub trait FeedObserver: Send + Sync + 'static {
  /// A feed task moved to `state`.
  fn on_state(&self, _feed: &str, _state: FeedState) {}

  /// A message was fully handled in `elapsed`.
  fn on_message(&self, _feed: &str, _elapsed: Duration) {}

  /// A feed task failed at `stage` (`connect`, `subscribe`, ...).
  fn on_failure(&self, _feed: &str, _stage: &'static str) {}
}
