//! Feed Status - Per-Feed Lifecycle State and Counters
//!
//! Each feed task owns one `FeedStatus` and updates it as it moves through
//! `Idle → Connecting → Subscribing → Receiving → {Closed | Failed}`.
//! Readers (health endpoint, tests) see a consistent per-field view through
//! atomics; no locks are taken on the receive path.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

/// Lifecycle state of one feed task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FeedState {
  Idle = 0,
  Connecting = 1,
  Subscribing = 2,
  Receiving = 3,
  Closed = 4,
  Failed = 5,
}

impl FeedState {
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::Idle => "idle",
      Self::Connecting => "connecting",
      Self::Subscribing => "subscribing",
      Self::Receiving => "receiving",
      Self::Closed => "closed",
      Self::Failed => "failed",
    }
  }

  /// Terminal states are never left; there is no automatic reconnect.
  pub const fn is_terminal(self) -> bool {
    matches!(self, Self::Closed | Self::Failed)
  }

  const fn from_u8(value: u8) -> Self {
    match value {
      1 => Self::Connecting,
      2 => Self::Subscribing,
      3 => Self::Receiving,
      4 => Self::Closed,
      5 => Self::Failed,
      _ => Self::Idle,
    }
  }
}

impl fmt::Display for FeedState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Live status of a single feed.
#[derive(Debug)]
pub struct FeedStatus {
  /// Feed identity.
  id: String,
  /// Current `FeedState` as its discriminant.
  state: AtomicU8,
  /// Messages fully handled so far.
  messages: AtomicU64,
}

impl FeedStatus {
  pub fn new(id: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      state: AtomicU8::new(FeedState::Idle as u8),
      messages: AtomicU64::new(0),
    }
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn state(&self) -> FeedState {
    FeedState::from_u8(self.state.load(Ordering::Acquire))
  }

  pub(crate) fn set_state(&self, state: FeedState) {
    self.state.store(state as u8, Ordering::Release);
  }

  pub fn messages(&self) -> u64 {
    self.messages.load(Ordering::Relaxed)
  }

  pub(crate) fn record_message(&self) {
    self.messages.fetch_add(1, Ordering::Relaxed);
  }
}

/// Shared view over every registered feed's status, in registration order.
#[derive(Debug, Clone, Default)]
pub struct FeedStatusBoard {
  feeds: Vec<Arc<FeedStatus>>,
}

impl FeedStatusBoard {
  pub(crate) fn new(feeds: Vec<Arc<FeedStatus>>) -> Self {
    Self { feeds }
  }

  pub fn get(&self, id: &str) -> Option<&FeedStatus> {
    self.feeds.iter().find(|s| s.id() == id).map(Arc::as_ref)
  }

  pub fn iter(&self) -> impl Iterator<Item = &FeedStatus> {
    self.feeds.iter().map(Arc::as_ref)
  }

  pub fn len(&self) -> usize {
    self.feeds.len()
  }

  pub fn is_empty(&self) -> bool {
    self.feeds.is_empty()
  }

  /// True when at least one feed is delivering messages (degraded mode OK).
  pub fn any_receiving(&self) -> bool {
    self.iter().any(|s| s.state() == FeedState::Receiving)
  }

  /// True once every feed has reached a terminal state.
  pub fn all_terminal(&self) -> bool {
    self.iter().all(|s| s.state().is_terminal())
  }
}
