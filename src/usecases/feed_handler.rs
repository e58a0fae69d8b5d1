//! Feed Handler - Concurrent Feed Lifecycle Orchestration
//!
//! Runs every registered feed as its own tokio task:
//! connect → subscribe → receive-loop. Each inbound message is handed to
//! the feed's handler and fully processed before the next one is read, so
//! per-feed event order is arrival order. Feeds interleave freely.
//!
//! When a task exits the `Supervisor` decides whether siblings keep
//! running. Panics inside a feed are contained and reported as failures.

use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures_util::FutureExt;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

use super::feed_status::{FeedState, FeedStatus, FeedStatusBoard};
use super::supervisor::{FeedOutcome, Isolate, Supervisor, Verdict};
use crate::error::{DuplicateFeedError, FeedError, panic_message};
use crate::ports::{Connection, Feed, FeedObserver, Transport};

/// Observer used when none is installed.
struct SilentObserver;

impl FeedObserver for SilentObserver {}

/// Per-feed outcomes of a completed `run()`, in completion order.
#[derive(Debug, Default)]
pub struct RunSummary {
  outcomes: Vec<(String, FeedOutcome)>,
}

impl RunSummary {
  pub fn outcomes(&self) -> &[(String, FeedOutcome)] {
    &self.outcomes
  }

  pub fn outcome(&self, feed: &str) -> Option<&FeedOutcome> {
    self
      .outcomes
      .iter()
      .find(|(id, _)| id == feed)
      .map(|(_, outcome)| outcome)
  }

  /// Feeds that ended with an error, with the error.
  pub fn failures(&self) -> impl Iterator<Item = &FeedError> {
    self.outcomes.iter().filter_map(|(_, outcome)| match outcome {
      FeedOutcome::Failed(e) => Some(e),
      FeedOutcome::Closed => None,
    })
  }

  pub fn closed_count(&self) -> usize {
    self
      .outcomes
      .iter()
      .filter(|(_, o)| matches!(o, FeedOutcome::Closed))
      .count()
  }

  pub fn len(&self) -> usize {
    self.outcomes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.outcomes.is_empty()
  }
}

/// Owns the registered feeds and drives them over one transport.
pub struct FeedHandler<T: Transport> {
  /// Shared by every feed task.
  transport: Arc<T>,
  /// Registration order.
  feeds: Vec<Arc<dyn Feed>>,
  /// Parallel to `feeds`.
  statuses: Vec<Arc<FeedStatus>>,
  /// Registered identities, for duplicate detection.
  ids: HashSet<String>,
  /// Exit policy.
  supervisor: Arc<dyn Supervisor>,
  /// Lifecycle hooks (metrics).
  observer: Arc<dyn FeedObserver>,
}

impl<T: Transport> FeedHandler<T> {
  /// Create an empty handler with the isolating supervisor.
  pub fn new(transport: T) -> Self {
    Self {
      transport: Arc::new(transport),
      feeds: Vec::new(),
      statuses: Vec::new(),
      ids: HashSet::new(),
      supervisor: Arc::new(Isolate),
      observer: Arc::new(SilentObserver),
    }
  }

  #[must_use]
  pub fn with_supervisor(mut self, supervisor: Arc<dyn Supervisor>) -> Self {
    self.supervisor = supervisor;
    self
  }

  #[must_use]
  pub fn with_observer(mut self, observer: Arc<dyn FeedObserver>) -> Self {
    self.observer = observer;
    self
  }

  /// Register a feed. Identities must be unique within one handler.
  pub fn add_feed(&mut self, feed: impl Feed) -> Result<(), DuplicateFeedError> {
    let id = feed.id().to_string();
    if !self.ids.insert(id.clone()) {
      return Err(DuplicateFeedError(id));
    }
    debug!(feed = %id, address = feed.address(), "Feed registered");
    self.statuses.push(Arc::new(FeedStatus::new(id)));
    self.feeds.push(Arc::new(feed));
    Ok(())
  }

  /// Registered feed identities in registration order.
  pub fn feed_ids(&self) -> impl Iterator<Item = &str> {
    self.feeds.iter().map(|f| f.id())
  }

  pub fn len(&self) -> usize {
    self.feeds.len()
  }

  pub fn is_empty(&self) -> bool {
    self.feeds.is_empty()
  }

  /// Live view of every feed's state. Stays valid after `run()` consumes
  /// the handler.
  pub fn status_board(&self) -> FeedStatusBoard {
    FeedStatusBoard::new(self.statuses.clone())
  }

  /// Run every feed until all have exited, or until the supervisor asks
  /// for a shutdown.
  ///
  /// Returns the triggering error when a `Shutdown` verdict follows a
  /// failure. Dropping the returned future aborts every feed task.
  #[instrument(skip(self), fields(feeds = self.feeds.len()))]
  pub async fn run(self) -> Result<RunSummary, FeedError> {
    let mut tasks = JoinSet::new();

    for (feed, status) in self.feeds.iter().zip(&self.statuses) {
      let transport = Arc::clone(&self.transport);
      let feed = Arc::clone(feed);
      let status = Arc::clone(status);
      let observer = Arc::clone(&self.observer);

      tasks.spawn(async move {
        let id = feed.id().to_string();
        let result = AssertUnwindSafe(drive_feed(&*transport, &*feed, &status, &*observer))
          .catch_unwind()
          .await;

        let outcome = match result {
          Ok(Ok(())) => FeedOutcome::Closed,
          Ok(Err(e)) => FeedOutcome::Failed(e),
          Err(payload) => FeedOutcome::Failed(FeedError::Panicked {
            feed: id.clone(),
            message: panic_message(&*payload),
          }),
        };

        match &outcome {
          FeedOutcome::Closed => transition(&status, &*observer, FeedState::Closed),
          FeedOutcome::Failed(e) => {
            transition(&status, &*observer, FeedState::Failed);
            observer.on_failure(&id, e.stage());
          }
        }
        (id, outcome)
      });
    }

    info!(feed_count = tasks.len(), "Feed tasks spawned");

    let mut summary = RunSummary::default();
    while let Some(joined) = tasks.join_next().await {
      let (feed, outcome) = match joined {
        Ok(exit) => exit,
        Err(e) => {
          warn!(error = %e, "Feed task did not complete");
          continue;
        }
      };

      match &outcome {
        FeedOutcome::Closed => info!(feed = %feed, "Feed closed"),
        FeedOutcome::Failed(e) => {
          error!(feed = %feed, stage = e.stage(), error = %e, "Feed failed");
        }
      }

      if self.supervisor.on_exit(&feed, &outcome) == Verdict::Shutdown {
        warn!(feed = %feed, remaining = tasks.len(), "Supervisor requested shutdown");
        match outcome {
          FeedOutcome::Failed(e) => {
            self.shut_down(&mut tasks, &mut summary).await;
            return Err(e);
          }
          FeedOutcome::Closed => {
            summary.outcomes.push((feed, FeedOutcome::Closed));
            self.shut_down(&mut tasks, &mut summary).await;
            break;
          }
        }
      }

      summary.outcomes.push((feed, outcome));
    }

    info!(
      closed = summary.closed_count(),
      failed = summary.len() - summary.closed_count(),
      "All feed tasks finished"
    );
    Ok(summary)
  }

  /// Abort the remaining tasks. Exits that raced the abort keep their
  /// outcome; aborted feeds are recorded as closed.
  async fn shut_down(
    &self,
    tasks: &mut JoinSet<(String, FeedOutcome)>,
    summary: &mut RunSummary,
  ) {
    tasks.abort_all();
    while let Some(joined) = tasks.join_next().await {
      if let Ok(exit) = joined {
        summary.outcomes.push(exit);
      }
    }

    for status in &self.statuses {
      if !status.state().is_terminal() {
        transition(status, &*self.observer, FeedState::Closed);
        summary.outcomes.push((status.id().to_string(), FeedOutcome::Closed));
      }
    }
  }
}

fn transition(status: &FeedStatus, observer: &dyn FeedObserver, state: FeedState) {
  debug!(feed = status.id(), from = %status.state(), to = %state, "Feed state change");
  status.set_state(state);
  observer.on_state(status.id(), state);
}

/// One feed's lifecycle. Returns `Ok` when the transport closes cleanly.
#[instrument(skip_all, fields(feed = feed.id()))]
async fn drive_feed<T: Transport>(
  transport: &T,
  feed: &dyn Feed,
  status: &FeedStatus,
  observer: &dyn FeedObserver,
) -> Result<(), FeedError> {
  let id = feed.id();

  transition(status, observer, FeedState::Connecting);
  let mut connection = transport
    .connect(feed.address())
    .await
    .map_err(|source| FeedError::Connection {
      feed: id.to_string(),
      source,
    })?;

  transition(status, observer, FeedState::Subscribing);
  feed
    .subscribe(&mut connection as &mut dyn Connection)
    .await
    .map_err(|source| FeedError::Subscription {
      feed: id.to_string(),
      source,
    })?;

  transition(status, observer, FeedState::Receiving);
  info!(address = feed.address(), "Feed receiving");

  while let Some(next) = connection.next_message().await {
    let message = next.map_err(|source| FeedError::Receive {
      feed: id.to_string(),
      source,
    })?;

    let started = Instant::now();
    feed
      .handle_message(message)
      .await
      .map_err(|source| FeedError::Handler {
        feed: id.to_string(),
        source,
      })?;

    status.record_message();
    observer.on_message(id, started.elapsed());
  }

  Ok(())
}
