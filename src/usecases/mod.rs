//! Use Cases Layer - Dispatch and Orchestration
//!
//! Combines domain types with the port interfaces to implement the
//! handler's two workflows.
//!
//! Use cases:
//! - `callback`: per-kind event callbacks and the sync/async adapter
//! - `FeedHandler`: concurrent connect → subscribe → receive per feed
//! - `Supervisor`: what a feed exit means for its siblings
//! - `FeedStatusBoard`: live per-feed lifecycle state

pub mod callback;
pub mod feed_handler;
pub mod feed_status;
pub mod supervisor;

pub use feed_handler::{FeedHandler, RunSummary};
pub use feed_status::{FeedState, FeedStatus, FeedStatusBoard};
pub use supervisor::{
  CriticalFeeds, FailFast, FeedOutcome, Isolate, Supervisor, Verdict, build_supervisor,
};
