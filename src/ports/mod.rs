//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) the orchestrator requires from the
//! outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `Transport` / `Connection`: connect, send, receive
//! - `Feed`: per-venue subscribe + parse/dispatch
//! - `FeedObserver`: lifecycle hooks for metrics

pub mod feed;
pub mod observer;
pub mod transport;

pub use feed::Feed;
pub use observer::FeedObserver;
pub use transport::{Connection, RawMessage, Transport};
