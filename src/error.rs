//! Error Types - Dispatch and Feed Lifecycle Failures
//!
//! Typed errors for the two layers of the handler:
//! - Dispatch: invalid event fields and user callback failures
//! - Orchestration: per-feed connect/subscribe/receive/handle failures
//!
//! Port traits return `anyhow::Result`; these types wrap those errors
//! with the stage and feed they came from.

use thiserror::Error;

use crate::domain::event::EventKind;

/// A required named field was missing or unusable when invoking a callback.
#[derive(Debug, Error)]
pub enum InvalidEventError {
    #[error("{kind} event is missing required field `{field}`")]
    MissingField {
        kind: EventKind,
        field: &'static str,
    },

    #[error("{kind} event field `{field}` is not a valid {expected}")]
    InvalidField {
        kind: EventKind,
        field: &'static str,
        expected: &'static str,
    },
}

/// Failure raised while running a user callback.
#[derive(Debug, Error)]
pub enum CallbackError {
    #[error("callback failed: {0}")]
    Failed(#[source] anyhow::Error),

    #[error("callback panicked: {0}")]
    Panicked(String),

    #[error("worker pool is closed")]
    PoolClosed,
}

/// Error returned by an event callback variant.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    InvalidEvent(#[from] InvalidEventError),

    #[error(transparent)]
    Callback(#[from] CallbackError),
}

/// Failure that terminated a single feed task.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed `{feed}` failed to connect: {source}")]
    Connection {
        feed: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("feed `{feed}` failed to subscribe: {source}")]
    Subscription {
        feed: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("feed `{feed}` receive error: {source}")]
    Receive {
        feed: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("feed `{feed}` message handler failed: {source}")]
    Handler {
        feed: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("feed `{feed}` task panicked: {message}")]
    Panicked { feed: String, message: String },
}

impl FeedError {
    /// Identity of the feed that failed.
    pub fn feed(&self) -> &str {
        match self {
            Self::Connection { feed, .. }
            | Self::Subscription { feed, .. }
            | Self::Receive { feed, .. }
            | Self::Handler { feed, .. }
            | Self::Panicked { feed, .. } => feed,
        }
    }

    /// Lifecycle stage label, used as a metrics label.
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::Connection { .. } => "connect",
            Self::Subscription { .. } => "subscribe",
            Self::Receive { .. } => "receive",
            Self::Handler { .. } => "handle",
            Self::Panicked { .. } => "panic",
        }
    }
}

/// A feed with the same identity is already registered.
#[derive(Debug, Error)]
#[error("feed `{0}` is already registered")]
pub struct DuplicateFeedError(pub String);

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
