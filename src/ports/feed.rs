//! Feed Port - What the Orchestrator Drives
//!
//! A feed is one venue connection: where to connect, what to send once
//! connected, and how to turn each inbound message into callback
//! invocations. Parsing lives entirely on the feed side of this trait.

use async_trait::async_trait;

use super::transport::{Connection, RawMessage};

/// A registrable feed descriptor.
///
/// `id` is the feed's identity within one handler; two feeds with the
/// same id cannot be registered together.
#[async_trait]
pub trait Feed: Send + Sync + 'static {
  /// Unique feed identity (e.g. `"coinbase"`).
  fn id(&self) -> &str;

  /// Connection target passed to the transport.
  fn address(&self) -> &str;

  /// Send subscription request(s) over a freshly opened connection.
  async fn subscribe(&self, connection: &mut dyn Connection) -> anyhow::Result<()>;

  /// Parse one inbound message and dispatch any events it carries.
  ///
  /// The receive-loop awaits this before reading the next message, so
  /// events from one feed reach callbacks in arrival order.
  async fn handle_message(&self, message: RawMessage) -> anyhow::Result<()>;
}
