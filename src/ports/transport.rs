//! Transport Port - Connection to a Feed Endpoint
//!
//! The handler never touches sockets directly. A `Transport` opens a
//! `Connection` to a feed address; the connection sends subscription
//! frames and yields inbound messages until the peer closes.

use async_trait::async_trait;

/// One inbound frame, before any venue-specific parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawMessage {
  Text(String),
  Binary(Vec<u8>),
}

impl RawMessage {
  /// Text payload, if this is a text frame.
  pub fn as_text(&self) -> Option<&str> {
    match self {
      Self::Text(text) => Some(text),
      Self::Binary(_) => None,
    }
  }

  /// Payload size in bytes.
  pub fn len(&self) -> usize {
    match self {
      Self::Text(text) => text.len(),
      Self::Binary(data) => data.len(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl From<String> for RawMessage {
  fn from(text: String) -> Self {
    Self::Text(text)
  }
}

impl From<&str> for RawMessage {
  fn from(text: &str) -> Self {
    Self::Text(text.to_string())
  }
}

/// An established, exclusively-owned connection to one feed.
#[async_trait]
pub trait Connection: Send {
  /// Send a text frame (subscription requests and the like).
  async fn send(&mut self, text: String) -> anyhow::Result<()>;

  /// Next inbound message.
  ///
  /// `None` means the peer closed the connection cleanly. Control
  /// frames (ping/pong) are handled by the implementation and never
  /// surface here.
  async fn next_message(&mut self) -> Option<anyhow::Result<RawMessage>>;
}

/// Factory for connections, shared by all feed tasks.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
  type Connection: Connection + 'static;

  /// Open a connection to `address`.
  async fn connect(&self, address: &str) -> anyhow::Result<Self::Connection>;
}
