//! WebSocket Transport - tokio-tungstenite Connections
//!
//! Opens plain or TLS WebSocket connections and exposes them through the
//! `Connection` port. Control frames stay inside this module: pings are
//! answered by tungstenite, pongs are dropped, and a close frame ends the
//! message stream cleanly.

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, instrument};

use crate::ports::{Connection, RawMessage, Transport};

/// Transport connecting to `ws://` and `wss://` addresses.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketTransport;

impl WebSocketTransport {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;

    #[instrument(skip(self))]
    async fn connect(&self, address: &str) -> Result<WebSocketConnection> {
        let (stream, response) = connect_async(address)
            .await
            .with_context(|| format!("WebSocket connection to {address} failed"))?;

        info!(status = %response.status(), "WebSocket connected");
        Ok(WebSocketConnection {
            stream,
            closed: false,
        })
    }
}

/// One open WebSocket, owned by a single feed task.
pub struct WebSocketConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    /// Set once a close frame arrives; later reads return `None`.
    closed: bool,
}

#[async_trait]
impl Connection for WebSocketConnection {
    async fn send(&mut self, text: String) -> Result<()> {
        self.stream
            .send(Message::Text(text))
            .await
            .context("Failed to send WebSocket frame")
    }

    async fn next_message(&mut self) -> Option<Result<RawMessage>> {
        if self.closed {
            return None;
        }

        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(RawMessage::Text(text))),
                Ok(Message::Binary(data)) => return Some(Ok(RawMessage::Binary(data))),
                Ok(Message::Ping(data)) => {
                    // Pong is handled automatically by tungstenite
                    debug!(len = data.len(), "WebSocket ping received");
                }
                Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => {}
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "WebSocket close frame received");
                    self.closed = true;
                    return None;
                }
                Err(e) => return Some(Err(anyhow::anyhow!("WebSocket error: {e}"))),
            }
        }
    }
}

impl std::fmt::Debug for WebSocketConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketConnection")
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}
