//! Transport Adapters - Concrete `Transport` Implementations

pub mod websocket;

pub use websocket::{WebSocketConnection, WebSocketTransport};
