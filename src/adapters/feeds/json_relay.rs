//! JSON Relay Feed - Venues That Already Publish Normalized Events
//!
//! For relays and gateways whose messages are already normalized JSON,
//! one per event or an array of them:
//!
//! ```json
//! {"type": "trade", "pair": "BTC-USD", "side": "buy", "amount": "0.1",
//!  "price": "42000", "timestamp": 1700000000.123}
//! ```
//!
//! `type` selects the callback; every other key becomes a named field.
//! `feed` and `receipt_timestamp` are stamped locally. Messages that are
//! not JSON objects, or name an unknown type, are skipped. Callback
//! failures are returned to the receive-loop and end the feed.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::config::FeedConfig;
use crate::domain::{EventKind, FieldValue, Fields, now_timestamp};
use crate::ports::{Connection, Feed, RawMessage};
use crate::usecases::callback::Callbacks;

/// Key naming the event kind in each JSON object.
const TYPE_KEY: &str = "type";

/// Generic feed relaying pre-normalized JSON events to callbacks.
#[derive(Debug, Clone)]
pub struct JsonRelayFeed {
    /// Feed identity, stamped on every event as `feed`.
    id: String,
    /// WebSocket endpoint.
    address: String,
    /// Frames sent verbatim after connecting.
    subscriptions: Vec<String>,
    /// Per-kind callbacks.
    callbacks: Callbacks,
}

impl JsonRelayFeed {
    pub fn new(id: impl Into<String>, address: impl Into<String>, callbacks: Callbacks) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
            subscriptions: Vec::new(),
            callbacks,
        }
    }

    /// Build from a `[[feeds]]` entry.
    pub fn from_config(config: &FeedConfig, callbacks: Callbacks) -> Self {
        Self::new(&config.id, &config.address, callbacks)
            .with_subscriptions(config.subscriptions.iter().cloned())
    }

    #[must_use]
    pub fn with_subscriptions(mut self, frames: impl IntoIterator<Item = String>) -> Self {
        self.subscriptions.extend(frames);
        self
    }

    pub fn callbacks(&self) -> &Callbacks {
        &self.callbacks
    }

    /// Turn one JSON object into an event kind and its named fields.
    ///
    /// Returns `None` when the object has no recognizable `type`.
    fn to_fields(&self, mut object: Map<String, Value>, receipt: f64) -> Option<(EventKind, Fields)> {
        let kind = match object.remove(TYPE_KEY) {
            Some(Value::String(name)) => match name.parse::<EventKind>() {
                Ok(kind) => kind,
                Err(_) => {
                    debug!(feed = %self.id, kind = %name, "Skipping unknown event type");
                    return None;
                }
            },
            _ => {
                debug!(feed = %self.id, "Skipping message without event type");
                return None;
            }
        };

        let mut fields: Fields = object.into_iter().collect();
        fields.insert("feed", self.id.as_str());
        fields.insert("receipt_timestamp", FieldValue::Float(receipt));
        Some((kind, fields))
    }

    async fn dispatch(&self, kind: EventKind, fields: Fields) -> Result<()> {
        let delivered = self
            .callbacks
            .dispatch(kind, fields)
            .await
            .with_context(|| format!("{kind} callback failed on feed {}", self.id))?;
        if !delivered {
            trace!(feed = %self.id, %kind, "No callback registered");
        }
        Ok(())
    }
}

#[async_trait]
impl Feed for JsonRelayFeed {
    fn id(&self) -> &str {
        &self.id
    }

    fn address(&self) -> &str {
        &self.address
    }

    async fn subscribe(&self, connection: &mut dyn Connection) -> Result<()> {
        for frame in &self.subscriptions {
            connection
                .send(frame.clone())
                .await
                .with_context(|| format!("Failed to send subscription on feed {}", self.id))?;
        }
        debug!(feed = %self.id, frames = self.subscriptions.len(), "Subscriptions sent");
        Ok(())
    }

    async fn handle_message(&self, message: RawMessage) -> Result<()> {
        let receipt = now_timestamp();

        let text = match &message {
            RawMessage::Text(text) => text.as_str(),
            RawMessage::Binary(data) => match std::str::from_utf8(data) {
                Ok(text) => text,
                Err(_) => {
                    debug!(feed = %self.id, len = data.len(), "Skipping non-UTF-8 binary frame");
                    return Ok(());
                }
            },
        };

        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => {
                debug!(feed = %self.id, error = %e, "Skipping malformed JSON message");
                return Ok(());
            }
        };

        let objects = match value {
            Value::Object(object) => vec![object],
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(object) => Some(object),
                    _ => {
                        debug!(feed = %self.id, "Skipping non-object JSON item in batch");
                        None
                    }
                })
                .collect(),
            _ => {
                debug!(feed = %self.id, "Skipping non-object JSON message");
                return Ok(());
            }
        };

        for object in objects {
            if let Some((kind, fields)) = self.to_fields(object, receipt) {
                self.dispatch(kind, fields).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use rust_decimal_macros::dec;

    use super::*;
    use crate::domain::{Side, Trade};
    use crate::usecases::callback::{CallbackAdapter, TradeCallback};

    fn relay() -> (JsonRelayFeed, Arc<Mutex<Vec<Trade>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callbacks = Callbacks::new().with(TradeCallback::new(CallbackAdapter::asynchronous(
            move |trade: Trade| {
                sink.lock().unwrap().push(trade);
                async { Ok(()) }
            },
        )));
        (JsonRelayFeed::new("relay", "ws://relay", callbacks), seen)
    }

    const TRADE: &str = r#"{"type":"trade","pair":"BTC-USD","side":"sell","amount":"0.1",
        "price":"42000.5","timestamp":1700000000.5,"feed":"spoofed"}"#;

    #[tokio::test]
    async fn test_trade_relayed_with_local_stamps() {
        let (feed, seen) = relay();
        feed.handle_message(RawMessage::from(TRADE)).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].feed, "relay");
        assert_eq!(seen[0].side, Side::Sell);
        assert_eq!(seen[0].price, dec!(42000.5));
        assert!(seen[0].receipt_timestamp > seen[0].timestamp);
    }

    #[tokio::test]
    async fn test_array_preserves_order() {
        let (feed, seen) = relay();
        let batch = format!("[{}, {}]", TRADE, TRADE.replace("BTC-USD", "ETH-USD"));
        feed.handle_message(RawMessage::Text(batch)).await.unwrap();

        let pairs: Vec<_> = seen.lock().unwrap().iter().map(|t| t.pair.clone()).collect();
        assert_eq!(pairs, vec!["BTC-USD", "ETH-USD"]);
    }

    #[tokio::test]
    async fn test_array_skips_non_object_items() {
        let (feed, seen) = relay();
        let batch = format!("[1, {}, \"noise\", null]", TRADE);
        feed.handle_message(RawMessage::Text(batch)).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].pair, "BTC-USD");
    }

    #[tokio::test]
    async fn test_garbage_and_unknown_types_skipped() {
        let (feed, seen) = relay();
        feed.handle_message(RawMessage::from("not json")).await.unwrap();
        feed.handle_message(RawMessage::from(r#"{"type":"heartbeat"}"#))
            .await
            .unwrap();
        feed.handle_message(RawMessage::from("42")).await.unwrap();
        feed.handle_message(RawMessage::Binary(vec![0xff, 0xfe]))
            .await
            .unwrap();
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unregistered_kind_is_ignored() {
        let (feed, _) = relay();
        let msg = r#"{"type":"funding","timestamp":1.0,"rate":"0.01"}"#;
        feed.handle_message(RawMessage::from(msg)).await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_event_fails_message() {
        let (feed, _) = relay();
        let msg = r#"{"type":"trade","pair":"BTC-USD","timestamp":1.0}"#;
        let err = feed.handle_message(RawMessage::from(msg)).await.unwrap_err();
        assert!(format!("{err:#}").contains("missing required field"));
    }
}
