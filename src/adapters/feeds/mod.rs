//! Feed Adapters - Concrete `Feed` Implementations
//!
//! Venue parsers live here. Each one turns raw messages into named
//! fields and hands them to the per-kind callbacks.
//!
//! - `JsonRelayFeed`: relays that already publish normalized JSON

pub mod json_relay;

pub use json_relay::JsonRelayFeed;
