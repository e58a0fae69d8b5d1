//! Normalized Event Records - What User Callbacks Receive
//!
//! One record per fixed-schema event kind. Field declaration order is the
//! documented forwarding order; optional trailing fields are `None` unless
//! the callback variant was built with the matching flag enabled.

use rust_decimal::Decimal;
use serde::Serialize;

use super::book::{Book, BookDelta};
use super::event::{EventKind, Side};
use super::fields::Fields;

/// A public trade print.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub feed: String,
    pub pair: String,
    pub order_id: Option<String>,
    pub timestamp: f64,
    pub side: Side,
    pub amount: Decimal,
    pub price: Decimal,
    pub receipt_timestamp: f64,
    /// Market/limit etc. Only forwarded with `include_order_type`.
    pub order_type: Option<String>,
    /// Only forwarded with `include_sequence_no`.
    pub sequence_no: Option<u64>,
}

/// Top-of-book quote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ticker {
    pub feed: String,
    pub pair: String,
    pub bid: Decimal,
    pub ask: Decimal,
    pub timestamp: f64,
    pub receipt_timestamp: f64,
    pub sequence_no: Option<u64>,
}

/// Full L2/L3 book image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookSnapshot {
    pub feed: String,
    pub pair: String,
    pub book: Book,
    pub timestamp: f64,
    pub receipt_timestamp: f64,
    pub sequence_no: Option<u64>,
}

/// Incremental book changes. Zero sizes remove a level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookUpdate {
    pub feed: String,
    pub pair: String,
    pub delta: BookDelta,
    pub timestamp: f64,
    pub receipt_timestamp: f64,
    pub sequence_no: Option<u64>,
}

/// A forced liquidation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Liquidation {
    pub feed: String,
    pub pair: String,
    pub side: Side,
    pub leaves_qty: Decimal,
    pub price: Decimal,
    pub order_id: String,
    pub timestamp: f64,
    pub receipt_timestamp: f64,
}

/// Feed-defined payload for kinds without a fixed schema
/// (open interest, volume, funding, futures index, market info,
/// transactions).
#[derive(Debug, Clone, PartialEq)]
pub struct PassThrough {
    pub kind: EventKind,
    pub feed: String,
    pub timestamp: f64,
    pub receipt_timestamp: f64,
    /// Everything else the feed supplied, untouched.
    pub payload: Fields,
}
