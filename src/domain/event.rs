//! Event kinds and trade/book sides.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Semantic category of a normalized feed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Trade,
    Ticker,
    BookSnapshot,
    BookDelta,
    Liquidation,
    OpenInterest,
    Volume,
    Funding,
    FuturesIndex,
    MarketInfo,
    Transactions,
}

impl EventKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 11] = [
        Self::Trade,
        Self::Ticker,
        Self::BookSnapshot,
        Self::BookDelta,
        Self::Liquidation,
        Self::OpenInterest,
        Self::Volume,
        Self::Funding,
        Self::FuturesIndex,
        Self::MarketInfo,
        Self::Transactions,
    ];

    /// Kinds whose payload is feed-defined and forwarded without a schema.
    pub const PASS_THROUGH: [Self; 6] = [
        Self::OpenInterest,
        Self::Volume,
        Self::Funding,
        Self::FuturesIndex,
        Self::MarketInfo,
        Self::Transactions,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trade => "trade",
            Self::Ticker => "ticker",
            Self::BookSnapshot => "book_snapshot",
            Self::BookDelta => "book_delta",
            Self::Liquidation => "liquidation",
            Self::OpenInterest => "open_interest",
            Self::Volume => "volume",
            Self::Funding => "funding",
            Self::FuturesIndex => "futures_index",
            Self::MarketInfo => "market_info",
            Self::Transactions => "transactions",
        }
    }

    pub fn is_pass_through(self) -> bool {
        Self::PASS_THROUGH.contains(&self)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown event kind: {s}"))
    }
}

/// Aggressor side of a trade or liquidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => f.write_str("buy"),
            Self::Sell => f.write_str("sell"),
        }
    }
}

impl FromStr for Side {
    type Err = String;

    /// Venues disagree on naming; `bid`/`ask` are accepted as buy/sell.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buy" | "bid" | "b" => Ok(Self::Buy),
            "sell" | "ask" | "s" => Ok(Self::Sell),
            other => Err(format!("unknown side: {other}")),
        }
    }
}

/// One side of an order book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookSide {
    Bid,
    Ask,
}

impl fmt::Display for BookSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bid => f.write_str("bid"),
            Self::Ask => f.write_str("ask"),
        }
    }
}

impl FromStr for BookSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bid" | "bids" | "buy" => Ok(Self::Bid),
            "ask" | "asks" | "sell" => Ok(Self::Ask),
            other => Err(format!("unknown book side: {other}")),
        }
    }
}

/// Current wall-clock time as fractional seconds since the Unix epoch.
pub fn now_timestamp() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
