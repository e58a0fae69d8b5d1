//! Order Book Payloads - Snapshots and Deltas
//!
//! Value types carried by book events. Maintaining a book from these
//! payloads is the consumer's job; this module only describes them.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::event::BookSide;

/// Full price-level mapping for both sides of a book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Price → aggregate size, bid side.
    pub bids: BTreeMap<Decimal, Decimal>,
    /// Price → aggregate size, ask side.
    pub asks: BTreeMap<Decimal, Decimal>,
}

impl Book {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn side(&self, side: BookSide) -> &BTreeMap<Decimal, Decimal> {
        match side {
            BookSide::Bid => &self.bids,
            BookSide::Ask => &self.asks,
        }
    }

    pub fn side_mut(&mut self, side: BookSide) -> &mut BTreeMap<Decimal, Decimal> {
        match side {
            BookSide::Bid => &mut self.bids,
            BookSide::Ask => &mut self.asks,
        }
    }

    /// Highest bid level.
    pub fn best_bid(&self) -> Option<(Decimal, Decimal)> {
        self.bids.iter().next_back().map(|(p, s)| (*p, *s))
    }

    /// Lowest ask level.
    pub fn best_ask(&self) -> Option<(Decimal, Decimal)> {
        self.asks.iter().next().map(|(p, s)| (*p, *s))
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}

/// What a single price change asks the consumer to do with a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelAction {
    /// Size zero: delete the price level.
    Remove,
    /// Insert or replace the level with this size.
    Upsert(Decimal),
}

/// One (price, size) change within a delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceChange {
    pub price: Decimal,
    pub size: Decimal,
}

impl PriceChange {
    pub const fn new(price: Decimal, size: Decimal) -> Self {
        Self { price, size }
    }

    pub fn action(&self) -> LevelAction {
        if self.size.is_zero() {
            LevelAction::Remove
        } else {
            LevelAction::Upsert(self.size)
        }
    }
}

/// Ordered per-side level changes since the previous book event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDelta {
    pub bids: Vec<PriceChange>,
    pub asks: Vec<PriceChange>,
}

impl BookDelta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a change, preserving arrival order within the side.
    pub fn push(&mut self, side: BookSide, price: Decimal, size: Decimal) {
        let change = PriceChange::new(price, size);
        match side {
            BookSide::Bid => self.bids.push(change),
            BookSide::Ask => self.asks.push(change),
        }
    }

    #[must_use]
    pub fn with(mut self, side: BookSide, price: Decimal, size: Decimal) -> Self {
        self.push(side, price, size);
        self
    }

    pub fn side(&self, side: BookSide) -> &[PriceChange] {
        match side {
            BookSide::Bid => &self.bids,
            BookSide::Ask => &self.asks,
        }
    }

    pub fn len(&self) -> usize {
        self.bids.len() + self.asks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}
