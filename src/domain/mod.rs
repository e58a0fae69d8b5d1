//! Domain layer - Normalized market-data vocabulary.
//!
//! Event kinds, sides, book payloads, the named-field bag feeds hand to
//! callbacks, and the typed records callbacks receive. No I/O here.

pub mod book;
pub mod event;
pub mod events;
pub mod fields;

// Re-export core types for convenience
pub use book::{Book, BookDelta, LevelAction, PriceChange};
pub use event::{BookSide, EventKind, Side, now_timestamp};
pub use events::{BookSnapshot, BookUpdate, Liquidation, PassThrough, Ticker, Trade};
pub use fields::{FieldReader, FieldValue, Fields};
