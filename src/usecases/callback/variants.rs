//! Event Callback Variants - One Fixed Schema per Event Kind
//!
//! Each variant pulls its required named fields out of a `Fields` bag,
//! builds the typed record for its kind and hands it to the wrapped
//! `CallbackAdapter`. Optional fields (`order_type`, `sequence_no`) are
//! only read when the variant was built with the matching flag; otherwise
//! they are dropped even if the feed supplied them.

use async_trait::async_trait;

use super::adapter::CallbackAdapter;
use super::worker_pool::WorkerPool;
use crate::domain::{
    BookSnapshot, BookUpdate, EventKind, FieldReader, Fields, Liquidation, PassThrough, Ticker,
    Trade,
};
use crate::error::{DispatchError, InvalidEventError};

/// Uniform entry point feeds use to deliver one normalized event.
#[async_trait]
pub trait EventCallback: Send + Sync + 'static {
    /// Kind of event this callback accepts.
    fn kind(&self) -> EventKind;

    /// Validate `fields` against the kind's schema and deliver the record.
    async fn call(&self, fields: Fields) -> Result<(), DispatchError>;
}

macro_rules! adapter_constructors {
    ($record:ty) => {
        /// Callback that accepts and drops every event.
        pub const fn noop() -> Self {
            Self::new(CallbackAdapter::noop())
        }

        /// Run a synchronous handler on `pool`.
        pub fn blocking<F>(func: F, pool: WorkerPool) -> Self
        where
            F: Fn($record) -> anyhow::Result<()> + Send + Sync + 'static,
        {
            Self::new(CallbackAdapter::blocking(func, pool))
        }

        /// Await an asynchronous handler on the feed's task.
        pub fn asynchronous<F, Fut>(func: F) -> Self
        where
            F: Fn($record) -> Fut + Send + Sync + 'static,
            Fut: std::future::Future<Output = anyhow::Result<()>> + Send + 'static,
        {
            Self::new(CallbackAdapter::asynchronous(func))
        }

        pub const fn adapter(&self) -> &CallbackAdapter<$record> {
            &self.adapter
        }
    };
}

/// Forward the record built by `to_event` to the adapter.
macro_rules! impl_event_callback {
    ($variant:ty, $kind:expr) => {
        #[async_trait]
        impl EventCallback for $variant {
            fn kind(&self) -> EventKind {
                $kind
            }

            async fn call(&self, fields: Fields) -> Result<(), DispatchError> {
                let event = self.to_event(fields)?;
                self.adapter.call(event).await?;
                Ok(())
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Trade
// ---------------------------------------------------------------------------

/// Trade prints.
///
/// Required: `feed`, `pair`, `side`, `amount`, `price`, `timestamp`,
/// `receipt_timestamp`. `order_id` may be absent or null.
#[derive(Debug, Clone)]
pub struct TradeCallback {
    adapter: CallbackAdapter<Trade>,
    include_order_type: bool,
    include_sequence_no: bool,
}

impl TradeCallback {
    pub const fn new(adapter: CallbackAdapter<Trade>) -> Self {
        Self {
            adapter,
            include_order_type: false,
            include_sequence_no: false,
        }
    }

    adapter_constructors!(Trade);

    /// Forward the feed's `order_type` when present.
    #[must_use]
    pub const fn include_order_type(mut self, enabled: bool) -> Self {
        self.include_order_type = enabled;
        self
    }

    /// Forward the feed's `sequence_no` when present.
    #[must_use]
    pub const fn include_sequence_no(mut self, enabled: bool) -> Self {
        self.include_sequence_no = enabled;
        self
    }

    pub fn to_event(&self, fields: Fields) -> Result<Trade, InvalidEventError> {
        let mut r = FieldReader::new(EventKind::Trade, fields);
        Ok(Trade {
            feed: r.text("feed")?,
            pair: r.text("pair")?,
            order_id: r.opt_text("order_id")?,
            timestamp: r.timestamp("timestamp")?,
            side: r.side("side")?,
            amount: r.decimal("amount")?,
            price: r.decimal("price")?,
            receipt_timestamp: r.timestamp("receipt_timestamp")?,
            order_type: if self.include_order_type {
                r.opt_text("order_type")?
            } else {
                None
            },
            sequence_no: if self.include_sequence_no {
                r.opt_sequence("sequence_no")?
            } else {
                None
            },
        })
    }
}

impl_event_callback!(TradeCallback, EventKind::Trade);

// ---------------------------------------------------------------------------
// Ticker
// ---------------------------------------------------------------------------

/// Top-of-book quotes. `sequence_no` is required even when not forwarded.
#[derive(Debug, Clone)]
pub struct TickerCallback {
    adapter: CallbackAdapter<Ticker>,
    include_sequence_no: bool,
}

impl TickerCallback {
    pub const fn new(adapter: CallbackAdapter<Ticker>) -> Self {
        Self {
            adapter,
            include_sequence_no: false,
        }
    }

    adapter_constructors!(Ticker);

    #[must_use]
    pub const fn include_sequence_no(mut self, enabled: bool) -> Self {
        self.include_sequence_no = enabled;
        self
    }

    pub fn to_event(&self, fields: Fields) -> Result<Ticker, InvalidEventError> {
        let mut r = FieldReader::new(EventKind::Ticker, fields);
        let feed = r.text("feed")?;
        let pair = r.text("pair")?;
        let bid = r.decimal("bid")?;
        let ask = r.decimal("ask")?;
        let sequence_no = r.sequence("sequence_no")?;
        Ok(Ticker {
            feed,
            pair,
            bid,
            ask,
            timestamp: r.timestamp("timestamp")?,
            receipt_timestamp: r.timestamp("receipt_timestamp")?,
            sequence_no: self.include_sequence_no.then_some(sequence_no),
        })
    }
}

impl_event_callback!(TickerCallback, EventKind::Ticker);

// ---------------------------------------------------------------------------
// Book snapshot
// ---------------------------------------------------------------------------

/// Full book images.
#[derive(Debug, Clone)]
pub struct BookSnapshotCallback {
    adapter: CallbackAdapter<BookSnapshot>,
    include_sequence_no: bool,
}

impl BookSnapshotCallback {
    pub const fn new(adapter: CallbackAdapter<BookSnapshot>) -> Self {
        Self {
            adapter,
            include_sequence_no: false,
        }
    }

    adapter_constructors!(BookSnapshot);

    #[must_use]
    pub const fn include_sequence_no(mut self, enabled: bool) -> Self {
        self.include_sequence_no = enabled;
        self
    }

    pub fn to_event(&self, fields: Fields) -> Result<BookSnapshot, InvalidEventError> {
        let mut r = FieldReader::new(EventKind::BookSnapshot, fields);
        let feed = r.text("feed")?;
        let pair = r.text("pair")?;
        let book = r.book("book")?;
        let sequence_no = r.sequence("sequence_no")?;
        Ok(BookSnapshot {
            feed,
            pair,
            book,
            timestamp: r.timestamp("timestamp")?,
            receipt_timestamp: r.timestamp("receipt_timestamp")?,
            sequence_no: self.include_sequence_no.then_some(sequence_no),
        })
    }
}

impl_event_callback!(BookSnapshotCallback, EventKind::BookSnapshot);

// ---------------------------------------------------------------------------
// Book delta
// ---------------------------------------------------------------------------

/// Incremental book updates. A zero size in `delta` removes the level.
#[derive(Debug, Clone)]
pub struct BookDeltaCallback {
    adapter: CallbackAdapter<BookUpdate>,
    include_sequence_no: bool,
}

impl BookDeltaCallback {
    pub const fn new(adapter: CallbackAdapter<BookUpdate>) -> Self {
        Self {
            adapter,
            include_sequence_no: false,
        }
    }

    adapter_constructors!(BookUpdate);

    #[must_use]
    pub const fn include_sequence_no(mut self, enabled: bool) -> Self {
        self.include_sequence_no = enabled;
        self
    }

    pub fn to_event(&self, fields: Fields) -> Result<BookUpdate, InvalidEventError> {
        let mut r = FieldReader::new(EventKind::BookDelta, fields);
        let feed = r.text("feed")?;
        let pair = r.text("pair")?;
        let delta = r.delta("delta")?;
        let sequence_no = r.sequence("sequence_no")?;
        Ok(BookUpdate {
            feed,
            pair,
            delta,
            timestamp: r.timestamp("timestamp")?,
            receipt_timestamp: r.timestamp("receipt_timestamp")?,
            sequence_no: self.include_sequence_no.then_some(sequence_no),
        })
    }
}

impl_event_callback!(BookDeltaCallback, EventKind::BookDelta);

// ---------------------------------------------------------------------------
// Liquidation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LiquidationCallback {
    adapter: CallbackAdapter<Liquidation>,
}

impl LiquidationCallback {
    pub const fn new(adapter: CallbackAdapter<Liquidation>) -> Self {
        Self { adapter }
    }

    adapter_constructors!(Liquidation);

    pub fn to_event(&self, fields: Fields) -> Result<Liquidation, InvalidEventError> {
        let mut r = FieldReader::new(EventKind::Liquidation, fields);
        Ok(Liquidation {
            feed: r.text("feed")?,
            pair: r.text("pair")?,
            side: r.side("side")?,
            leaves_qty: r.decimal("leaves_qty")?,
            price: r.decimal("price")?,
            order_id: r.text("order_id")?,
            timestamp: r.timestamp("timestamp")?,
            receipt_timestamp: r.timestamp("receipt_timestamp")?,
        })
    }
}

impl_event_callback!(LiquidationCallback, EventKind::Liquidation);

// ---------------------------------------------------------------------------
// Pass-through kinds
// ---------------------------------------------------------------------------

/// Open interest, volume, funding, futures index, market info and
/// transactions. Only the envelope is validated; every other field is
/// forwarded untouched in `PassThrough::payload`.
#[derive(Debug, Clone)]
pub struct PassThroughCallback {
    kind: EventKind,
    adapter: CallbackAdapter<PassThrough>,
}

impl PassThroughCallback {
    /// Returns `None` when `kind` has a fixed schema.
    pub fn new(kind: EventKind, adapter: CallbackAdapter<PassThrough>) -> Option<Self> {
        kind.is_pass_through().then_some(Self { kind, adapter })
    }

    pub fn open_interest(adapter: CallbackAdapter<PassThrough>) -> Self {
        Self::unchecked(EventKind::OpenInterest, adapter)
    }

    pub fn volume(adapter: CallbackAdapter<PassThrough>) -> Self {
        Self::unchecked(EventKind::Volume, adapter)
    }

    pub fn funding(adapter: CallbackAdapter<PassThrough>) -> Self {
        Self::unchecked(EventKind::Funding, adapter)
    }

    pub fn futures_index(adapter: CallbackAdapter<PassThrough>) -> Self {
        Self::unchecked(EventKind::FuturesIndex, adapter)
    }

    pub fn market_info(adapter: CallbackAdapter<PassThrough>) -> Self {
        Self::unchecked(EventKind::MarketInfo, adapter)
    }

    pub fn transactions(adapter: CallbackAdapter<PassThrough>) -> Self {
        Self::unchecked(EventKind::Transactions, adapter)
    }

    const fn unchecked(kind: EventKind, adapter: CallbackAdapter<PassThrough>) -> Self {
        Self { kind, adapter }
    }

    pub const fn adapter(&self) -> &CallbackAdapter<PassThrough> {
        &self.adapter
    }

    pub fn to_event(&self, fields: Fields) -> Result<PassThrough, InvalidEventError> {
        let mut r = FieldReader::new(self.kind, fields);
        let feed = r.text("feed")?;
        let timestamp = r.timestamp("timestamp")?;
        let receipt_timestamp = r.timestamp("receipt_timestamp")?;
        Ok(PassThrough {
            kind: self.kind,
            feed,
            timestamp,
            receipt_timestamp,
            payload: r.into_remaining(),
        })
    }
}

#[async_trait]
impl EventCallback for PassThroughCallback {
    fn kind(&self) -> EventKind {
        self.kind
    }

    async fn call(&self, fields: Fields) -> Result<(), DispatchError> {
        let event = self.to_event(fields)?;
        self.adapter.call(event).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::*;
    use crate::domain::{BookSide, FieldValue, LevelAction, Side};
    use crate::error::CallbackError;

    fn trade_fields() -> Fields {
        Fields::new()
            .with("feed", "COINBASE")
            .with("pair", "BTC-USD")
            .with("order_id", Option::<String>::None)
            .with("timestamp", 1_700_000_000.25)
            .with("side", "buy")
            .with("amount", "0.5")
            .with("price", dec!(42000.1))
            .with("receipt_timestamp", 1_700_000_000.5)
    }

    fn recorder<T: Clone + Send + 'static>() -> (Arc<Mutex<Vec<T>>>, CallbackAdapter<T>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let adapter = CallbackAdapter::asynchronous(move |event: T| {
            sink.lock().unwrap().push(event);
            async { Ok(()) }
        });
        (seen, adapter)
    }

    #[test]
    fn test_trade_required_fields() {
        let trade = TradeCallback::noop().to_event(trade_fields()).unwrap();
        assert_eq!(trade.feed, "COINBASE");
        assert_eq!(trade.side, Side::Buy);
        assert_eq!(trade.amount, dec!(0.5));
        assert_eq!(trade.price, dec!(42000.1));
        assert_eq!(trade.order_id, None);
        assert_eq!(trade.order_type, None);
        assert_eq!(trade.sequence_no, None);
    }

    #[test]
    fn test_trade_missing_field_is_error() {
        let mut fields = trade_fields();
        fields.remove("price");
        let err = TradeCallback::noop().to_event(fields).unwrap_err();
        assert!(matches!(
            err,
            InvalidEventError::MissingField { kind: EventKind::Trade, field: "price" }
        ));
    }

    #[test]
    fn test_trade_order_type_flag() {
        let fields = trade_fields().with("order_type", "limit").with("sequence_no", 17u64);

        let plain = TradeCallback::noop().to_event(fields.clone()).unwrap();
        assert_eq!(plain.order_type, None);
        assert_eq!(plain.sequence_no, None);

        let full = TradeCallback::noop()
            .include_order_type(true)
            .include_sequence_no(true)
            .to_event(fields)
            .unwrap();
        assert_eq!(full.order_type.as_deref(), Some("limit"));
        assert_eq!(full.sequence_no, Some(17));
    }

    #[test]
    fn test_disabled_flag_ignores_garbage_value() {
        let fields = trade_fields().with("order_type", true);
        assert!(TradeCallback::noop().to_event(fields.clone()).is_ok());
        assert!(
            TradeCallback::noop()
                .include_order_type(true)
                .to_event(fields)
                .is_err()
        );
    }

    #[test]
    fn test_ticker_sequence_required_but_hidden() {
        let fields = Fields::new()
            .with("feed", "KRAKEN")
            .with("pair", "ETH-USD")
            .with("bid", "3000.5")
            .with("ask", "3001")
            .with("timestamp", 1.0)
            .with("receipt_timestamp", 2.0);

        let err = TickerCallback::noop().to_event(fields.clone()).unwrap_err();
        assert!(matches!(err, InvalidEventError::MissingField { field: "sequence_no", .. }));

        let fields = fields.with("sequence_no", 9u64);
        let hidden = TickerCallback::noop().to_event(fields.clone()).unwrap();
        assert_eq!(hidden.sequence_no, None);
        let shown = TickerCallback::noop()
            .include_sequence_no(true)
            .to_event(fields)
            .unwrap();
        assert_eq!(shown.sequence_no, Some(9));
        assert_eq!(shown.ask, dec!(3001));
    }

    #[test]
    fn test_book_delta_zero_size_removes_level() {
        let fields = Fields::new()
            .with("feed", "BINANCE")
            .with("pair", "BTC-USDT")
            .with(
                "delta",
                FieldValue::from(json!({ "bid": [[100.0, 0]], "ask": [[101.0, 5]] })),
            )
            .with("sequence_no", 3u64)
            .with("timestamp", 1.0)
            .with("receipt_timestamp", 1.5);

        let update = BookDeltaCallback::noop().to_event(fields).unwrap();
        let bid = update.delta.side(BookSide::Bid)[0];
        let ask = update.delta.side(BookSide::Ask)[0];
        assert_eq!(bid.price, dec!(100));
        assert_eq!(bid.action(), LevelAction::Remove);
        assert_eq!(ask.price, dec!(101));
        assert_eq!(ask.action(), LevelAction::Upsert(dec!(5)));
    }

    #[test]
    fn test_liquidation_order_id_required() {
        let fields = Fields::new()
            .with("feed", "BITMEX")
            .with("pair", "XBTUSD")
            .with("side", "sell")
            .with("leaves_qty", 10)
            .with("price", "65000")
            .with("timestamp", 1.0)
            .with("receipt_timestamp", 1.0);
        let err = LiquidationCallback::noop().to_event(fields.clone()).unwrap_err();
        assert!(matches!(err, InvalidEventError::MissingField { field: "order_id", .. }));

        let liq = LiquidationCallback::noop()
            .to_event(fields.with("order_id", "abc"))
            .unwrap();
        assert_eq!(liq.side, Side::Sell);
        assert_eq!(liq.leaves_qty, dec!(10));
    }

    #[test]
    fn test_null_required_field_is_invalid() {
        let fields = trade_fields().with("pair", FieldValue::Null);
        let err = TradeCallback::noop().to_event(fields).unwrap_err();
        assert!(matches!(err, InvalidEventError::InvalidField { field: "pair", .. }));
    }

    #[test]
    fn test_pass_through_keeps_payload() {
        let cb = PassThroughCallback::funding(CallbackAdapter::noop());
        let fields = Fields::new()
            .with("feed", "DERIBIT")
            .with("timestamp", 5.0)
            .with("receipt_timestamp", 6.0)
            .with("pair", "BTC-PERPETUAL")
            .with("rate", "0.0001");
        let event = cb.to_event(fields).unwrap();
        assert_eq!(event.kind, EventKind::Funding);
        assert_eq!(event.payload.len(), 2);
        assert!(event.payload.contains("rate"));
        assert!(!event.payload.contains("feed"));
    }

    #[test]
    fn test_pass_through_rejects_fixed_kinds() {
        assert!(PassThroughCallback::new(EventKind::Trade, CallbackAdapter::noop()).is_none());
        assert!(PassThroughCallback::new(EventKind::Volume, CallbackAdapter::noop()).is_some());
    }

    #[tokio::test]
    async fn test_call_delivers_record() {
        let (seen, adapter) = recorder::<Trade>();
        let cb = TradeCallback::new(adapter);
        assert_eq!(cb.kind(), EventKind::Trade);

        cb.call(trade_fields()).await.unwrap();
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].pair, "BTC-USD");
    }

    #[tokio::test]
    async fn test_invalid_event_skips_callback() {
        let (seen, adapter) = recorder::<Trade>();
        let cb = TradeCallback::new(adapter);
        let err = cb.call(Fields::new()).await.unwrap_err();
        assert!(matches!(err, DispatchError::InvalidEvent(_)));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_callback_failure_propagates() {
        let cb = TradeCallback::asynchronous(|_| async { Err::<(), _>(anyhow::anyhow!("downstream full")) });
        let err = cb.call(trade_fields()).await.unwrap_err();
        assert!(matches!(err, DispatchError::Callback(CallbackError::Failed(_))));
    }
}
