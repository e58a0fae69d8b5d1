//! Callback Dispatch Tests - Variants Through the Public API
//!
//! Exercises each event callback variant the way a feed parser would:
//! build a `Fields` bag, dispatch through `Callbacks`, observe what the
//! user function receives.

use std::sync::{Arc, Mutex};
use std::thread;

use rust_decimal_macros::dec;
use tokio_test::{assert_err, assert_ok};

use feedhandler::domain::{
    Book, BookDelta, BookSide, BookSnapshot, BookUpdate, EventKind, FieldValue, Fields,
    LevelAction, PassThrough, Side, Trade,
};
use feedhandler::error::{CallbackError, DispatchError, InvalidEventError};
use feedhandler::usecases::callback::{
    BookDeltaCallback, BookSnapshotCallback, CallbackAdapter, Callbacks, EventCallback,
    PassThroughCallback, TradeCallback, WorkerPool,
};

fn envelope(feed: &str) -> Fields {
    Fields::new()
        .with("feed", feed)
        .with("timestamp", 1_700_000_000.0)
        .with("receipt_timestamp", 1_700_000_000.1)
}

fn trade_fields() -> Fields {
    envelope("COINBASE")
        .with("pair", "BTC-USD")
        .with("side", Side::Buy)
        .with("amount", dec!(0.25))
        .with("price", dec!(64000))
        .with("order_id", "T-1")
        .with("order_type", "market")
}

fn collector<T: Send + 'static>() -> (Arc<Mutex<Vec<T>>>, CallbackAdapter<T>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let adapter = CallbackAdapter::asynchronous(move |event: T| {
        sink.lock().unwrap().push(event);
        async { Ok(()) }
    });
    (seen, adapter)
}

#[tokio::test]
async fn test_sync_trade_callback_runs_on_worker_with_order_type() {
    let seen: Arc<Mutex<Vec<(Trade, thread::ThreadId)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let pool = WorkerPool::current(4).unwrap();

    let callback = TradeCallback::blocking(
        move |trade| {
            sink.lock().unwrap().push((trade, thread::current().id()));
            Ok(())
        },
        pool,
    )
    .include_order_type(true);

    assert_ok!(callback.call(trade_fields()).await);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (trade, worker) = &seen[0];
    assert_eq!(trade.order_type.as_deref(), Some("market"));
    assert_eq!(trade.order_id.as_deref(), Some("T-1"));
    assert_eq!(trade.sequence_no, None);
    assert_ne!(*worker, thread::current().id());
}

#[tokio::test]
async fn test_sync_callback_error_reaches_caller() {
    let callback = TradeCallback::blocking(
        |_| Err(anyhow::anyhow!("sink unavailable")),
        WorkerPool::current(1).unwrap(),
    );
    let err = assert_err!(callback.call(trade_fields()).await);
    assert!(matches!(err, DispatchError::Callback(CallbackError::Failed(_))));
}

#[tokio::test]
async fn test_closed_pool_rejects_sync_callbacks() {
    let pool = WorkerPool::current(1).unwrap();
    let callback = TradeCallback::blocking(|_| Ok(()), pool.clone());
    pool.close();
    let err = assert_err!(callback.call(trade_fields()).await);
    assert!(matches!(err, DispatchError::Callback(CallbackError::PoolClosed)));
}

#[tokio::test]
async fn test_book_snapshot_with_typed_book() {
    let mut book = Book::new();
    book.side_mut(BookSide::Bid).insert(dec!(99.5), dec!(3));
    book.side_mut(BookSide::Ask).insert(dec!(100.5), dec!(1));

    let (seen, adapter) = collector::<BookSnapshot>();
    let callback = BookSnapshotCallback::new(adapter).include_sequence_no(true);
    let fields = envelope("KRAKEN")
        .with("pair", "ETH-USD")
        .with("book", book.clone())
        .with("sequence_no", 42u64);

    assert_ok!(callback.call(fields).await);
    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].book, book);
    assert_eq!(seen[0].book.best_bid(), Some((dec!(99.5), dec!(3))));
    assert_eq!(seen[0].sequence_no, Some(42));
}

#[tokio::test]
async fn test_book_delta_removal_and_upsert() {
    let (seen, adapter) = collector::<BookUpdate>();
    let callback = BookDeltaCallback::new(adapter);
    let delta = BookDelta::new()
        .with(BookSide::Bid, dec!(100.0), dec!(0))
        .with(BookSide::Ask, dec!(101.0), dec!(5));
    let fields = envelope("BINANCE")
        .with("pair", "BTC-USDT")
        .with("delta", delta)
        .with("sequence_no", 1u64);

    assert_ok!(callback.call(fields).await);
    let seen = seen.lock().unwrap();
    let update = &seen[0];
    assert_eq!(update.delta.bids[0].price, dec!(100.0));
    assert_eq!(update.delta.bids[0].action(), LevelAction::Remove);
    assert_eq!(update.delta.asks[0].price, dec!(101.0));
    assert_eq!(update.delta.asks[0].action(), LevelAction::Upsert(dec!(5)));
    assert_eq!(update.sequence_no, None);
}

#[tokio::test]
async fn test_book_delta_requires_sequence_number() {
    let callback = BookDeltaCallback::noop();
    let fields = envelope("BINANCE")
        .with("pair", "BTC-USDT")
        .with("delta", BookDelta::new());
    let err = assert_err!(callback.call(fields).await);
    assert!(matches!(
        err,
        DispatchError::InvalidEvent(InvalidEventError::MissingField {
            kind: EventKind::BookDelta,
            field: "sequence_no"
        })
    ));
}

#[tokio::test]
async fn test_pass_through_routes_all_feed_defined_kinds() {
    let (seen, adapter) = collector::<PassThrough>();
    let mut callbacks = Callbacks::new();
    for kind in EventKind::PASS_THROUGH {
        callbacks.register(PassThroughCallback::new(kind, adapter.clone()).unwrap());
    }
    assert_eq!(callbacks.len(), 6);

    for kind in EventKind::PASS_THROUGH {
        let fields = envelope("DERIBIT").with("value", FieldValue::from(serde_json::json!([1, 2])));
        assert!(assert_ok!(callbacks.dispatch(kind, fields).await));
    }

    let seen = seen.lock().unwrap();
    let kinds: Vec<_> = seen.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, EventKind::PASS_THROUGH.to_vec());
    assert!(seen.iter().all(|e| e.payload.len() == 1 && e.feed == "DERIBIT"));
}

#[tokio::test]
async fn test_pass_through_requires_envelope() {
    let callback = PassThroughCallback::open_interest(CallbackAdapter::noop());
    let fields = Fields::new().with("feed", "BYBIT").with("open_interest", 10);
    let err = assert_err!(callback.call(fields).await);
    assert!(matches!(
        err,
        DispatchError::InvalidEvent(InvalidEventError::MissingField { field: "timestamp", .. })
    ));
}
