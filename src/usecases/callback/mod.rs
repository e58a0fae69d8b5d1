//! Callback dispatch: adapters, per-kind variants and the worker pool
//! that keeps synchronous handlers off the scheduler.

pub mod adapter;
pub mod registry;
pub mod variants;
pub mod worker_pool;

pub use adapter::CallbackAdapter;
pub use registry::Callbacks;
pub use variants::{
    BookDeltaCallback, BookSnapshotCallback, EventCallback, LiquidationCallback,
    PassThroughCallback, TickerCallback, TradeCallback,
};
pub use worker_pool::WorkerPool;
