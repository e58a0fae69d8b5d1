//! Feed Handler - Entry Point
//!
//! Initializes configuration, logging, metrics and every configured
//! feed, then drives them until they all exit or SIGINT arrives.
//!
//! Wiring sequence:
//! 1. Load config (path from argv, default `config.toml`) + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Create the worker pool for synchronous callbacks
//! 4. Build per-kind logging callbacks
//! 5. Register one `JsonRelayFeed` per `[[feeds]]` entry
//! 6. Spawn metrics (:9090) and health (/live + /ready) servers
//! 7. Run the feed handler on this current-thread runtime
//! 8. Wait for completion or SIGINT → abort feeds → stop servers

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use feedhandler::adapters::feeds::JsonRelayFeed;
use feedhandler::adapters::metrics::{HealthServer, MetricsRegistry};
use feedhandler::adapters::transport::WebSocketTransport;
use feedhandler::config::{self, AppConfig};
use feedhandler::domain::{EventKind, PassThrough};
use feedhandler::ports::FeedObserver;
use feedhandler::usecases::callback::{
    BookDeltaCallback, BookSnapshotCallback, CallbackAdapter, Callbacks, LiquidationCallback,
    PassThroughCallback, TickerCallback, TradeCallback, WorkerPool,
};
use feedhandler::usecases::{FeedHandler, build_supervisor};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // ── 1. Load configuration ───────────────────────────────
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    let config =
        config::loader::load_config(&config_path).context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.handler.log_level)),
        )
        .json()
        .init();

    info!(
        name = %config.handler.name,
        version = env!("CARGO_PKG_VERSION"),
        feeds = config.feeds.len(),
        policy = ?config.handler.failure_policy,
        "Starting feed handler"
    );

    // ── 3. Worker pool for synchronous callbacks ────────────
    let pool = WorkerPool::current(config.handler.max_blocking_callbacks)
        .context("Failed to create worker pool")?;

    // ── 4. Per-kind callbacks ───────────────────────────────
    let callbacks = logging_callbacks(&pool);

    // ── 5. Feeds ────────────────────────────────────────────
    let metrics = Arc::new(MetricsRegistry::new().context("Failed to create metrics registry")?);
    let mut handler = FeedHandler::new(WebSocketTransport::new())
        .with_supervisor(build_supervisor(&config))
        .with_observer(Arc::clone(&metrics) as Arc<dyn FeedObserver>);

    for feed in &config.feeds {
        handler
            .add_feed(JsonRelayFeed::from_config(feed, callbacks.clone()))
            .context("Invalid feed configuration")?;
    }

    // ── 6. Metrics and health servers ───────────────────────
    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);
    let servers = spawn_servers(&config, metrics, &handler, &shutdown_tx);

    info!("All feeds registered - handler is running");

    // ── 7. Run until every feed exits or SIGINT ─────────────
    let result = tokio::select! {
        outcome = handler.run() => outcome,
        _ = signal::ctrl_c() => {
            info!("SIGINT received, aborting feeds");
            Ok(Default::default())
        }
    };

    // ── 8. Graceful shutdown ────────────────────────────────
    pool.close();
    let _ = shutdown_tx.send(());
    for server in servers {
        let _ = tokio::time::timeout(std::time::Duration::from_secs(5), server).await;
    }

    match result {
        Ok(summary) => {
            for failure in summary.failures() {
                warn!(feed = failure.feed(), stage = failure.stage(), error = %failure, "Feed ended with error");
            }
            info!(feeds = summary.len(), "Shutdown complete");
            Ok(())
        }
        Err(e) => {
            error!(feed = e.feed(), error = %e, "Handler stopped by supervisor");
            Err(e.into())
        }
    }
}

/// Spawn the metrics and health servers when enabled.
fn spawn_servers(
    config: &AppConfig,
    metrics: Arc<MetricsRegistry>,
    handler: &FeedHandler<WebSocketTransport>,
    shutdown_tx: &broadcast::Sender<()>,
) -> Vec<tokio::task::JoinHandle<()>> {
    if !config.metrics.enabled {
        return Vec::new();
    }

    let bind_address = config.metrics.bind_address.clone();
    let metrics_shutdown = shutdown_tx.subscribe();
    let metrics_handle = tokio::spawn(async move {
        if let Err(e) = metrics.serve(bind_address, metrics_shutdown).await {
            error!(error = %e, "Metrics server failed");
        }
    });

    let health = HealthServer::new(handler.status_board(), config.metrics.health_port);
    let health_shutdown = shutdown_tx.subscribe();
    let health_handle = tokio::spawn(async move {
        if let Err(e) = health.run(health_shutdown).await {
            error!(error = %e, "Health server failed");
        }
    });

    vec![metrics_handle, health_handle]
}

/// Callbacks that log every event as one JSON line. They run on the
/// worker pool like any other synchronous user callback.
fn logging_callbacks(pool: &WorkerPool) -> Callbacks {
    let mut callbacks = Callbacks::new()
        .with(
            TradeCallback::blocking(|e| log_event(EventKind::Trade, &e), pool.clone())
                .include_order_type(true)
                .include_sequence_no(true),
        )
        .with(
            TickerCallback::blocking(|e| log_event(EventKind::Ticker, &e), pool.clone())
                .include_sequence_no(true),
        )
        .with(
            BookSnapshotCallback::blocking(|e| log_event(EventKind::BookSnapshot, &e), pool.clone())
                .include_sequence_no(true),
        )
        .with(
            BookDeltaCallback::blocking(|e| log_event(EventKind::BookDelta, &e), pool.clone())
                .include_sequence_no(true),
        )
        .with(LiquidationCallback::blocking(
            |e| log_event(EventKind::Liquidation, &e),
            pool.clone(),
        ));

    for kind in EventKind::PASS_THROUGH {
        let adapter = CallbackAdapter::blocking(log_pass_through, pool.clone());
        if let Some(callback) = PassThroughCallback::new(kind, adapter) {
            callbacks.register(callback);
        }
    }
    callbacks
}

fn log_event<E: Serialize>(kind: EventKind, event: &E) -> Result<()> {
    let json = serde_json::to_string(event).context("Failed to encode event")?;
    info!(%kind, event = %json, "Event");
    Ok(())
}

fn log_pass_through(event: PassThrough) -> Result<()> {
    let fields: Vec<&str> = event.payload.iter().map(|(name, _)| name.as_str()).collect();
    info!(
        kind = %event.kind,
        feed = %event.feed,
        timestamp = event.timestamp,
        fields = ?fields,
        "Event"
    );
    Ok(())
}
