//! Prometheus Metrics Registry - Feed Observability
//!
//! Registers and exposes Prometheus metrics on :9090 for Grafana
//! dashboards. Covers message throughput, handler latency, feed state
//! and failures per lifecycle stage.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder,
};
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

use crate::ports::FeedObserver;
use crate::usecases::FeedState;

/// Centralized Prometheus metrics for the feed handler.
///
/// All metrics follow the naming convention `feedhandler_*` and carry a
/// `feed` label.
pub struct MetricsRegistry {
    /// Prometheus registry.
    registry: Registry,
    /// Messages fully handled per feed.
    pub messages: IntCounterVec,
    /// Time spent in the feed's message handler (microseconds).
    pub handler_latency_us: HistogramVec,
    /// Current `FeedState` discriminant per feed.
    pub feed_state: IntGaugeVec,
    /// Feed task failures per lifecycle stage.
    pub failures: IntCounterVec,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let messages = IntCounterVec::new(
            Opts::new("feedhandler_messages_total", "Messages handled per feed"),
            &["feed"],
        )?;

        let handler_latency_us = HistogramVec::new(
            HistogramOpts::new(
                "feedhandler_handler_latency_us",
                "Message handler latency in microseconds",
            )
            .buckets(vec![
                10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0, 10000.0, 50000.0,
            ]),
            &["feed"],
        )?;

        let feed_state = IntGaugeVec::new(
            Opts::new(
                "feedhandler_feed_state",
                "Feed state (0=idle 1=connecting 2=subscribing 3=receiving 4=closed 5=failed)",
            ),
            &["feed"],
        )?;

        let failures = IntCounterVec::new(
            Opts::new("feedhandler_feed_failures_total", "Feed task failures"),
            &["feed", "stage"],
        )?;

        // Register all metrics
        registry.register(Box::new(messages.clone()))?;
        registry.register(Box::new(handler_latency_us.clone()))?;
        registry.register(Box::new(feed_state.clone()))?;
        registry.register(Box::new(failures.clone()))?;

        Ok(Self {
            registry,
            messages,
            handler_latency_us,
            feed_state,
            failures,
        })
    }

    /// Encode every registered metric in the text exposition format.
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Serve Prometheus metrics on the configured bind address.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn serve(
        self: Arc<Self>,
        bind_address: String,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        let metrics_self = Arc::clone(&self);

        let app = Router::new().route(
            "/metrics",
            get(move || {
                let metrics = Arc::clone(&metrics_self);
                async move {
                    match metrics.render() {
                        Ok(body) => (StatusCode::OK, body),
                        Err(e) => {
                            warn!(error = %e, "Failed to encode metrics");
                            (StatusCode::INTERNAL_SERVER_ERROR, String::new())
                        }
                    }
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind(&bind_address).await?;
        info!(address = %bind_address, "Prometheus metrics server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }
}

impl FeedObserver for MetricsRegistry {
    fn on_state(&self, feed: &str, state: FeedState) {
        self.feed_state
            .with_label_values(&[feed])
            .set(i64::from(state as u8));
    }

    fn on_message(&self, feed: &str, elapsed: Duration) {
        self.messages.with_label_values(&[feed]).inc();
        self.handler_latency_us
            .with_label_values(&[feed])
            .observe(elapsed.as_secs_f64() * 1_000_000.0);
    }

    fn on_failure(&self, feed: &str, stage: &'static str) {
        self.failures.with_label_values(&[feed, stage]).inc();
    }
}
