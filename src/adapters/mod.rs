//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (WebSockets, Prometheus, HTTP). Each sub-module
//! groups adapters by infrastructure concern.
//!
//! Adapter categories:
//! - `transport`: WebSocket connections via tokio-tungstenite
//! - `feeds`: venue message parsing into event callbacks
//! - `metrics`: Prometheus metrics export and health checks

pub mod feeds;
pub mod metrics;
pub mod transport;
