//! Metrics and monitoring for the pug-room matchmaking service
//!
//! Prometheus collection lives in `collector`; `server` exposes it over HTTP
//! together with health probes and the matchmaking snapshot.

pub mod collector;
pub mod server;

pub use collector::{
    GameMetrics, MetricsCollector, PerformanceMetrics, QueueMetrics, ServiceMetrics,
};
pub use server::{MonitoringConfig, MonitoringServer};
