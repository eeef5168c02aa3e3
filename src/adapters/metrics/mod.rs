//! Metrics Adapters
//!
//! Prometheus counters and gauges for registry activity.

pub mod prometheus;

pub use prometheus::MetricsRegistry;
