//! Lightweight in-process metrics.
//!
//! Counters, gauges and histograms are stored as atomics keyed by sorted label
//! sets and rendered by the `/metrics` handler in Prometheus text format.

pub mod metrics;

pub use metrics::GatewayMetrics;
