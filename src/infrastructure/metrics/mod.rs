//! Prometheus Metrics Module
//!
//! Provides application-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - Active relay connection gauge
//! - Relayed event counts by action kind
//! - Delivery failure counts (pruned connections)
//! - Durable-store operation latency histograms

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Active relay connections gauge
pub static RELAY_CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new(
            "relay_connections_active",
            "Number of live relay connections",
        )
        .namespace("socialhive"),
    )
    .expect("Failed to create RELAY_CONNECTIONS_ACTIVE metric")
});

/// Relayed event counter by action kind (send, delete, online, offline)
pub static RELAY_EVENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("relay_events_total", "Total relayed events by action kind")
            .namespace("socialhive"),
        &["action"],
    )
    .expect("Failed to create RELAY_EVENTS_TOTAL metric")
});

/// Delivery failures (connection pruned from the live set)
pub static RELAY_DELIVERY_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new(
            "relay_delivery_failures_total",
            "Deliveries that failed and pruned a connection",
        )
        .namespace("socialhive"),
    )
    .expect("Failed to create RELAY_DELIVERY_FAILURES_TOTAL metric")
});

/// Durable-store operation latency histogram
pub static STORE_OP_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let buckets = vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];
    HistogramVec::new(
        HistogramOpts::new(
            "store_op_duration_seconds",
            "Durable-store operation latency in seconds",
        )
        .namespace("socialhive")
        .buckets(buckets),
        &["operation"],
    )
    .expect("Failed to create STORE_OP_DURATION_SECONDS metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(RELAY_CONNECTIONS_ACTIVE.clone()))
        .expect("Failed to register RELAY_CONNECTIONS_ACTIVE");
    registry
        .register(Box::new(RELAY_EVENTS_TOTAL.clone()))
        .expect("Failed to register RELAY_EVENTS_TOTAL");
    registry
        .register(Box::new(RELAY_DELIVERY_FAILURES_TOTAL.clone()))
        .expect("Failed to register RELAY_DELIVERY_FAILURES_TOTAL");
    registry
        .register(Box::new(STORE_OP_DURATION_SECONDS.clone()))
        .expect("Failed to register STORE_OP_DURATION_SECONDS");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .expect("Failed to encode metrics");
    String::from_utf8(buffer).expect("Metrics should be valid UTF-8")
}

/// Helper to update the live connection gauge
pub fn set_active_connections(count: usize) {
    RELAY_CONNECTIONS_ACTIVE.set(count as i64);
}

/// Helper to count one relayed event
pub fn record_event(action: &str) {
    RELAY_EVENTS_TOTAL.with_label_values(&[action]).inc();
}

/// Helper to count one pruned connection
pub fn record_delivery_failure() {
    RELAY_DELIVERY_FAILURES_TOTAL.inc();
}

/// Helper to record durable-store operation latency
pub fn record_store_op(operation: &str, duration_secs: f64) {
    STORE_OP_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(duration_secs);
}
