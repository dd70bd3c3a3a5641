//! Prometheus metrics for gridctl.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A registration failure means a
//! duplicate metric name, which is a programming error caught on first use.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_gauge, CounterVec, Encoder,
    HistogramVec, IntGauge, TextEncoder,
};

use crate::error::{TelemetryError, TelemetryResult};

/// Lifecycle requests by operation (start/stop/save) and outcome.
pub static LIFECYCLE_REQUESTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "gridctl_lifecycle_requests_total",
        "Total lifecycle requests by operation and outcome",
        &["operation", "outcome"]
    )
    .unwrap()
});

/// Operations currently in flight.
pub static OPERATIONS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "gridctl_operations_in_flight",
        "Lifecycle operations currently in flight"
    )
    .unwrap()
});

/// Reconciliation passes by outcome (ok/failed).
pub static RECONCILE_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "gridctl_reconcile_total",
        "Total status reconciliation passes",
        &["outcome"]
    )
    .unwrap()
});

/// Symbols running on at least one exchange.
pub static SYMBOLS_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "gridctl_symbols_running",
        "Symbols reported running on at least one exchange"
    )
    .unwrap()
});

/// Backend call latency in milliseconds.
pub static BACKEND_LATENCY_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "gridctl_backend_latency_ms",
        "Backend call latency in milliseconds",
        &["call"],
        vec![5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 10000.0]
    )
    .unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record a settled lifecycle request.
    pub fn lifecycle_request(operation: &str, outcome: &str) {
        LIFECYCLE_REQUESTS_TOTAL
            .with_label_values(&[operation, outcome])
            .inc();
    }

    pub fn operations_in_flight(count: usize) {
        OPERATIONS_IN_FLIGHT.set(count as i64);
    }

    /// Record a reconciliation pass.
    pub fn reconcile(outcome: &str) {
        RECONCILE_TOTAL.with_label_values(&[outcome]).inc();
    }

    pub fn symbols_running(count: usize) {
        SYMBOLS_RUNNING.set(count as i64);
    }

    /// Record backend call latency.
    pub fn backend_latency(call: &str, latency_ms: f64) {
        BACKEND_LATENCY_MS
            .with_label_values(&[call])
            .observe(latency_ms);
    }

    /// Render every registered metric in the Prometheus text format.
    pub fn encode() -> TelemetryResult<String> {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&prometheus::gather(), &mut buf)
            .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
        String::from_utf8(buf).map_err(|e| TelemetryError::Metrics(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_includes_recorded_metrics() {
        Metrics::lifecycle_request("start", "ok");
        Metrics::operations_in_flight(2);
        Metrics::reconcile("ok");
        Metrics::symbols_running(1);
        Metrics::backend_latency("fetch_status", 12.0);

        let text = Metrics::encode().unwrap();
        assert!(text.contains("gridctl_lifecycle_requests_total"));
        assert!(text.contains("gridctl_operations_in_flight"));
        assert!(text.contains("gridctl_reconcile_total"));
        assert!(text.contains("gridctl_backend_latency_ms"));
    }
}
