//! Prometheus metrics and structured logging for gridctl.
//!
//! - Lifecycle request, in-flight and reconciliation metrics
//! - Backend call latency
//! - Structured logging with tracing (JSON in production)

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{init_logging, init_logging_with};
pub use metrics::Metrics;
