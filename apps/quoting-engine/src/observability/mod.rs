//! Observability module for metrics.
//!
//! Prometheus export of cache, processing and callback metrics. Logging is
//! set up separately in [`crate::telemetry`].

mod metrics;

pub use metrics::{
    MetricsConfig, MetricsError, init_metrics, record_cache_lookup, record_callback,
    record_message_processed,
};
