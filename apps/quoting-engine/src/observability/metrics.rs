//! Prometheus metrics for the quoting engine.
//!
//! Covers the enum cache, message processing outcomes and latency, and
//! outbound callbacks. Recording goes through the `metrics` facade, so every
//! call is a no-op until an exporter is installed and never fails.
//!
//! # Example
//!
//! ```ignore
//! use quoting_engine::observability::{init_metrics, MetricsConfig};
//!
//! init_metrics(&MetricsConfig::default())?;
//! record_message_processed("quote", "post", "forwarded", 0.012);
//! ```

use std::net::{Ipv4Addr, SocketAddr};

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Configuration for the metrics exporter.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Address to bind the metrics HTTP listener.
    pub listen_addr: SocketAddr,
    /// Histogram buckets for processing latency (in seconds).
    pub latency_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 9464)),
            // 1ms to 5s
            latency_buckets: vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0],
        }
    }
}

impl MetricsConfig {
    /// Create a metrics configuration with a custom address.
    #[must_use]
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            listen_addr: addr,
            ..Default::default()
        }
    }
}

/// Initialize the Prometheus metrics exporter.
///
/// This starts an HTTP server that exposes metrics at `/metrics`.
///
/// # Errors
///
/// Returns an error if the exporter fails to start (e.g., port already in use).
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(config.listen_addr)
        .set_buckets(&config.latency_buckets)
        .map_err(|e| MetricsError::Configuration(e.to_string()))?
        .install()
        .map_err(|e| MetricsError::Installation(e.to_string()))?;

    tracing::info!(
        addr = %config.listen_addr,
        "Prometheus metrics exporter started"
    );

    Ok(())
}

/// Error type for metrics operations.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Failed to configure metrics exporter.
    #[error("metrics configuration error: {0}")]
    Configuration(String),
    /// Failed to install metrics exporter.
    #[error("metrics installation error: {0}")]
    Installation(String),
}

// ============================================================================
// Enum Cache Metrics
// ============================================================================

/// Record an enum cache lookup.
///
/// # Arguments
///
/// * `lookup` - Lookup name (e.g., "participant", "partyType")
/// * `hit` - Whether a live entry was found
pub fn record_cache_lookup(lookup: &str, hit: bool) {
    counter!(
        "quoting_enum_cache_lookups_total",
        "lookup" => lookup.to_string(),
        "result" => if hit { "hit" } else { "miss" }
    )
    .increment(1);
}

// ============================================================================
// Message Processing Metrics
// ============================================================================

/// Record one processed inbound message.
///
/// # Arguments
///
/// * `resource` - Resource family (e.g., "quote", "fx-quote")
/// * `action` - Action (e.g., "post", "put", "error")
/// * `outcome` - Outcome (e.g., "forwarded", "held", "rejected")
/// * `duration_seconds` - Processing time in seconds
pub fn record_message_processed(
    resource: &str,
    action: &str,
    outcome: &str,
    duration_seconds: f64,
) {
    counter!(
        "quoting_messages_processed_total",
        "resource" => resource.to_string(),
        "action" => action.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(
        "quoting_message_duration_seconds",
        "resource" => resource.to_string(),
        "action" => action.to_string()
    )
    .record(duration_seconds);
}

// ============================================================================
// Callback Metrics
// ============================================================================

/// Record an outbound callback attempt.
///
/// # Arguments
///
/// * `resource` - Resource family
/// * `kind` - "forward" or "error"
/// * `status` - "delivered" or a failure label (e.g., "timeout")
pub fn record_callback(resource: &str, kind: &str, status: &str) {
    counter!(
        "quoting_callbacks_total",
        "resource" => resource.to_string(),
        "kind" => kind.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}
