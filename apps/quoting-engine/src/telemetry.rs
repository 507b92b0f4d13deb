//! Tracing Setup
//!
//! Installs the global `tracing` subscriber. `RUST_LOG` overrides the
//! configured level.
//!
//! # Usage
//!
//! ```rust,ignore
//! use quoting_engine::telemetry::init_tracing;
//!
//! init_tracing(&config.observability.logging);
//! ```

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use crate::config::LoggingConfig;

/// Initialize the global subscriber.
///
/// Calling it twice is harmless; the second call logs and returns.
pub fn init_tracing(config: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let span_events = if config.include_spans {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let result = if config.format == "pretty" {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_span_events(span_events)
            .pretty()
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_span_events(span_events)
            .json()
            .with_current_span(config.include_spans)
            .try_init()
    };

    match result {
        Ok(()) => tracing::info!(level = %config.level, format = %config.format, "tracing initialized"),
        Err(e) => tracing::debug!(error = %e, "tracing subscriber already installed"),
    }
}
