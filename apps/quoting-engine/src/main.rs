//! Quoting Engine Binary
//!
//! Reads message envelopes as newline-delimited JSON on stdin and processes
//! them on the engine runtime until stdin closes or the process is
//! interrupted.
//!
//! # Usage
//!
//! ```bash
//! QUOTING_CONFIG=config.yaml cargo run --bin quoting-engine < envelopes.ndjson
//! ```
//!
//! # Environment Variables
//!
//! - `QUOTING_CONFIG`: Path to the YAML config (default: config.yaml)
//! - `RUST_LOG`: Log filter, overrides `observability.logging.level`

use std::net::SocketAddr;

use anyhow::Context;
use quoting_engine::config::{Config, load_config};
use quoting_engine::infrastructure::{Container, EngineHandle, EngineRuntime};
use quoting_engine::observability::{MetricsConfig, init_metrics};
use quoting_engine::telemetry::init_tracing;
use quoting_engine::MessageEnvelope;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;

/// Default config file path.
const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    let config_path =
        std::env::var("QUOTING_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = load_config(Some(&config_path))
        .with_context(|| format!("loading configuration from {config_path}"))?;

    init_tracing(&config.observability.logging);
    tracing::info!(config = %config_path, hub = %config.hub.name, "Starting quoting engine");

    start_metrics(&config)?;

    let container = Container::from_config(&config).context("wiring engine")?;
    let runtime = EngineRuntime::start(container.dispatcher(), container.runtime_config());
    let handle = runtime.handle();

    tokio::select! {
        result = read_envelopes(handle) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "input stream failed");
            }
            tracing::info!("Input closed, draining");
        }
        _ = signal::ctrl_c() => {
            tracing::info!("Shutdown signal received, draining");
        }
    }

    let processed = runtime.stop().await;
    let repository = container.repository();
    tracing::info!(
        processed,
        quotes = repository.quote_count(),
        commits = repository.committed_transactions(),
        "Quoting engine stopped"
    );
    Ok(())
}

/// Load .env file from the working directory, if any.
fn load_dotenv() {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Ignoring unreadable .env file: {e}");
        }
    }
}

/// Start the Prometheus exporter when enabled.
fn start_metrics(config: &Config) -> anyhow::Result<()> {
    let settings = &config.observability.metrics;
    if !settings.enabled {
        return Ok(());
    }
    let addr: SocketAddr = settings
        .listen_addr
        .parse()
        .with_context(|| format!("invalid metrics address {}", settings.listen_addr))?;
    init_metrics(&MetricsConfig::with_addr(addr))?;
    Ok(())
}

/// Submit one envelope per non-empty stdin line.
async fn read_envelopes(handle: EngineHandle) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut line_number = 0_u64;

    while let Some(line) = lines.next_line().await? {
        line_number += 1;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<MessageEnvelope>(&line) {
            Ok(envelope) => handle.submit(envelope).await?,
            Err(e) => tracing::warn!(line = line_number, error = %e, "skipping unparsable envelope"),
        }
    }
    Ok(())
}
