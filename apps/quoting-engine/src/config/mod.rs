//! Configuration module for the quoting engine.
//!
//! YAML configuration with environment variable interpolation and a
//! validation pass.
//!
//! # Usage
//!
//! ```rust,ignore
//! use quoting_engine::config::load_config;
//!
//! // Load from default path (config.yaml)
//! let config = load_config(None)?;
//!
//! println!("hub: {}", config.hub.name);
//! ```

mod engine;
mod hub;
mod observability;
mod participants;

use std::collections::HashSet;
use std::net::SocketAddr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use engine::{CacheConfig, EngineConfig, ForwardingConfig};
pub use hub::HubConfig;
pub use observability::{LoggingConfig, MetricsSettings, ObservabilityConfig};
pub use participants::{EndpointsConfig, ParticipantConfig, ProxyMappingConfig};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Hub identity and signing.
    #[serde(default)]
    pub hub: HubConfig,
    /// Processing.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Reference-data cache.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Callback delivery.
    #[serde(default)]
    pub forwarding: ForwardingConfig,
    /// Logging and metrics.
    #[serde(default)]
    pub observability: ObservabilityConfig,
    /// Participants seeded into the reference store.
    #[serde(default)]
    pub participants: Vec<ParticipantConfig>,
    /// Proxy mappings seeded into the proxy cache.
    #[serde(default)]
    pub proxies: Vec<ProxyMappingConfig>,
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to "config.yaml".
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or("config.yaml");

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string (useful for testing).
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is compile-time constant; expect() is safe here
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map(|m| m.as_str());
        match cap.get(1).map(|m| std::env::var(m.as_str())) {
            Some(Ok(v)) if !v.is_empty() => v,
            _ => default_value.map_or_else(String::new, str::to_string),
        }
    })
    .into_owned()
}

/// Validate configuration values.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.hub.name.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "hub.name must not be empty".to_string(),
        ));
    }

    if config.engine.workers == 0 {
        return Err(ConfigError::ValidationError(
            "engine.workers must be positive".to_string(),
        ));
    }

    if config.engine.queue_capacity == 0 {
        return Err(ConfigError::ValidationError(
            "engine.queue_capacity must be positive".to_string(),
        ));
    }

    if config.cache.enabled && config.cache.ttl_ms == 0 {
        return Err(ConfigError::ValidationError(
            "cache.ttl_ms must be positive".to_string(),
        ));
    }

    if config.forwarding.timeout_ms == 0 {
        return Err(ConfigError::ValidationError(
            "forwarding.timeout_ms must be positive".to_string(),
        ));
    }

    let valid_formats = ["json", "pretty"];
    if !valid_formats.contains(&config.observability.logging.format.as_str()) {
        return Err(ConfigError::ValidationError(format!(
            "observability.logging.format must be one of: {valid_formats:?}"
        )));
    }

    let metrics = &config.observability.metrics;
    if metrics.enabled && metrics.listen_addr.parse::<SocketAddr>().is_err() {
        return Err(ConfigError::ValidationError(format!(
            "observability.metrics.listen_addr '{}' is not a socket address",
            metrics.listen_addr
        )));
    }

    let mut names = HashSet::new();
    for participant in &config.participants {
        if participant.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "participants[].name must not be empty".to_string(),
            ));
        }
        if !names.insert(participant.name.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "participant '{}' is configured twice",
                participant.name
            )));
        }
    }

    for mapping in &config.proxies {
        if !names.contains(mapping.proxy.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "proxy '{}' for '{}' is not a configured participant",
                mapping.proxy, mapping.participant
            )));
        }
    }

    Ok(())
}
