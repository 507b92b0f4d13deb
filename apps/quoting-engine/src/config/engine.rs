//! Engine, cache and forwarding configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Number of runtime workers.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Envelopes that may wait for a worker.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Skip duplicate checks and persistence; forward on declared headers.
    #[serde(default)]
    pub simple_routing_mode: bool,
    /// JSON rules file. No rules are evaluated when absent.
    #[serde(default)]
    pub rules_path: Option<String>,
    /// Resolve unknown participants through the proxy cache.
    #[serde(default = "default_true")]
    pub proxy_lookup_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            simple_routing_mode: false,
            rules_path: None,
            proxy_lookup_enabled: true,
        }
    }
}

/// Reference-data cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache enum lookups, endpoints and accounts.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Entry lifetime in milliseconds.
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_ms: default_ttl_ms(),
        }
    }
}

impl CacheConfig {
    /// Entry lifetime, or `None` when caching is off.
    #[must_use]
    pub const fn ttl(&self) -> Option<Duration> {
        if self.enabled {
            Some(Duration::from_millis(self.ttl_ms))
        } else {
            None
        }
    }
}

/// Callback delivery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardingConfig {
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ForwardingConfig {
    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

pub(crate) const fn default_true() -> bool {
    true
}

const fn default_workers() -> usize {
    4
}

const fn default_queue_capacity() -> usize {
    1024
}

const fn default_ttl_ms() -> u64 {
    10_000
}

const fn default_timeout_ms() -> u64 {
    5_000
}
