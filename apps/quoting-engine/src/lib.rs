// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Quoting Engine - Rust Core Library
//!
//! Quote processing engine of an interoperable real-time payment scheme.
//! Each inbound quote, bulk-quote or fx-quote message is validated,
//! deduplicated, persisted, evaluated against business rules, routed to a
//! direct or proxied recipient, signed when the hub originates it, and
//! forwarded. Failures go back to the sender as error callbacks.
//!
//! # Architecture (Clean Architecture + DDD + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: typed messages and validation, persisted rows, canonical
//!   hashing, the rules evaluator
//!   - `quote`, `bulk_quote`, `fx_quote`: resource families
//!   - `duplicate`: canonical payload hashing
//!   - `rules`: condition trees, operators, facts, events
//!
//! - **Application**: orchestration
//!   - `ports`: `QuotesRepository`, `ReferenceDataPort`, `ProxyCachePort`,
//!     `CallbackPort`, `SignerPort`
//!   - `services`: enum cache, duplicate detector, record writer, recipient
//!     resolver, message signer, callback dispatcher
//!   - `use_cases`: `MessageDispatcher` and the three processors
//!   - `dto`: the inbound envelope and processing outcome
//!
//! - **Infrastructure**: adapters
//!   - `persistence`: in-memory repository and reference data
//!   - `proxy`: in-memory proxy cache
//!   - `http`: reqwest and recording callback clients
//!   - `signing`: keyed digest signer
//!   - `rules`: rule file loader
//!   - `runtime`: worker pool
//!   - `container`: configuration-driven wiring

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Core business logic with no external dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Cross-cutting
// =============================================================================

/// Configuration loading and validation.
pub mod config;

/// Error types and FSPIOP error codes.
pub mod error;

/// Prometheus metrics.
pub mod observability;

/// Tracing subscriber setup.
pub mod telemetry;

// =============================================================================
// Re-exports
// =============================================================================

pub use application::dto::{InboundMessage, MessageEnvelope, ProcessOutcome};
pub use application::ports::{
    CallbackPort, ProxyCachePort, QuoteTransaction, QuotesRepository, ReferenceDataPort,
    SignerPort,
};
pub use application::use_cases::{EngineContext, EnginePorts, EngineSettings, MessageDispatcher};
pub use config::{Config, ConfigError, load_config, load_config_from_string};
pub use domain::rules::{Rule, RuleLoadError, parse_rules};
pub use error::{ErrorCode, ErrorKind, QuoteError};
pub use infrastructure::{Container, EngineHandle, EngineRuntime, RuntimeConfig};
