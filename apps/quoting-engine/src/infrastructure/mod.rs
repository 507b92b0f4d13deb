//! Infrastructure Layer
//!
//! Adapters implementing the application ports, the rule file loader, the
//! wiring container and the worker runtime.

pub mod container;
pub mod http;
pub mod persistence;
pub mod proxy;
pub mod rules;
pub mod runtime;
pub mod signing;

pub use container::{Container, ContainerError};
pub use runtime::{EngineHandle, EngineRuntime, RuntimeConfig, RuntimeError};
