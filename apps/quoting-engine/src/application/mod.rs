//! Application Layer
//!
//! Ports, services and use cases that drive the quoting domain.

pub mod dto;
pub mod ports;
pub mod services;
pub mod use_cases;
