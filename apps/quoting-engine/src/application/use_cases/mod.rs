//! Use Cases
//!
//! Processors for quotes, bulk quotes and fx quotes, and the dispatcher that
//! routes inbound envelopes to them.

mod common;
mod context;
mod dispatch_message;
mod process_bulk_quote;
mod process_fx_quote;
mod process_quote;

pub use context::{EngineContext, EnginePorts, EngineSettings};
pub use dispatch_message::MessageDispatcher;
pub use process_bulk_quote::BulkQuoteProcessor;
pub use process_fx_quote::FxQuoteProcessor;
pub use process_quote::QuoteProcessor;
