//! Domain Layer
//!
//! Pure quoting domain: typed messages and their validation, persisted rows,
//! canonical hashing and the business-rules evaluator. No I/O lives here.

pub mod bulk_quote;
pub mod duplicate;
pub mod fx_quote;
pub mod quote;
pub mod rules;
pub mod shared;
