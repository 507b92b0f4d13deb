//! Persistence adapters.

mod in_memory;
mod reference_data;

pub use in_memory::InMemoryQuotesRepository;
pub use reference_data::InMemoryReferenceData;
