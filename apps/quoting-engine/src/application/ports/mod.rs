//! Application Ports (Driven)
//!
//! Interfaces the engine uses to reach its collaborators: persistence,
//! reference data, the proxy cache, participant callbacks and the signer.

mod callback_port;
mod proxy_cache_port;
mod quotes_repository_port;
mod reference_data_port;
mod signer_port;

pub use callback_port::{CallbackPort, CallbackResponse, ForwardError, HttpMethod, OutboundRequest};
pub use proxy_cache_port::{ProxyCachePort, ProxyError};
pub use quotes_repository_port::{PersistenceError, QuoteTransaction, QuotesRepository};
pub use reference_data_port::{
    EnumLookup, POSITION_ACCOUNT, PRINCIPLE_VALUE, ParticipantAccount, ReferenceDataPort,
};
#[cfg(test)]
pub use signer_port::MockSignerPort;
pub use signer_port::{SignerError, SignerPort};
