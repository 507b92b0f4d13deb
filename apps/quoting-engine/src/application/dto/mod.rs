//! Data Transfer Objects
//!
//! The inbound envelope, the decoded message processors work on, and the
//! outcome they report.

mod envelope;
mod outcome;

pub use envelope::{
    EnvelopeContent, EnvelopeEvent, EnvelopeMetadata, InboundMessage, MessageEnvelope, UriParams,
    decode_payload_value,
};
pub use outcome::ProcessOutcome;
