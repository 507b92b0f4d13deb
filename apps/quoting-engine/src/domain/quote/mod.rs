//! Quote Bounded Context
//!
//! Typed quote messages, their validation, persisted rows and the
//! processing state machine.

pub mod records;
pub mod request;
pub mod response;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use records::{
    PartyPersonalInfoRecord, PartyRole, QuoteErrorRecord, QuoteExtensionRecord,
    QuotePartyRecord, QuoteRecord, QuoteResponseRecord, TransactionReferenceRecord,
};
pub use request::QuoteRequest;
pub use response::QuoteResponse;

/// Processing state of one inbound message.
///
/// ```text
/// Received -> Validated -> DedupeChecked -> Persisted -> RuleEvaluated -> Resolved -> Forwarded
///                                                            \-> Held
/// any state after Received -> ErrorCallbackSent
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuoteState {
    /// Envelope accepted by a processor.
    Received,
    /// Payload decoded and validated.
    Validated,
    /// Duplicate check done.
    DedupeChecked,
    /// Business rows committed.
    Persisted,
    /// Rules evaluated without rejection.
    RuleEvaluated,
    /// Next-hop endpoint resolved.
    Resolved,
    /// Delivered to the next hop.
    Forwarded,
    /// Held for manual handling by a rule.
    Held,
    /// Failed; an error callback was produced for the sender.
    ErrorCallbackSent,
}

impl QuoteState {
    /// Returns true if no further transition is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Forwarded | Self::Held | Self::ErrorCallbackSent)
    }

    /// Label used in logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "RECEIVED",
            Self::Validated => "VALIDATED",
            Self::DedupeChecked => "DEDUPE_CHECKED",
            Self::Persisted => "PERSISTED",
            Self::RuleEvaluated => "RULE_EVALUATED",
            Self::Resolved => "RESOLVED",
            Self::Forwarded => "FORWARDED",
            Self::Held => "HELD",
            Self::ErrorCallbackSent => "ERROR_CALLBACK_SENT",
        }
    }
}

impl fmt::Display for QuoteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(QuoteState::Forwarded.is_terminal());
        assert!(QuoteState::Held.is_terminal());
        assert!(QuoteState::ErrorCallbackSent.is_terminal());
        assert!(!QuoteState::Persisted.is_terminal());
    }
}
