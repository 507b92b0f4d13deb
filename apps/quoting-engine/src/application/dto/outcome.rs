//! Processing outcome of one inbound message.

use crate::domain::quote::QuoteState;
use crate::domain::rules::RuleEvent;
use crate::error::QuoteError;

/// Terminal result of a processor invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    /// Delivered to the next hop.
    Forwarded {
        /// Participant the message was addressed to.
        destination: String,
        /// URL it was delivered to.
        url: String,
        /// True when this was an identical resend and nothing was persisted.
        resend: bool,
        /// Proxy whose endpoint was used.
        proxy: Option<String>,
        /// Rule events that fired without stopping the message.
        events: Vec<RuleEvent>,
    },
    /// Held by an intercept rule; nothing was forwarded.
    Held {
        /// Events that fired.
        events: Vec<RuleEvent>,
    },
    /// Failed; an error callback was attempted where one applies.
    Rejected {
        /// The failure.
        error: QuoteError,
        /// Last state reached before the failure.
        failed_at: QuoteState,
        /// Whether an error callback reached the sender.
        callback_delivered: bool,
    },
}

impl ProcessOutcome {
    /// Label used in logs and metrics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Forwarded { resend: false, .. } => "forwarded",
            Self::Forwarded { resend: true, .. } => "resent",
            Self::Held { .. } => "held",
            Self::Rejected { .. } => "rejected",
        }
    }

    /// Final state of the message.
    #[must_use]
    pub const fn state(&self) -> QuoteState {
        match self {
            Self::Forwarded { .. } => QuoteState::Forwarded,
            Self::Held { .. } => QuoteState::Held,
            Self::Rejected { .. } => QuoteState::ErrorCallbackSent,
        }
    }

    /// Returns true if the message reached its next hop.
    #[must_use]
    pub const fn is_forwarded(&self) -> bool {
        matches!(self, Self::Forwarded { .. })
    }

    /// The failure, if the message was rejected.
    #[must_use]
    pub const fn error(&self) -> Option<&QuoteError> {
        match self {
            Self::Rejected { error, .. } => Some(error),
            _ => None,
        }
    }
}
