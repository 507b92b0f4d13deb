//! Events emitted by firing rules.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ErrorCode, QuoteError};

/// Event kind. Unknown kinds are kept verbatim and passed to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    /// Hold the quote for manual handling; do not forward.
    InterceptQuote,
    /// Reject the quote with a validation error.
    InvalidQuoteRequest,
    /// Any other event.
    Other(String),
}

impl EventType {
    /// Wire name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::InterceptQuote => "INTERCEPT_QUOTE",
            Self::InvalidQuoteRequest => "INVALID_QUOTE_REQUEST",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for EventType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "INTERCEPT_QUOTE" => Self::InterceptQuote,
            "INVALID_QUOTE_REQUEST" => Self::InvalidQuoteRequest,
            _ => Self::Other(value),
        }
    }
}

impl From<EventType> for String {
    fn from(value: EventType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Event attached to a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleEvent {
    /// Event kind.
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// Free-form parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl RuleEvent {
    /// Create an event without parameters.
    #[must_use]
    pub const fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            params: None,
        }
    }

    /// String parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.as_ref()?.get(name)?.as_str()
    }

    /// Error carried by an `INVALID_QUOTE_REQUEST` event.
    ///
    /// `FSPIOPError` names the error code (reason or numeric code) and
    /// `message` the description; both fall back to a generic validation
    /// error.
    #[must_use]
    pub fn to_error(&self) -> QuoteError {
        let code = self
            .param("FSPIOPError")
            .and_then(ErrorCode::from_name)
            .unwrap_or(ErrorCode::ValidationError);
        let message = self
            .param("message")
            .unwrap_or("the request was rejected by a business rule");
        QuoteError::new(code, message).with_context("event", self.event_type.as_str())
    }
}
