//! Rich error handling for the quoting engine.
//!
//! Every failure that crosses a processor boundary is a [`QuoteError`]. The
//! error carries a scheme error code, a human-readable description and
//! key/value context for logs. The code determines the [`ErrorKind`], which
//! tells the caller what to do with it:
//!
//! | Kind | Meaning | Handling |
//! |------|---------|----------|
//! | `Validation` | Malformed or rule-rejected message | Error callback to sender |
//! | `Conflict` | Duplicate id with a different payload | Error callback to sender |
//! | `NotFound` | Unresolvable endpoint, quote or reference value | Error callback to sender |
//! | `Forwarding` | Counterparty unreachable or non-2xx | Error callback to sender |
//! | `Internal` | Persistence or unexpected failure | Logged, generic error callback |
//!
//! FSPIOP numeric codes are carried on the wire in `errorInformation.errorCode`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Broad classification of a [`QuoteError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Malformed or business-rule-rejected message.
    Validation,
    /// Duplicate id with mismatched payload hash.
    Conflict,
    /// Recipient, quote or reference value could not be found.
    NotFound,
    /// Delivery to a resolved endpoint failed.
    Forwarding,
    /// Persistence or unexpected failure.
    Internal,
}

impl ErrorKind {
    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Conflict => "conflict",
            Self::NotFound => "not_found",
            Self::Forwarding => "forwarding",
            Self::Internal => "internal",
        }
    }
}

/// Scheme error codes produced by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Communication errors (1xxx)
    /// Generic communication error.
    CommunicationError,
    /// The destination could not be reached or answered with a failure.
    DestinationCommunicationError,

    // Server errors (2xxx)
    /// Internal server error.
    InternalServerError,
    /// Operation not implemented by the switch.
    NotImplemented,

    // Client errors (3xxx)
    /// Generic validation error.
    ValidationError,
    /// Payload could not be parsed.
    MalformedSyntax,
    /// A mandatory element is missing.
    MissingElement,
    /// Same id resent with a different payload.
    ModifiedRequest,
    /// Only payer-initiated transactions are accepted.
    UnsupportedInitiator,
    /// Payer has no active position account for a requested currency.
    UnsupportedParticipant,
    /// Generic id not found.
    IdNotFound,
    /// No callback endpoint for the destination FSP.
    DestinationFspError,
    /// Payer FSP is not registered.
    PayerFspIdNotFound,
    /// Payee FSP is not registered.
    PayeeFspIdNotFound,
    /// Quote id not found.
    QuoteIdNotFound,
    /// Bulk quote id not found.
    BulkQuoteIdNotFound,
    /// Quote expiration is in the past.
    QuoteExpired,

    // Party errors (4xxx / 5xxx)
    /// Generic payer error.
    PayerError,
    /// Generic payee error.
    PayeeError,
    /// Payee does not support the requested currency.
    PayeeUnsupportedCurrency,
}

impl ErrorCode {
    /// FSPIOP numeric error code.
    #[must_use]
    pub const fn fspiop_code(&self) -> &'static str {
        match self {
            Self::CommunicationError => "1000",
            Self::DestinationCommunicationError => "1001",
            Self::InternalServerError => "2001",
            Self::NotImplemented => "2501",
            Self::ValidationError | Self::UnsupportedInitiator | Self::UnsupportedParticipant => {
                "3100"
            }
            Self::MalformedSyntax => "3101",
            Self::MissingElement => "3102",
            Self::ModifiedRequest => "3106",
            Self::IdNotFound => "3200",
            Self::DestinationFspError => "3201",
            Self::PayerFspIdNotFound => "3202",
            Self::PayeeFspIdNotFound => "3203",
            Self::QuoteIdNotFound => "3204",
            Self::BulkQuoteIdNotFound => "3208",
            Self::QuoteExpired => "3302",
            Self::PayerError => "4000",
            Self::PayeeError => "5000",
            Self::PayeeUnsupportedCurrency => "5106",
        }
    }

    /// Short description that prefixes every `errorDescription`.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::CommunicationError => "Communication error",
            Self::DestinationCommunicationError => "Destination communication error",
            Self::InternalServerError => "Internal server error",
            Self::NotImplemented => "Not implemented",
            Self::ValidationError => "Generic validation error",
            Self::MalformedSyntax => "Malformed syntax",
            Self::MissingElement => "Missing mandatory element",
            Self::ModifiedRequest => "Modified request",
            Self::UnsupportedInitiator => "Unsupported initiator",
            Self::UnsupportedParticipant => "Unsupported participant",
            Self::IdNotFound => "Generic ID not found",
            Self::DestinationFspError => "Destination FSP Error",
            Self::PayerFspIdNotFound => "Payer FSP ID not found",
            Self::PayeeFspIdNotFound => "Payee FSP ID not found",
            Self::QuoteIdNotFound => "Quote ID not found",
            Self::BulkQuoteIdNotFound => "Bulk quote ID not found",
            Self::QuoteExpired => "Quote expired",
            Self::PayerError => "Generic Payer error",
            Self::PayeeError => "Generic Payee error",
            Self::PayeeUnsupportedCurrency => "Payee unsupported currency",
        }
    }

    /// Error kind this code belongs to.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::CommunicationError | Self::DestinationCommunicationError => ErrorKind::Forwarding,
            Self::InternalServerError | Self::NotImplemented => ErrorKind::Internal,
            Self::ModifiedRequest => ErrorKind::Conflict,
            Self::IdNotFound
            | Self::DestinationFspError
            | Self::PayerFspIdNotFound
            | Self::PayeeFspIdNotFound
            | Self::QuoteIdNotFound
            | Self::BulkQuoteIdNotFound => ErrorKind::NotFound,
            Self::ValidationError
            | Self::MalformedSyntax
            | Self::MissingElement
            | Self::UnsupportedInitiator
            | Self::UnsupportedParticipant
            | Self::QuoteExpired
            | Self::PayerError
            | Self::PayeeError
            | Self::PayeeUnsupportedCurrency => ErrorKind::Validation,
        }
    }

    /// Reason string used in logs.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::CommunicationError => "COMMUNICATION_ERROR",
            Self::DestinationCommunicationError => "DESTINATION_COMMUNICATION_ERROR",
            Self::InternalServerError => "INTERNAL_SERVER_ERROR",
            Self::NotImplemented => "NOT_IMPLEMENTED",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::MalformedSyntax => "MALFORMED_SYNTAX",
            Self::MissingElement => "MISSING_ELEMENT",
            Self::ModifiedRequest => "MODIFIED_REQUEST",
            Self::UnsupportedInitiator => "UNSUPPORTED_INITIATOR",
            Self::UnsupportedParticipant => "UNSUPPORTED_PARTICIPANT",
            Self::IdNotFound => "ID_NOT_FOUND",
            Self::DestinationFspError => "DESTINATION_FSP_ERROR",
            Self::PayerFspIdNotFound => "PAYER_FSP_ID_NOT_FOUND",
            Self::PayeeFspIdNotFound => "PAYEE_FSP_ID_NOT_FOUND",
            Self::QuoteIdNotFound => "QUOTE_ID_NOT_FOUND",
            Self::BulkQuoteIdNotFound => "BULK_QUOTE_ID_NOT_FOUND",
            Self::QuoteExpired => "QUOTE_EXPIRED",
            Self::PayerError => "PAYER_ERROR",
            Self::PayeeError => "PAYEE_ERROR",
            Self::PayeeUnsupportedCurrency => "PAYEE_UNSUPPORTED_CURRENCY",
        }
    }

    /// Look up a code by its reason string or FSPIOP numeric code.
    ///
    /// Used to honour the `FSPIOPError` parameter of rule events.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        const ALL: [ErrorCode; 20] = [
            ErrorCode::CommunicationError,
            ErrorCode::DestinationCommunicationError,
            ErrorCode::InternalServerError,
            ErrorCode::NotImplemented,
            ErrorCode::ValidationError,
            ErrorCode::MalformedSyntax,
            ErrorCode::MissingElement,
            ErrorCode::ModifiedRequest,
            ErrorCode::UnsupportedInitiator,
            ErrorCode::UnsupportedParticipant,
            ErrorCode::IdNotFound,
            ErrorCode::DestinationFspError,
            ErrorCode::PayerFspIdNotFound,
            ErrorCode::PayeeFspIdNotFound,
            ErrorCode::QuoteIdNotFound,
            ErrorCode::BulkQuoteIdNotFound,
            ErrorCode::QuoteExpired,
            ErrorCode::PayerError,
            ErrorCode::PayeeError,
            ErrorCode::PayeeUnsupportedCurrency,
        ];

        let upper = name.trim().to_ascii_uppercase();
        ALL.iter()
            .find(|code| code.reason() == upper)
            .or_else(|| ALL.iter().find(|code| code.fspiop_code() == upper))
            .copied()
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason())
    }
}

/// A typed error with context for the quoting engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct QuoteError {
    code: ErrorCode,
    message: String,
    context: Vec<(String, String)>,
}

impl QuoteError {
    /// Create a new quote error.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: Vec::new(),
        }
    }

    /// Add context to the error.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.push((key.into(), value.into()));
        self
    }

    /// Get the error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Get the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.code.kind()
    }

    /// Get the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the context.
    #[must_use]
    pub fn context(&self) -> &[(String, String)] {
        &self.context
    }

    /// Look up a context value.
    #[must_use]
    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Description placed on the wire.
    ///
    /// Internal errors never expose their message; it stays in the logs.
    #[must_use]
    pub fn wire_description(&self) -> String {
        if self.kind() == ErrorKind::Internal || self.message.is_empty() {
            self.code.description().to_string()
        } else {
            format!("{} - {}", self.code.description(), self.message)
        }
    }

    /// Build the scheme `errorInformation` body.
    #[must_use]
    pub fn to_error_information(&self) -> ErrorInformationBody {
        ErrorInformationBody {
            error_information: ErrorInformation {
                error_code: self.code.fspiop_code().to_string(),
                error_description: self.wire_description(),
                extension_list: None,
            },
        }
    }
}

impl std::fmt::Display for QuoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code.reason(), self.message)
    }
}

/// Scheme error body: `{"errorInformation": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInformationBody {
    /// Error details.
    pub error_information: ErrorInformation,
}

/// Scheme error details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInformation {
    /// FSPIOP numeric code, as a string.
    pub error_code: String,
    /// Human-readable description.
    pub error_description: String,
    /// Optional extension list, relayed untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension_list: Option<serde_json::Value>,
}

/// Convenience constructors for common errors.
impl QuoteError {
    /// Generic validation failure.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    /// Payload could not be decoded.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MalformedSyntax, message)
    }

    /// Mandatory element missing.
    #[must_use]
    pub fn missing_element(element: &str) -> Self {
        Self::new(
            ErrorCode::MissingElement,
            format!("'{element}' is required"),
        )
        .with_context("element", element)
    }

    /// Duplicate id with a different payload.
    #[must_use]
    pub fn conflict(id: &str) -> Self {
        Self::new(
            ErrorCode::ModifiedRequest,
            format!("{id} is a duplicate but hashes don't match"),
        )
        .with_context("id", id)
    }

    /// No callback endpoint found through direct or proxy lookup.
    #[must_use]
    pub fn no_endpoint(participant: &str, message_id: &str) -> Self {
        Self::new(
            ErrorCode::DestinationFspError,
            format!("No callback endpoint found for participant {participant}"),
        )
        .with_context("participant", participant)
        .with_context("message_id", message_id)
    }

    /// Delivery to a resolved endpoint failed.
    #[must_use]
    pub fn forwarding(destination: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DestinationCommunicationError, message)
            .with_context("destination", destination)
    }

    /// Internal failure.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalServerError, message)
    }
}
