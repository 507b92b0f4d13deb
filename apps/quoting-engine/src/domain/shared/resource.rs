//! Resource families, actions and callback endpoint types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QuoteError;

/// Resource family a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceType {
    /// Individual quotes.
    Quote,
    /// Bulk quotes.
    BulkQuote,
    /// Currency-conversion quotes.
    FxQuote,
}

impl ResourceType {
    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Quote => "quote",
            Self::BulkQuote => "bulk-quote",
            Self::FxQuote => "fx-quote",
        }
    }

    /// URL path segment and media-type resource name.
    #[must_use]
    pub const fn path_segment(&self) -> &'static str {
        match self {
            Self::Quote => "quotes",
            Self::BulkQuote => "bulkQuotes",
            Self::FxQuote => "fxQuotes",
        }
    }

    /// Callback endpoint type registered for this resource.
    #[must_use]
    pub const fn endpoint_type(&self) -> EndpointType {
        match self {
            Self::Quote => EndpointType::Quotes,
            Self::BulkQuote => EndpointType::BulkQuotes,
            Self::FxQuote => EndpointType::FxQuotes,
        }
    }

    /// Name of the identifier field carried in request bodies.
    #[must_use]
    pub const fn id_field(&self) -> &'static str {
        match self {
            Self::Quote => "quoteId",
            Self::BulkQuote => "bulkQuoteId",
            Self::FxQuote => "conversionRequestId",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = QuoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quote" | "quotes" => Ok(Self::Quote),
            "bulk-quote" | "bulkquote" | "bulkquotes" | "bulk_quote" => Ok(Self::BulkQuote),
            "fx-quote" | "fxquote" | "fxquotes" | "fx_quote" => Ok(Self::FxQuote),
            other => Err(QuoteError::malformed(format!("unknown message type '{other}'"))
                .with_context("type", other)),
        }
    }
}

/// What the inbound message asks the engine to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// New request.
    Post,
    /// Response to a request.
    Put,
    /// Error callback for a request.
    Error,
    /// Status lookup.
    Get,
}

impl Action {
    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Put => "put",
            Self::Error => "error",
            Self::Get => "get",
        }
    }

    /// Resolve an event action plus resource path into an action.
    ///
    /// A PUT whose path ends in `/error` is an error callback.
    pub fn resolve(action: &str, path: Option<&str>) -> Result<Self, QuoteError> {
        let is_error_path = path.is_some_and(|p| p.trim_end_matches('/').ends_with("/error"));
        match action.trim().to_ascii_lowercase().as_str() {
            "post" => Ok(Self::Post),
            "put" if is_error_path => Ok(Self::Error),
            "put" => Ok(Self::Put),
            "error" => Ok(Self::Error),
            "get" => Ok(Self::Get),
            other => Err(QuoteError::malformed(format!("unsupported action '{other}'"))
                .with_context("action", other)),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Participant callback endpoint types used by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndpointType {
    /// `FSPIOP_CALLBACK_URL_QUOTES`
    #[serde(rename = "FSPIOP_CALLBACK_URL_QUOTES")]
    Quotes,
    /// `FSPIOP_CALLBACK_URL_BULK_QUOTES`
    #[serde(rename = "FSPIOP_CALLBACK_URL_BULK_QUOTES")]
    BulkQuotes,
    /// `FSPIOP_CALLBACK_URL_FX_QUOTES`
    #[serde(rename = "FSPIOP_CALLBACK_URL_FX_QUOTES")]
    FxQuotes,
}

impl EndpointType {
    /// Registry name of the endpoint type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Quotes => "FSPIOP_CALLBACK_URL_QUOTES",
            Self::BulkQuotes => "FSPIOP_CALLBACK_URL_BULK_QUOTES",
            Self::FxQuotes => "FSPIOP_CALLBACK_URL_FX_QUOTES",
        }
    }
}

impl fmt::Display for EndpointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
