//! Callback Port (Driven Port)
//!
//! Delivers an HTTP request to a participant endpoint. Timeouts are owned by
//! the adapter; the engine never retries.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::shared::Headers;
use crate::error::QuoteError;

/// HTTP method of an outbound callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
}

impl HttpMethod {
    /// Method name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Request handed to the callback adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    /// Method.
    pub method: HttpMethod,
    /// Absolute URL.
    pub url: String,
    /// Headers, including signature when signed.
    pub headers: Headers,
    /// JSON body; `None` for GET.
    pub body: Option<Value>,
}

/// Successful delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackResponse {
    /// HTTP status.
    pub status: u16,
}

/// Delivery failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ForwardError {
    /// Connection refused, DNS failure and similar.
    #[error("Connection to {url} failed: {message}")]
    Connection {
        /// Target URL.
        url: String,
        /// Error details.
        message: String,
    },

    /// No response within the configured timeout.
    #[error("Request to {url} timed out")]
    Timeout {
        /// Target URL.
        url: String,
    },

    /// Counterparty answered with a non-2xx status.
    #[error("{url} responded with status {status}")]
    Status {
        /// Target URL.
        url: String,
        /// HTTP status.
        status: u16,
    },
}

impl ForwardError {
    /// Label used in metrics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Connection { .. } => "connection_error",
            Self::Timeout { .. } => "timeout",
            Self::Status { .. } => "bad_status",
        }
    }
}

impl From<ForwardError> for QuoteError {
    fn from(error: ForwardError) -> Self {
        let url = match &error {
            ForwardError::Connection { url, .. }
            | ForwardError::Timeout { url }
            | ForwardError::Status { url, .. } => url.clone(),
        };
        Self::forwarding(&url, error.to_string())
    }
}

/// Port for outbound callbacks.
#[async_trait]
pub trait CallbackPort: Send + Sync {
    /// Deliver a request; non-2xx responses are errors.
    async fn send(&self, request: OutboundRequest) -> Result<CallbackResponse, ForwardError>;
}
