//! Signer Port (Driven Port)
//!
//! Produces the `fspiop-signature` value for a message. Key handling and the
//! signature algorithm belong to the adapter.

use serde_json::Value;

use crate::domain::shared::Headers;
use crate::error::QuoteError;

/// Signer error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SignerError {
    /// Signing key is not loaded.
    #[error("Signing key unavailable")]
    KeyUnavailable,

    /// Signature computation failed.
    #[error("Signing failed: {message}")]
    Failed {
        /// Error details.
        message: String,
    },
}

impl From<SignerError> for QuoteError {
    fn from(error: SignerError) -> Self {
        Self::internal(error.to_string())
    }
}

/// Port for message signing.
#[cfg_attr(test, mockall::automock)]
pub trait SignerPort: Send + Sync {
    /// Signature over the headers and body.
    fn sign(&self, headers: &Headers, body: &Value) -> Result<String, SignerError>;
}
