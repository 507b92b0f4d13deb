//! Proxy Cache Port (Driven Port)
//!
//! Maps participants outside the local scheme to the proxy that represents
//! them.

use async_trait::async_trait;

use crate::error::QuoteError;

/// Proxy cache error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProxyError {
    /// Cache backend unreachable.
    #[error("Proxy cache unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },
}

impl From<ProxyError> for QuoteError {
    fn from(error: ProxyError) -> Self {
        Self::internal(error.to_string())
    }
}

/// Port for proxy lookups.
#[async_trait]
pub trait ProxyCachePort: Send + Sync {
    /// Register `proxy_id` as the representative of `participant`.
    async fn add_mapping(&self, participant: &str, proxy_id: &str) -> Result<(), ProxyError>;

    /// Proxy representing `participant`, if any.
    async fn get_mapping(&self, participant: &str) -> Result<Option<String>, ProxyError>;
}
