//! In-memory proxy cache.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::application::ports::{ProxyCachePort, ProxyError};

/// Participant to proxy mapping held in process.
#[derive(Debug, Default)]
pub struct InMemoryProxyCache {
    mappings: RwLock<HashMap<String, String>>,
}

impl InMemoryProxyCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style mapping registration.
    #[must_use]
    pub fn with_mapping(self, participant: &str, proxy_id: &str) -> Self {
        self.mappings
            .write()
            .insert(participant.to_string(), proxy_id.to_string());
        self
    }

    /// Number of mapped participants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mappings.read().len()
    }

    /// Returns true if nothing is mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappings.read().is_empty()
    }
}

#[async_trait]
impl ProxyCachePort for InMemoryProxyCache {
    async fn add_mapping(&self, participant: &str, proxy_id: &str) -> Result<(), ProxyError> {
        self.mappings
            .write()
            .insert(participant.to_string(), proxy_id.to_string());
        Ok(())
    }

    async fn get_mapping(&self, participant: &str) -> Result<Option<String>, ProxyError> {
        Ok(self.mappings.read().get(participant).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mapping_round_trip() {
        let cache = InMemoryProxyCache::new().with_mapping("remotefsp", "proxyab");
        cache.add_mapping("otherfsp", "proxycd").await.unwrap();

        assert_eq!(
            cache.get_mapping("remotefsp").await.unwrap().as_deref(),
            Some("proxyab")
        );
        assert_eq!(cache.get_mapping("payerfsp").await.unwrap(), None);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn later_mapping_replaces_earlier() {
        let cache = InMemoryProxyCache::new().with_mapping("remotefsp", "proxyab");
        cache.add_mapping("remotefsp", "proxycd").await.unwrap();

        assert_eq!(
            cache.get_mapping("remotefsp").await.unwrap().as_deref(),
            Some("proxycd")
        );
    }
}
