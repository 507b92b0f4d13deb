//! Enum Cache
//!
//! Short-lived memoization of reference-data lookups. Entries are keyed by
//! lookup name plus ordered parameters and expire after a fixed TTL. Loader
//! errors are returned to the caller and never stored.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::application::ports::{
    EnumLookup, ParticipantAccount, PersistenceError, ReferenceDataPort,
};
use crate::domain::shared::EndpointType;
use crate::observability::record_cache_lookup;

/// Cache key: lookup name plus its ordered parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    lookup: String,
    params: Vec<String>,
}

impl CacheKey {
    /// Create a key.
    #[must_use]
    pub fn new(lookup: &str, params: &[&str]) -> Self {
        Self {
            lookup: lookup.to_string(),
            params: params.iter().map(|p| (*p).to_string()).collect(),
        }
    }
}

struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    expires_at: Instant,
}

/// TTL cache for reference lookups.
///
/// The lock is released before the loader runs, so two concurrent misses on
/// the same key may both load; the later insert wins.
pub struct EnumCache {
    ttl: Duration,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl EnumCache {
    /// Create a cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Entry lifetime.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the live value for `(lookup, params)` or load and store it.
    ///
    /// # Errors
    ///
    /// Returns the loader's error unchanged; nothing is cached in that case.
    pub async fn get_or_load<T, F, Fut, E>(
        &self,
        lookup: &str,
        params: &[&str],
        loader: F,
    ) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let key = CacheKey::new(lookup, params);

        if let Some(value) = self.live_value::<T>(&key) {
            record_cache_lookup(lookup, true);
            tracing::trace!(lookup, ?params, "enum cache hit");
            return Ok(value);
        }

        record_cache_lookup(lookup, false);
        tracing::trace!(lookup, ?params, "enum cache miss");

        let value = loader().await?;
        self.entries.write().insert(
            key,
            CacheEntry {
                value: Arc::new(value.clone()),
                expires_at: Instant::now() + self.ttl,
            },
        );
        Ok(value)
    }

    fn live_value<T: Clone + 'static>(&self, key: &CacheKey) -> Option<T> {
        let entries = self.entries.read();
        let entry = entries.get(key)?;
        if entry.expires_at <= Instant::now() {
            return None;
        }
        entry.value.downcast_ref::<T>().cloned()
    }

    /// Drop every entry.
    pub fn invalidate_all(&self) {
        self.entries.write().clear();
    }

    /// Drop expired entries, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    /// Number of stored entries, live or expired.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl std::fmt::Debug for EnumCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnumCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.len())
            .finish()
    }
}

// ============================================================================
// Cached Reference Data
// ============================================================================

/// [`ReferenceDataPort`] decorator that memoizes every lookup.
///
/// Absent endpoints are cached like present ones.
pub struct CachedReferenceData {
    inner: Arc<dyn ReferenceDataPort>,
    cache: Arc<EnumCache>,
}

impl CachedReferenceData {
    /// Wrap `inner` with `cache`.
    #[must_use]
    pub fn new(inner: Arc<dyn ReferenceDataPort>, cache: Arc<EnumCache>) -> Self {
        Self { inner, cache }
    }

    /// The underlying cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<EnumCache> {
        &self.cache
    }
}

#[async_trait]
impl ReferenceDataPort for CachedReferenceData {
    async fn lookup_id(&self, lookup: EnumLookup, name: &str) -> Result<i64, PersistenceError> {
        self.cache
            .get_or_load(lookup.as_str(), &[name], || self.inner.lookup_id(lookup, name))
            .await
    }

    async fn participant_endpoint(
        &self,
        participant: &str,
        endpoint_type: EndpointType,
    ) -> Result<Option<String>, PersistenceError> {
        self.cache
            .get_or_load(
                "participantEndpoint",
                &[participant, endpoint_type.as_str()],
                || self.inner.participant_endpoint(participant, endpoint_type),
            )
            .await
    }

    async fn participant_accounts(
        &self,
        participant: &str,
    ) -> Result<Vec<ParticipantAccount>, PersistenceError> {
        self.cache
            .get_or_load("participantAccounts", &[participant], || {
                self.inner.participant_accounts(participant)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingReferenceData {
        calls: AtomicUsize,
    }

    impl CountingReferenceData {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ReferenceDataPort for CountingReferenceData {
        async fn lookup_id(&self, lookup: EnumLookup, name: &str) -> Result<i64, PersistenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match name {
                "PAYER" => Ok(1),
                "PAYEE" => Ok(2),
                _ => Err(PersistenceError::not_found(lookup.as_str(), name)),
            }
        }

        async fn participant_endpoint(
            &self,
            participant: &str,
            _endpoint_type: EndpointType,
        ) -> Result<Option<String>, PersistenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((participant == "payeefsp").then(|| "http://payeefsp.local".to_string()))
        }

        async fn participant_accounts(
            &self,
            _participant: &str,
        ) -> Result<Vec<ParticipantAccount>, PersistenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![ParticipantAccount::position("USD")])
        }
    }

    fn cached(ttl: Duration) -> (Arc<CountingReferenceData>, CachedReferenceData) {
        let inner = Arc::new(CountingReferenceData::new());
        let cached = CachedReferenceData::new(inner.clone(), Arc::new(EnumCache::new(ttl)));
        (inner, cached)
    }

    #[tokio::test]
    async fn second_lookup_is_a_hit() {
        let (inner, cached) = cached(Duration::from_secs(60));

        assert_eq!(cached.lookup_id(EnumLookup::PartyType, "PAYER").await.unwrap(), 1);
        assert_eq!(cached.lookup_id(EnumLookup::PartyType, "PAYER").await.unwrap(), 1);
        assert_eq!(inner.calls(), 1);
        assert_eq!(cached.cache().len(), 1);
    }

    #[tokio::test]
    async fn key_includes_lookup_and_params() {
        let (inner, cached) = cached(Duration::from_secs(60));

        cached.lookup_id(EnumLookup::PartyType, "PAYER").await.unwrap();
        cached.lookup_id(EnumLookup::PartyType, "PAYEE").await.unwrap();
        cached
            .lookup_id(EnumLookup::TransactionInitiator, "PAYER")
            .await
            .unwrap();
        assert_eq!(inner.calls(), 3);
    }

    #[tokio::test]
    async fn loader_errors_are_not_cached() {
        let (inner, cached) = cached(Duration::from_secs(60));

        assert!(cached.lookup_id(EnumLookup::Participant, "ghost").await.is_err());
        assert!(cached.lookup_id(EnumLookup::Participant, "ghost").await.is_err());
        assert_eq!(inner.calls(), 2);
        assert!(cached.cache().is_empty());
    }

    #[tokio::test]
    async fn absent_endpoint_is_cached() {
        let (inner, cached) = cached(Duration::from_secs(60));

        let first = cached
            .participant_endpoint("proxiedfsp", EndpointType::Quotes)
            .await
            .unwrap();
        let second = cached
            .participant_endpoint("proxiedfsp", EndpointType::Quotes)
            .await
            .unwrap();
        assert!(first.is_none() && second.is_none());
        assert_eq!(inner.calls(), 1);
    }

    #[tokio::test]
    async fn expired_entries_reload() {
        let (inner, cached) = cached(Duration::from_millis(20));

        cached.participant_accounts("payerfsp").await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        cached.participant_accounts("payerfsp").await.unwrap();
        assert_eq!(inner.calls(), 2);
    }

    #[tokio::test]
    async fn invalidate_all_forces_reload() {
        let (inner, cached) = cached(Duration::from_secs(60));

        cached.lookup_id(EnumLookup::PartyType, "PAYER").await.unwrap();
        cached.cache().invalidate_all();
        assert!(cached.cache().is_empty());
        cached.lookup_id(EnumLookup::PartyType, "PAYER").await.unwrap();
        assert_eq!(inner.calls(), 2);
    }

    #[tokio::test]
    async fn purge_removes_only_expired() {
        let cache = EnumCache::new(Duration::from_millis(10));
        cache
            .get_or_load("a", &[], || async { Ok::<_, PersistenceError>(1_i64) })
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(25)).await;
        assert_eq!(cache.purge_expired(), 1);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn concurrent_lookups_are_safe() {
        let (_, cached) = cached(Duration::from_secs(60));
        let cached = Arc::new(cached);

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let cached = cached.clone();
                tokio::spawn(async move {
                    let name = if i % 2 == 0 { "PAYER" } else { "PAYEE" };
                    cached.lookup_id(EnumLookup::PartyType, name).await
                })
            })
            .collect();

        for task in tasks {
            assert!(task.await.unwrap().is_ok());
        }
        assert_eq!(cached.cache().len(), 2);
    }
}
