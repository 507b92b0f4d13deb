//! Engine context shared by every processor.

use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{
    CallbackPort, ProxyCachePort, QuotesRepository, ReferenceDataPort, SignerPort,
};
use crate::application::services::{
    CachedReferenceData, CallbackDispatcher, DuplicateDetector, EnumCache, MessageSigner,
    RecipientResolver, RecordWriter,
};
use crate::domain::rules::Rule;

/// Collaborators the engine is wired with.
pub struct EnginePorts {
    /// Quote persistence.
    pub repository: Arc<dyn QuotesRepository>,
    /// Enum lookups, endpoints and accounts.
    pub reference_data: Arc<dyn ReferenceDataPort>,
    /// Proxy mappings; `None` disables proxy resolution.
    pub proxy_cache: Option<Arc<dyn ProxyCachePort>>,
    /// Outbound HTTP.
    pub callback: Arc<dyn CallbackPort>,
    /// Signer; `None` disables signing.
    pub signer: Option<Arc<dyn SignerPort>>,
}

/// Behavioural switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Name the hub uses as `fspiop-source`.
    pub hub_name: String,
    /// Sign hub-originated messages.
    pub signing_enabled: bool,
    /// Skip duplicate checks and persistence.
    pub simple_routing_mode: bool,
    /// Version placed in outbound content types.
    pub api_version: String,
    /// Enum cache TTL; `None` bypasses the cache.
    pub cache_ttl: Option<Duration>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            hub_name: "Hub".to_string(),
            signing_enabled: false,
            simple_routing_mode: false,
            api_version: "1.0".to_string(),
            cache_ttl: Some(Duration::from_secs(10)),
        }
    }
}

/// Services and settings the processors share. Cheap to clone.
#[derive(Clone)]
pub struct EngineContext {
    pub(crate) repository: Arc<dyn QuotesRepository>,
    pub(crate) reference_data: Arc<dyn ReferenceDataPort>,
    pub(crate) duplicates: Arc<DuplicateDetector>,
    pub(crate) writer: Arc<RecordWriter>,
    pub(crate) resolver: Arc<RecipientResolver>,
    pub(crate) callbacks: Arc<CallbackDispatcher>,
    pub(crate) rules: Arc<[Rule]>,
    pub(crate) settings: Arc<EngineSettings>,
    cache: Option<Arc<EnumCache>>,
}

impl EngineContext {
    /// Wire the engine. Reference data goes through the enum cache unless
    /// `settings.cache_ttl` is `None`.
    #[must_use]
    pub fn new(ports: EnginePorts, settings: EngineSettings, rules: Vec<Rule>) -> Self {
        let (reference_data, cache) = match settings.cache_ttl {
            Some(ttl) => {
                let cache = Arc::new(EnumCache::new(ttl));
                let cached: Arc<dyn ReferenceDataPort> = Arc::new(CachedReferenceData::new(
                    ports.reference_data,
                    cache.clone(),
                ));
                (cached, Some(cache))
            }
            None => (ports.reference_data, None),
        };

        let signer = MessageSigner::new(
            settings.hub_name.clone(),
            settings.signing_enabled,
            ports.signer,
        );
        let callbacks = CallbackDispatcher::new(ports.callback, signer, settings.api_version.clone());

        Self {
            duplicates: Arc::new(DuplicateDetector::new(ports.repository.clone())),
            writer: Arc::new(RecordWriter::new(ports.repository.clone())),
            resolver: Arc::new(RecipientResolver::new(
                reference_data.clone(),
                ports.proxy_cache,
            )),
            callbacks: Arc::new(callbacks),
            repository: ports.repository,
            reference_data,
            rules: rules.into(),
            settings: Arc::new(settings),
            cache,
        }
    }

    /// Engine settings.
    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Loaded rules.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// The enum cache, when enabled.
    #[must_use]
    pub fn enum_cache(&self) -> Option<&Arc<EnumCache>> {
        self.cache.as_ref()
    }

    /// Returns true if duplicate checks and persistence are skipped.
    #[must_use]
    pub fn is_simple_routing(&self) -> bool {
        self.settings.simple_routing_mode
    }
}

impl std::fmt::Debug for EngineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineContext")
            .field("settings", &self.settings)
            .field("rules", &self.rules.len())
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
