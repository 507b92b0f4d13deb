//! Dependency Injection Container
//!
//! Builds the adapters named by the configuration and wires them into one
//! [`MessageDispatcher`].

use std::sync::Arc;

use crate::application::ports::{
    CallbackPort, ForwardError, ParticipantAccount, ProxyCachePort, SignerPort,
};
use crate::application::use_cases::{EngineContext, EnginePorts, EngineSettings, MessageDispatcher};
use crate::config::Config;
use crate::domain::rules::{Rule, RuleLoadError};
use crate::domain::shared::EndpointType;
use crate::infrastructure::http::{CallbackClientConfig, ReqwestCallbackClient};
use crate::infrastructure::persistence::{InMemoryQuotesRepository, InMemoryReferenceData};
use crate::infrastructure::proxy::InMemoryProxyCache;
use crate::infrastructure::rules::load_rules_from_file;
use crate::infrastructure::runtime::RuntimeConfig;
use crate::infrastructure::signing::KeyedDigestSigner;

/// Wiring failures.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    /// Rules file missing or invalid.
    #[error(transparent)]
    Rules(#[from] RuleLoadError),

    /// HTTP client could not be built.
    #[error("Callback client: {0}")]
    Callback(#[from] ForwardError),
}

/// Wired engine components.
pub struct Container {
    dispatcher: Arc<MessageDispatcher>,
    repository: Arc<InMemoryQuotesRepository>,
    reference_data: Arc<InMemoryReferenceData>,
    runtime: RuntimeConfig,
}

impl Container {
    /// Build every component from configuration, using the reqwest client
    /// for callbacks.
    pub fn from_config(config: &Config) -> Result<Self, ContainerError> {
        let client = ReqwestCallbackClient::new(&CallbackClientConfig {
            timeout: config.forwarding.timeout(),
        })?;
        Self::with_callback(config, Arc::new(client))
    }

    /// Build every component from configuration with a caller-supplied
    /// callback port.
    pub fn with_callback(
        config: &Config,
        callback: Arc<dyn CallbackPort>,
    ) -> Result<Self, ContainerError> {
        let rules: Vec<Rule> = match &config.engine.rules_path {
            Some(path) => load_rules_from_file(path)?,
            None => Vec::new(),
        };

        let repository = Arc::new(InMemoryQuotesRepository::new());
        let reference_data = Arc::new(seed_reference_data(config));
        let proxy_cache: Option<Arc<dyn ProxyCachePort>> = if config.engine.proxy_lookup_enabled {
            Some(Arc::new(seed_proxies(config)))
        } else {
            None
        };
        let signer: Option<Arc<dyn SignerPort>> = if config.hub.signing_key.is_empty() {
            None
        } else {
            Some(Arc::new(KeyedDigestSigner::new(
                config.hub.signing_key.as_bytes(),
            )))
        };
        if config.hub.signing_enabled && signer.is_none() {
            tracing::warn!("signing enabled without hub.signing_key, messages go out unsigned");
        }

        let settings = EngineSettings {
            hub_name: config.hub.name.clone(),
            signing_enabled: config.hub.signing_enabled,
            simple_routing_mode: config.engine.simple_routing_mode,
            api_version: config.hub.api_version.clone(),
            cache_ttl: config.cache.ttl(),
        };

        let ctx = EngineContext::new(
            EnginePorts {
                repository: repository.clone(),
                reference_data: reference_data.clone(),
                proxy_cache,
                callback,
                signer,
            },
            settings,
            rules,
        );

        tracing::info!(
            hub = %config.hub.name,
            participants = config.participants.len(),
            proxies = config.proxies.len(),
            rules = ctx.rules().len(),
            simple_routing = config.engine.simple_routing_mode,
            "engine wired"
        );

        Ok(Self {
            dispatcher: Arc::new(MessageDispatcher::new(ctx)),
            repository,
            reference_data,
            runtime: RuntimeConfig {
                workers: config.engine.workers,
                queue_capacity: config.engine.queue_capacity,
            },
        })
    }

    /// The dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> Arc<MessageDispatcher> {
        Arc::clone(&self.dispatcher)
    }

    /// The quotes repository.
    #[must_use]
    pub fn repository(&self) -> Arc<InMemoryQuotesRepository> {
        Arc::clone(&self.repository)
    }

    /// The reference data store.
    #[must_use]
    pub fn reference_data(&self) -> Arc<InMemoryReferenceData> {
        Arc::clone(&self.reference_data)
    }

    /// Worker pool settings.
    #[must_use]
    pub const fn runtime_config(&self) -> RuntimeConfig {
        self.runtime
    }
}

fn seed_reference_data(config: &Config) -> InMemoryReferenceData {
    let reference = InMemoryReferenceData::new();
    for participant in &config.participants {
        reference.add_participant(&participant.name);
        let endpoints = &participant.endpoints;
        for (endpoint_type, url) in [
            (EndpointType::Quotes, &endpoints.quotes),
            (EndpointType::BulkQuotes, &endpoints.bulk_quotes),
            (EndpointType::FxQuotes, &endpoints.fx_quotes),
        ] {
            if let Some(url) = url {
                reference.add_endpoint(&participant.name, endpoint_type, url.as_str());
            }
        }
        for currency in &participant.currencies {
            reference.add_account(&participant.name, ParticipantAccount::position(currency.as_str()));
        }
    }
    reference
}

fn seed_proxies(config: &Config) -> InMemoryProxyCache {
    config
        .proxies
        .iter()
        .fold(InMemoryProxyCache::new(), |cache, mapping| {
            cache.with_mapping(&mapping.participant, &mapping.proxy)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dto::MessageEnvelope;
    use crate::application::ports::{EnumLookup, ReferenceDataPort};
    use crate::config::load_config_from_string;
    use crate::domain::quote::request::fixtures::quote_request_payload;
    use crate::infrastructure::http::RecordingCallbackClient;
    use serde_json::json;

    const YAML: &str = r"
hub:
  name: Hub
engine:
  workers: 2
  queue_capacity: 16
participants:
  - name: payerfsp
    currencies: [USD]
    endpoints:
      quotes: http://payerfsp.local
  - name: payeefsp
    currencies: [USD]
    endpoints:
      quotes: http://payeefsp.local
";

    #[tokio::test]
    async fn seeds_reference_data_from_config() {
        let config = load_config_from_string(YAML).unwrap();
        let container =
            Container::with_callback(&config, Arc::new(RecordingCallbackClient::new())).unwrap();

        let reference = container.reference_data();
        assert!(
            reference
                .lookup_id(EnumLookup::Participant, "payeefsp")
                .await
                .is_ok()
        );
        assert_eq!(
            reference
                .participant_endpoint("payerfsp", EndpointType::Quotes)
                .await
                .unwrap()
                .as_deref(),
            Some("http://payerfsp.local")
        );
        assert_eq!(
            container.runtime_config(),
            RuntimeConfig {
                workers: 2,
                queue_capacity: 16
            }
        );
    }

    #[tokio::test]
    async fn wired_dispatcher_forwards_quotes() {
        let config = load_config_from_string(YAML).unwrap();
        let client = Arc::new(RecordingCallbackClient::new());
        let container = Container::with_callback(&config, client.clone()).unwrap();

        let envelope: MessageEnvelope = serde_json::from_value(json!({
            "id": "env-1",
            "type": "quote",
            "content": {
                "headers": {"fspiop-source": "payerfsp", "fspiop-destination": "payeefsp"},
                "payload": quote_request_payload("q-1", "USD")
            },
            "metadata": {"event": {"type": "quote", "action": "post"}}
        }))
        .unwrap();

        let outcome = container.dispatcher().dispatch(envelope).await.unwrap();

        assert!(outcome.is_forwarded());
        assert_eq!(container.repository().quote_count(), 1);
        assert_eq!(client.requests()[0].url, "http://payeefsp.local/quotes");
    }

    #[test]
    fn missing_rules_file_fails_wiring() {
        let mut config = load_config_from_string(YAML).unwrap();
        config.engine.rules_path = Some("/nonexistent/rules.json".to_string());

        let result = Container::with_callback(&config, Arc::new(RecordingCallbackClient::new()));
        assert!(matches!(result, Err(ContainerError::Rules(_))));
    }
}
