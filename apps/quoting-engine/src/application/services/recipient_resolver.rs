//! Recipient Resolver
//!
//! Finds the callback endpoint for a participant. A participant registered
//! with the hub is reached directly; one that is not may be represented by a
//! proxy, in which case the proxy's endpoint is used while the message keeps
//! addressing the original participant.

use std::sync::Arc;

use crate::application::ports::{EnumLookup, PersistenceError, ProxyCachePort, ReferenceDataPort};
use crate::domain::shared::EndpointType;
use crate::error::QuoteError;

/// Resolved next hop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRecipient {
    /// Endpoint base URL.
    pub url: String,
    /// Participant the message is addressed to.
    pub destination: String,
    /// Proxy whose endpoint was used, if any.
    pub proxy: Option<String>,
}

impl ResolvedRecipient {
    /// Returns true if the endpoint belongs to a proxy.
    #[must_use]
    pub const fn is_proxied(&self) -> bool {
        self.proxy.is_some()
    }
}

/// Where a participant lives relative to this hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParticipantLocation {
    /// Registered with this hub.
    Local {
        /// Participant id.
        participant_id: i64,
    },
    /// Reached through a registered proxy.
    Proxied {
        /// Proxy name.
        proxy: String,
        /// The proxy's participant id.
        participant_id: i64,
    },
    /// Neither registered nor proxied.
    Unknown,
}

impl ParticipantLocation {
    /// Participant id to store on rows; the proxy's for proxied parties.
    #[must_use]
    pub const fn participant_id(&self) -> Option<i64> {
        match self {
            Self::Local { participant_id } | Self::Proxied { participant_id, .. } => {
                Some(*participant_id)
            }
            Self::Unknown => None,
        }
    }

    /// Returns true if the participant is registered with this hub.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(self, Self::Local { .. })
    }
}

/// Two-tier endpoint resolution.
pub struct RecipientResolver {
    reference_data: Arc<dyn ReferenceDataPort>,
    proxy_cache: Option<Arc<dyn ProxyCachePort>>,
}

impl RecipientResolver {
    /// Create a resolver. Without a proxy cache only direct endpoints resolve.
    #[must_use]
    pub fn new(
        reference_data: Arc<dyn ReferenceDataPort>,
        proxy_cache: Option<Arc<dyn ProxyCachePort>>,
    ) -> Self {
        Self {
            reference_data,
            proxy_cache,
        }
    }

    /// Resolve the endpoint of `participant` for `endpoint_type`.
    ///
    /// # Errors
    ///
    /// `DestinationFspError` carrying the participant and message id when
    /// neither a direct nor a proxy endpoint exists.
    pub async fn resolve(
        &self,
        participant: &str,
        endpoint_type: EndpointType,
        message_id: &str,
    ) -> Result<ResolvedRecipient, QuoteError> {
        if let Some(url) = self
            .reference_data
            .participant_endpoint(participant, endpoint_type)
            .await?
        {
            tracing::debug!(participant, %endpoint_type, url = %url, "resolved direct endpoint");
            return Ok(ResolvedRecipient {
                url,
                destination: participant.to_string(),
                proxy: None,
            });
        }

        if let Some(proxy) = self.proxy_for(participant).await? {
            if let Some(url) = self
                .reference_data
                .participant_endpoint(&proxy, endpoint_type)
                .await?
            {
                tracing::debug!(
                    participant,
                    proxy = %proxy,
                    %endpoint_type,
                    url = %url,
                    "resolved endpoint through proxy"
                );
                return Ok(ResolvedRecipient {
                    url,
                    destination: participant.to_string(),
                    proxy: Some(proxy),
                });
            }
        }

        tracing::warn!(participant, %endpoint_type, message_id, "no callback endpoint found");
        Err(QuoteError::no_endpoint(participant, message_id))
    }

    /// Classify `participant` as local, proxied or unknown.
    ///
    /// # Errors
    ///
    /// Internal error when a lookup fails for a reason other than not-found.
    pub async fn locate(&self, participant: &str) -> Result<ParticipantLocation, QuoteError> {
        match self
            .reference_data
            .lookup_id(EnumLookup::Participant, participant)
            .await
        {
            Ok(participant_id) => return Ok(ParticipantLocation::Local { participant_id }),
            Err(PersistenceError::NotFound { .. }) => {}
            Err(e) => return Err(e.into()),
        }

        let Some(proxy) = self.proxy_for(participant).await? else {
            return Ok(ParticipantLocation::Unknown);
        };

        match self
            .reference_data
            .lookup_id(EnumLookup::Participant, &proxy)
            .await
        {
            Ok(participant_id) => Ok(ParticipantLocation::Proxied {
                proxy,
                participant_id,
            }),
            Err(PersistenceError::NotFound { .. }) => {
                tracing::warn!(participant, proxy = %proxy, "proxy mapping points at an unregistered proxy");
                Ok(ParticipantLocation::Unknown)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn proxy_for(&self, participant: &str) -> Result<Option<String>, QuoteError> {
        match &self.proxy_cache {
            Some(cache) => Ok(cache.get_mapping(participant).await?),
            None => Ok(None),
        }
    }
}
