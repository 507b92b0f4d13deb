//! Participant and proxy seed data for the in-memory reference store.

use serde::{Deserialize, Serialize};

/// One scheme participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantConfig {
    /// Participant (FSP) name.
    pub name: String,
    /// Currencies with an active position account.
    #[serde(default)]
    pub currencies: Vec<String>,
    /// Callback endpoints.
    #[serde(default)]
    pub endpoints: EndpointsConfig,
}

/// Callback endpoints of a participant.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EndpointsConfig {
    /// `FSPIOP_CALLBACK_URL_QUOTES`
    #[serde(default)]
    pub quotes: Option<String>,
    /// `FSPIOP_CALLBACK_URL_BULK_QUOTES`
    #[serde(default)]
    pub bulk_quotes: Option<String>,
    /// `FSPIOP_CALLBACK_URL_FX_QUOTES`
    #[serde(default)]
    pub fx_quotes: Option<String>,
}

/// Participant reached through a proxy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyMappingConfig {
    /// Participant outside the local scheme.
    pub participant: String,
    /// Local participant acting as its proxy.
    pub proxy: String,
}
