//! Hub identity and signing configuration.

use serde::{Deserialize, Serialize};

/// Hub configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    /// Name the hub uses as `fspiop-source` on messages it originates.
    #[serde(default = "default_hub_name")]
    pub name: String,
    /// Sign hub-originated messages.
    #[serde(default)]
    pub signing_enabled: bool,
    /// Shared secret for the keyed digest signer. Signing is skipped when empty.
    #[serde(default, skip_serializing)]
    pub signing_key: String,
    /// API version used in outbound content types.
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            name: default_hub_name(),
            signing_enabled: false,
            signing_key: String::new(),
            api_version: default_api_version(),
        }
    }
}

fn default_hub_name() -> String {
    "Hub".to_string()
}

fn default_api_version() -> String {
    "1.0".to_string()
}
