//! Party and transaction value objects shared by quotes and bulk quotes.

use serde::{Deserialize, Serialize};

use super::identifiers::FspId;

/// Identification of a party within an FSP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyIdInfo {
    /// Identifier type, e.g. `MSISDN`.
    pub party_id_type: String,
    /// Identifier value.
    pub party_identifier: String,
    /// Optional sub-id or type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party_sub_id_or_type: Option<String>,
    /// FSP the party belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fsp_id: Option<FspId>,
    /// Optional extensions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension_list: Option<ExtensionList>,
}

/// Structured party name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexName {
    /// First name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Middle name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    /// Last name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

/// Personal information about a party.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    /// Name parts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complex_name: Option<ComplexName>,
    /// Date of birth, `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
}

/// A payer or payee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    /// Party identification.
    pub party_id_info: PartyIdInfo,
    /// Merchant classification code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_classification_code: Option<String>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Personal information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_info: Option<PersonalInfo>,
    /// Currencies the party can transact in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_currencies: Option<Vec<String>>,
}

impl Party {
    /// FSP the party belongs to.
    #[must_use]
    pub fn fsp(&self) -> Option<&FspId> {
        self.party_id_info.fsp_id.as_ref()
    }
}

/// Whether the amount is what the payer sends or what the payee receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AmountType {
    /// Amount the payer sends.
    Send,
    /// Amount the payee receives.
    Receive,
}

impl AmountType {
    /// Reference-data name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Send => "SEND",
            Self::Receive => "RECEIVE",
        }
    }
}

/// Who initiated the transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Initiator {
    /// Payer-initiated.
    Payer,
    /// Payee-initiated.
    Payee,
}

impl Initiator {
    /// Reference-data name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Payer => "PAYER",
            Self::Payee => "PAYEE",
        }
    }
}

/// Transaction type of a quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionType {
    /// Scenario, e.g. `TRANSFER`.
    pub scenario: String,
    /// Optional sub-scenario.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_scenario: Option<String>,
    /// Initiating side.
    pub initiator: Initiator,
    /// Initiator type, e.g. `CONSUMER`.
    pub initiator_type: String,
    /// Refund information, relayed untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refund_info: Option<serde_json::Value>,
    /// Balance-of-payments code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance_of_payments: Option<String>,
}

/// Geographic location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoCode {
    /// Latitude.
    pub latitude: String,
    /// Longitude.
    pub longitude: String,
}

/// Key/value extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    /// Key.
    pub key: String,
    /// Value.
    pub value: String,
}

/// Ordered extension list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExtensionList {
    /// Extensions in wire order.
    #[serde(default)]
    pub extension: Vec<Extension>,
}
