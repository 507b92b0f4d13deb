//! Persisted quote rows.
//!
//! Rows are written once, inside one transaction, and never updated by the
//! engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::shared::{
    FspId, GeoCode, Money, QuoteId, QuoteResponseId, ResourceType, TransactionId,
};

/// Role of a party in a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PartyRole {
    /// Sending party.
    Payer,
    /// Receiving party.
    Payee,
}

impl PartyRole {
    /// Party-type reference name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Payer => "PAYER",
            Self::Payee => "PAYEE",
        }
    }

    /// Transfer-participant role-type reference name.
    #[must_use]
    pub const fn participant_role(&self) -> &'static str {
        match self {
            Self::Payer => "PAYER_DFSP",
            Self::Payee => "PAYEE_DFSP",
        }
    }
}

/// Transaction reference linking a quote to its transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReferenceRecord {
    /// Transaction id.
    pub transaction_reference_id: TransactionId,
    /// Quote id.
    pub quote_id: QuoteId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Quote header row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRecord {
    /// Quote id.
    pub quote_id: QuoteId,
    /// Transaction reference.
    pub transaction_reference_id: TransactionId,
    /// Originating transaction request.
    pub transaction_request_id: Option<String>,
    /// Memo.
    pub note: Option<String>,
    /// Request expiry.
    pub expiration: Option<DateTime<Utc>>,
    /// Initiator reference id.
    pub transaction_initiator_id: i64,
    /// Initiator-type reference id.
    pub transaction_initiator_type_id: i64,
    /// Scenario reference id.
    pub transaction_scenario_id: i64,
    /// Sub-scenario, stored verbatim.
    pub transaction_sub_scenario: Option<String>,
    /// Balance-of-payments code.
    pub balance_of_payments: Option<String>,
    /// Amount-type reference id.
    pub amount_type_id: i64,
    /// Quoted amount.
    pub amount: Money,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Personal details stored alongside a party row.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PartyPersonalInfoRecord {
    /// First name.
    pub first_name: Option<String>,
    /// Middle name.
    pub middle_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// Date of birth.
    pub date_of_birth: Option<String>,
}

/// Payer or payee row of a quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotePartyRecord {
    /// Quote id.
    pub quote_id: QuoteId,
    /// Role in the quote.
    pub role: PartyRole,
    /// Party-type reference id.
    pub party_type_id: i64,
    /// Identifier-type reference id.
    pub party_identifier_type_id: i64,
    /// Identifier value.
    pub party_identifier_value: String,
    /// Sub-id or type.
    pub party_sub_id_or_type: Option<String>,
    /// FSP name as declared in the message.
    pub fsp_id: FspId,
    /// Participant id; the proxy's id for non-local FSPs.
    pub participant_id: i64,
    /// Transfer-participant role-type reference id.
    pub transfer_participant_role_type_id: i64,
    /// Ledger-entry-type reference id.
    pub ledger_entry_type_id: i64,
    /// Signed amount: positive for the payer, negative for the payee.
    pub amount: Money,
    /// Merchant classification code.
    pub merchant_classification_code: Option<String>,
    /// Personal details, when supplied.
    pub personal_info: Option<PartyPersonalInfoRecord>,
}

/// Extension row of a quote or quote response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteExtensionRecord {
    /// Quote id.
    pub quote_id: QuoteId,
    /// Response the extension belongs to, if any.
    pub quote_response_id: Option<QuoteResponseId>,
    /// Key.
    pub key: String,
    /// Value.
    pub value: String,
}

/// Quote response row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteResponseRecord {
    /// Generated response id.
    pub quote_response_id: QuoteResponseId,
    /// Quote id.
    pub quote_id: QuoteId,
    /// Transfer amount.
    pub transfer_amount: Money,
    /// Payee receive amount.
    pub payee_receive_amount: Option<Money>,
    /// Payee FSP fee.
    pub payee_fsp_fee: Option<Money>,
    /// Payee FSP commission.
    pub payee_fsp_commission: Option<Money>,
    /// ILP condition.
    pub ilp_condition: String,
    /// ILP packet.
    pub ilp_packet: String,
    /// Quote validity.
    pub expiration: DateTime<Utc>,
    /// Payee location.
    pub geo_code: Option<GeoCode>,
    /// Whether the response was accepted as valid.
    pub is_valid: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Error received for a known quote, bulk quote or fx quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteErrorRecord {
    /// Resource family.
    pub resource: ResourceType,
    /// Id of the quote, bulk quote or conversion request.
    pub id: String,
    /// FSPIOP error code.
    pub error_code: String,
    /// Error description.
    pub error_description: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}
