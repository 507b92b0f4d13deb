//! Reference Data Port (Driven Port)
//!
//! Enum lookups, participant endpoints and participant accounts. Values
//! change rarely, which is what makes them safe to cache.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::PersistenceError;
use crate::domain::shared::EndpointType;

/// Reference tables the engine resolves names against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumLookup {
    /// Quote party type (`PAYER`, `PAYEE`).
    PartyType,
    /// Party identifier type (`MSISDN`, ...).
    PartyIdentifierType,
    /// Participant by name.
    Participant,
    /// Transfer participant role type (`PAYER_DFSP`, ...).
    TransferParticipantRoleType,
    /// Ledger entry type (`PRINCIPLE_VALUE`, ...).
    LedgerEntryType,
    /// Amount type (`SEND`, `RECEIVE`).
    AmountType,
    /// Transaction initiator (`PAYER`, `PAYEE`).
    TransactionInitiator,
    /// Transaction initiator type (`CONSUMER`, ...).
    TransactionInitiatorType,
    /// Transaction scenario (`TRANSFER`, ...).
    TransactionScenario,
}

impl EnumLookup {
    /// Lookup name, used as the cache key prefix and in errors.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PartyType => "partyType",
            Self::PartyIdentifierType => "partyIdentifierType",
            Self::Participant => "participant",
            Self::TransferParticipantRoleType => "transferParticipantRoleType",
            Self::LedgerEntryType => "ledgerEntryType",
            Self::AmountType => "amountType",
            Self::TransactionInitiator => "transactionInitiator",
            Self::TransactionInitiatorType => "transactionInitiatorType",
            Self::TransactionScenario => "transactionScenario",
        }
    }
}

impl fmt::Display for EnumLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ledger account held by a participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantAccount {
    /// Account type, e.g. `POSITION`.
    pub ledger_account_type: String,
    /// Currency.
    pub currency: String,
    /// Whether the account is active.
    pub is_active: bool,
}

impl ParticipantAccount {
    /// Active position account in a currency.
    #[must_use]
    pub fn position(currency: impl Into<String>) -> Self {
        Self {
            ledger_account_type: POSITION_ACCOUNT.to_string(),
            currency: currency.into(),
            is_active: true,
        }
    }

    /// Returns true if this is an active position account in `currency`.
    #[must_use]
    pub fn is_active_position_in(&self, currency: &str) -> bool {
        self.is_active && self.ledger_account_type == POSITION_ACCOUNT && self.currency == currency
    }
}

/// Ledger account type that makes a participant able to transact.
pub const POSITION_ACCOUNT: &str = "POSITION";

/// Ledger entry type stored on quote party rows.
pub const PRINCIPLE_VALUE: &str = "PRINCIPLE_VALUE";

/// Port for reference data.
#[async_trait]
pub trait ReferenceDataPort: Send + Sync {
    /// Id of `name` in the `lookup` table, or `NotFound`.
    async fn lookup_id(&self, lookup: EnumLookup, name: &str) -> Result<i64, PersistenceError>;

    /// Active callback endpoint of a participant.
    async fn participant_endpoint(
        &self,
        participant: &str,
        endpoint_type: EndpointType,
    ) -> Result<Option<String>, PersistenceError>;

    /// Ledger accounts of a participant.
    async fn participant_accounts(
        &self,
        participant: &str,
    ) -> Result<Vec<ParticipantAccount>, PersistenceError>;
}
