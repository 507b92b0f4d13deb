//! In-memory reference data.
//!
//! Enum tables come pre-seeded with the scheme's standard names.
//! Participants, endpoints and accounts are registered by the caller.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::application::ports::{
    EnumLookup, ParticipantAccount, PersistenceError, ReferenceDataPort,
};
use crate::domain::shared::EndpointType;

const SEED: &[(EnumLookup, &[&str])] = &[
    (EnumLookup::PartyType, &["PAYER", "PAYEE"]),
    (
        EnumLookup::PartyIdentifierType,
        &[
            "MSISDN",
            "PERSONAL_ID",
            "BUSINESS",
            "DEVICE",
            "ACCOUNT_ID",
            "IBAN",
            "ALIAS",
            "EMAIL",
        ],
    ),
    (
        EnumLookup::TransferParticipantRoleType,
        &["PAYER_DFSP", "PAYEE_DFSP"],
    ),
    (
        EnumLookup::LedgerEntryType,
        &["PRINCIPLE_VALUE", "INTERCHANGE_FEE", "HUB_FEE"],
    ),
    (EnumLookup::AmountType, &["SEND", "RECEIVE"]),
    (EnumLookup::TransactionInitiator, &["PAYER", "PAYEE"]),
    (
        EnumLookup::TransactionInitiatorType,
        &["CONSUMER", "AGENT", "BUSINESS", "DEVICE"],
    ),
    (
        EnumLookup::TransactionScenario,
        &["DEPOSIT", "WITHDRAWAL", "TRANSFER", "PAYMENT", "REFUND"],
    ),
];

#[derive(Debug, Clone)]
struct Endpoint {
    url: String,
    is_active: bool,
}

#[derive(Debug, Default)]
struct Tables {
    enums: HashMap<(EnumLookup, String), i64>,
    endpoints: HashMap<(String, EndpointType), Endpoint>,
    accounts: HashMap<String, Vec<ParticipantAccount>>,
    next_participant_id: i64,
}

/// In-memory implementation of [`ReferenceDataPort`].
#[derive(Debug)]
pub struct InMemoryReferenceData {
    tables: RwLock<Tables>,
    lookups: AtomicU64,
}

impl Default for InMemoryReferenceData {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryReferenceData {
    /// Create reference data with the standard enum tables and no participants.
    #[must_use]
    pub fn new() -> Self {
        let mut tables = Tables {
            next_participant_id: 1,
            ..Tables::default()
        };
        for (lookup, names) in SEED {
            for (id, name) in (1_i64..).zip(names.iter()) {
                tables.enums.insert((*lookup, (*name).to_string()), id);
            }
        }
        Self {
            tables: RwLock::new(tables),
            lookups: AtomicU64::new(0),
        }
    }

    /// Register a participant and return its id. Registering twice keeps the
    /// first id.
    pub fn add_participant(&self, name: &str) -> i64 {
        let mut tables = self.tables.write();
        let key = (EnumLookup::Participant, name.to_string());
        if let Some(id) = tables.enums.get(&key) {
            return *id;
        }
        let id = tables.next_participant_id;
        tables.next_participant_id += 1;
        tables.enums.insert(key, id);
        tables.accounts.entry(name.to_string()).or_default();
        id
    }

    /// Set the active callback endpoint of a participant.
    pub fn add_endpoint(&self, participant: &str, endpoint_type: EndpointType, url: impl Into<String>) {
        self.tables.write().endpoints.insert(
            (participant.to_string(), endpoint_type),
            Endpoint {
                url: url.into(),
                is_active: true,
            },
        );
    }

    /// Mark an endpoint inactive.
    pub fn deactivate_endpoint(&self, participant: &str, endpoint_type: EndpointType) {
        if let Some(endpoint) = self
            .tables
            .write()
            .endpoints
            .get_mut(&(participant.to_string(), endpoint_type))
        {
            endpoint.is_active = false;
        }
    }

    /// Add a ledger account to a registered participant.
    pub fn add_account(&self, participant: &str, account: ParticipantAccount) {
        self.tables
            .write()
            .accounts
            .entry(participant.to_string())
            .or_default()
            .push(account);
    }

    /// Number of port calls served so far.
    #[must_use]
    pub fn lookup_count(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }

    fn count(&self) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
    }
}

#[async_trait]
impl ReferenceDataPort for InMemoryReferenceData {
    async fn lookup_id(&self, lookup: EnumLookup, name: &str) -> Result<i64, PersistenceError> {
        self.count();
        self.tables
            .read()
            .enums
            .get(&(lookup, name.to_string()))
            .copied()
            .ok_or_else(|| PersistenceError::not_found(lookup.as_str(), name))
    }

    async fn participant_endpoint(
        &self,
        participant: &str,
        endpoint_type: EndpointType,
    ) -> Result<Option<String>, PersistenceError> {
        self.count();
        Ok(self
            .tables
            .read()
            .endpoints
            .get(&(participant.to_string(), endpoint_type))
            .filter(|endpoint| endpoint.is_active)
            .map(|endpoint| endpoint.url.clone()))
    }

    async fn participant_accounts(
        &self,
        participant: &str,
    ) -> Result<Vec<ParticipantAccount>, PersistenceError> {
        self.count();
        self.tables
            .read()
            .accounts
            .get(participant)
            .cloned()
            .ok_or_else(|| PersistenceError::not_found("participant", participant))
    }
}
