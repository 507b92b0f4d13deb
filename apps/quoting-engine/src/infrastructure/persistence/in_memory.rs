//! In-memory quotes repository.
//!
//! Transactions buffer their writes and apply them under one lock at
//! commit. Duplicate-check uniqueness is enforced both when a record is
//! created and again at commit, which is what arbitrates concurrent
//! writers of the same id.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::application::ports::{PersistenceError, QuoteTransaction, QuotesRepository};
use crate::domain::bulk_quote::{BulkQuoteRecord, BulkQuoteResponseRecord};
use crate::domain::duplicate::{DuplicateCheckRecord, DuplicateKind};
use crate::domain::fx_quote::{FxQuoteRecord, FxQuoteResponseRecord};
use crate::domain::quote::{
    QuoteErrorRecord, QuoteExtensionRecord, QuotePartyRecord, QuoteRecord, QuoteResponseRecord,
    TransactionReferenceRecord,
};

#[derive(Debug, Default)]
struct Store {
    transaction_references: Vec<TransactionReferenceRecord>,
    quotes: HashMap<String, QuoteRecord>,
    parties: Vec<QuotePartyRecord>,
    extensions: Vec<QuoteExtensionRecord>,
    responses: HashMap<String, QuoteResponseRecord>,
    errors: Vec<QuoteErrorRecord>,
    bulk_quotes: HashMap<String, BulkQuoteRecord>,
    bulk_quote_responses: HashMap<String, BulkQuoteResponseRecord>,
    fx_quotes: HashMap<String, FxQuoteRecord>,
    fx_quote_responses: HashMap<String, FxQuoteResponseRecord>,
    duplicate_checks: HashMap<(DuplicateKind, String), String>,
}

impl Store {
    /// First key in `pending` that already exists here.
    fn conflict_with(&self, pending: &Self) -> Option<PersistenceError> {
        if let Some((kind, id)) = pending
            .duplicate_checks
            .keys()
            .find(|key| self.duplicate_checks.contains_key(*key))
        {
            return Some(PersistenceError::DuplicateRecord {
                kind: *kind,
                id: id.clone(),
            });
        }

        first_shared("quote", &pending.quotes, &self.quotes)
            .or_else(|| first_shared("quote_response", &pending.responses, &self.responses))
            .or_else(|| first_shared("bulk_quote", &pending.bulk_quotes, &self.bulk_quotes))
            .or_else(|| first_shared("fx_quote", &pending.fx_quotes, &self.fx_quotes))
    }

    fn merge(&mut self, pending: Self) {
        self.transaction_references
            .extend(pending.transaction_references);
        self.quotes.extend(pending.quotes);
        self.parties.extend(pending.parties);
        self.extensions.extend(pending.extensions);
        self.responses.extend(pending.responses);
        self.errors.extend(pending.errors);
        self.bulk_quotes.extend(pending.bulk_quotes);
        self.bulk_quote_responses.extend(pending.bulk_quote_responses);
        self.fx_quotes.extend(pending.fx_quotes);
        self.fx_quote_responses.extend(pending.fx_quote_responses);
        self.duplicate_checks.extend(pending.duplicate_checks);
    }
}

fn first_shared<V>(
    entity: &str,
    pending: &HashMap<String, V>,
    committed: &HashMap<String, V>,
) -> Option<PersistenceError> {
    pending
        .keys()
        .find(|key| committed.contains_key(*key))
        .map(|key| PersistenceError::UniqueViolation {
            entity: entity.to_string(),
            key: key.clone(),
        })
}

#[derive(Debug, Default)]
struct Shared {
    store: Mutex<Store>,
    failures: Mutex<HashSet<String>>,
    commits: AtomicU64,
}

impl Shared {
    fn injected(&self, operation: &str) -> Result<(), PersistenceError> {
        if self.failures.lock().contains(operation) {
            return Err(PersistenceError::Storage {
                message: format!("injected failure in {operation}"),
            });
        }
        Ok(())
    }
}

/// In-memory implementation of [`QuotesRepository`].
///
/// Suitable for tests, local runs and simple routing deployments.
#[derive(Debug, Clone, Default)]
pub struct InMemoryQuotesRepository {
    shared: Arc<Shared>,
}

impl InMemoryQuotesRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `operation` (`begin`, `commit` or a `create_*` method name) fail
    /// with a storage error.
    pub fn fail_on(&self, operation: &str) {
        self.shared.failures.lock().insert(operation.to_string());
    }

    /// Store a committed duplicate-check record.
    pub fn seed_duplicate_check(&self, kind: DuplicateKind, id: &str, hash: &str) {
        self.shared
            .store
            .lock()
            .duplicate_checks
            .insert((kind, id.to_string()), hash.to_string());
    }

    /// Number of committed quotes.
    #[must_use]
    pub fn quote_count(&self) -> usize {
        self.shared.store.lock().quotes.len()
    }

    /// Committed party rows of a quote.
    #[must_use]
    pub fn parties_for(&self, quote_id: &str) -> Vec<QuotePartyRecord> {
        self.shared
            .store
            .lock()
            .parties
            .iter()
            .filter(|party| party.quote_id.as_str() == quote_id)
            .cloned()
            .collect()
    }

    /// Number of committed extension rows.
    #[must_use]
    pub fn extension_count(&self) -> usize {
        self.shared.store.lock().extensions.len()
    }

    /// Number of committed quote responses.
    #[must_use]
    pub fn response_count(&self) -> usize {
        self.shared.store.lock().responses.len()
    }

    /// Committed error records.
    #[must_use]
    pub fn error_records(&self) -> Vec<QuoteErrorRecord> {
        self.shared.store.lock().errors.clone()
    }

    /// Number of committed bulk quotes.
    #[must_use]
    pub fn bulk_quote_count(&self) -> usize {
        self.shared.store.lock().bulk_quotes.len()
    }

    /// Number of committed fx quotes.
    #[must_use]
    pub fn fx_quote_count(&self) -> usize {
        self.shared.store.lock().fx_quotes.len()
    }

    /// Number of committed duplicate-check records across all kinds.
    #[must_use]
    pub fn duplicate_check_count(&self) -> usize {
        self.shared.store.lock().duplicate_checks.len()
    }

    /// Number of successful commits.
    #[must_use]
    pub fn committed_transactions(&self) -> u64 {
        self.shared.commits.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl QuotesRepository for InMemoryQuotesRepository {
    async fn begin(&self) -> Result<Box<dyn QuoteTransaction>, PersistenceError> {
        self.shared.injected("begin")?;
        // Let concurrent invocations interleave the way a database round trip would.
        tokio::task::yield_now().await;
        Ok(Box::new(InMemoryTransaction {
            shared: self.shared.clone(),
            pending: Store::default(),
        }))
    }

    async fn get_duplicate_check(
        &self,
        kind: DuplicateKind,
        id: &str,
    ) -> Result<Option<DuplicateCheckRecord>, PersistenceError> {
        let store = self.shared.store.lock();
        Ok(store
            .duplicate_checks
            .get(&(kind, id.to_string()))
            .map(|hash| DuplicateCheckRecord {
                kind,
                id: id.to_string(),
                hash: hash.clone(),
            }))
    }

    async fn get_quote(&self, quote_id: &str) -> Result<Option<QuoteRecord>, PersistenceError> {
        Ok(self.shared.store.lock().quotes.get(quote_id).cloned())
    }

    async fn get_quote_parties(
        &self,
        quote_id: &str,
    ) -> Result<Vec<QuotePartyRecord>, PersistenceError> {
        Ok(self.parties_for(quote_id))
    }

    async fn get_quote_response(
        &self,
        quote_id: &str,
    ) -> Result<Option<QuoteResponseRecord>, PersistenceError> {
        Ok(self.shared.store.lock().responses.get(quote_id).cloned())
    }

    async fn get_bulk_quote(
        &self,
        bulk_quote_id: &str,
    ) -> Result<Option<BulkQuoteRecord>, PersistenceError> {
        Ok(self.shared.store.lock().bulk_quotes.get(bulk_quote_id).cloned())
    }

    async fn get_fx_quote(
        &self,
        conversion_request_id: &str,
    ) -> Result<Option<FxQuoteRecord>, PersistenceError> {
        Ok(self
            .shared
            .store
            .lock()
            .fx_quotes
            .get(conversion_request_id)
            .cloned())
    }
}

/// Buffered transaction over [`InMemoryQuotesRepository`].
struct InMemoryTransaction {
    shared: Arc<Shared>,
    pending: Store,
}

impl InMemoryTransaction {
    fn ensure_unique(
        &self,
        entity: &str,
        key: &str,
        exists: impl Fn(&Store) -> bool,
    ) -> Result<(), PersistenceError> {
        if exists(&self.pending) || exists(&self.shared.store.lock()) {
            return Err(PersistenceError::UniqueViolation {
                entity: entity.to_string(),
                key: key.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl QuoteTransaction for InMemoryTransaction {
    async fn create_transaction_reference(
        &mut self,
        record: TransactionReferenceRecord,
    ) -> Result<(), PersistenceError> {
        self.shared.injected("create_transaction_reference")?;
        self.pending.transaction_references.push(record);
        Ok(())
    }

    async fn create_quote(&mut self, record: QuoteRecord) -> Result<(), PersistenceError> {
        self.shared.injected("create_quote")?;
        let key = record.quote_id.as_str().to_string();
        self.ensure_unique("quote", &key, |store| store.quotes.contains_key(&key))?;
        self.pending.quotes.insert(key, record);
        Ok(())
    }

    async fn create_quote_party(
        &mut self,
        record: QuotePartyRecord,
    ) -> Result<(), PersistenceError> {
        self.shared.injected("create_quote_party")?;
        self.pending.parties.push(record);
        Ok(())
    }

    async fn create_quote_extensions(
        &mut self,
        records: Vec<QuoteExtensionRecord>,
    ) -> Result<(), PersistenceError> {
        self.shared.injected("create_quote_extensions")?;
        self.pending.extensions.extend(records);
        Ok(())
    }

    async fn create_quote_response(
        &mut self,
        record: QuoteResponseRecord,
    ) -> Result<(), PersistenceError> {
        self.shared.injected("create_quote_response")?;
        let key = record.quote_id.as_str().to_string();
        self.ensure_unique("quote_response", &key, |store| {
            store.responses.contains_key(&key)
        })?;
        self.pending.responses.insert(key, record);
        Ok(())
    }

    async fn create_quote_error(
        &mut self,
        record: QuoteErrorRecord,
    ) -> Result<(), PersistenceError> {
        self.shared.injected("create_quote_error")?;
        self.pending.errors.push(record);
        Ok(())
    }

    async fn create_bulk_quote(&mut self, record: BulkQuoteRecord) -> Result<(), PersistenceError> {
        self.shared.injected("create_bulk_quote")?;
        let key = record.bulk_quote_id.as_str().to_string();
        self.ensure_unique("bulk_quote", &key, |store| {
            store.bulk_quotes.contains_key(&key)
        })?;
        self.pending.bulk_quotes.insert(key, record);
        Ok(())
    }

    async fn create_bulk_quote_response(
        &mut self,
        record: BulkQuoteResponseRecord,
    ) -> Result<(), PersistenceError> {
        self.shared.injected("create_bulk_quote_response")?;
        self.pending
            .bulk_quote_responses
            .insert(record.bulk_quote_id.as_str().to_string(), record);
        Ok(())
    }

    async fn create_fx_quote(&mut self, record: FxQuoteRecord) -> Result<(), PersistenceError> {
        self.shared.injected("create_fx_quote")?;
        let key = record.conversion_request_id.as_str().to_string();
        self.ensure_unique("fx_quote", &key, |store| store.fx_quotes.contains_key(&key))?;
        self.pending.fx_quotes.insert(key, record);
        Ok(())
    }

    async fn create_fx_quote_response(
        &mut self,
        record: FxQuoteResponseRecord,
    ) -> Result<(), PersistenceError> {
        self.shared.injected("create_fx_quote_response")?;
        self.pending
            .fx_quote_responses
            .insert(record.conversion_request_id.as_str().to_string(), record);
        Ok(())
    }

    async fn create_duplicate_check(
        &mut self,
        record: DuplicateCheckRecord,
    ) -> Result<(), PersistenceError> {
        self.shared.injected("create_duplicate_check")?;
        let key = (record.kind, record.id.clone());
        if self.pending.duplicate_checks.contains_key(&key)
            || self.shared.store.lock().duplicate_checks.contains_key(&key)
        {
            return Err(PersistenceError::DuplicateRecord {
                kind: record.kind,
                id: record.id,
            });
        }
        self.pending.duplicate_checks.insert(key, record.hash);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), PersistenceError> {
        let Self { shared, pending } = *self;
        shared.injected("commit")?;
        let mut store = shared.store.lock();
        if let Some(conflict) = store.conflict_with(&pending) {
            return Err(conflict);
        }
        store.merge(pending);
        shared.commits.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), PersistenceError> {
        Ok(())
    }
}
