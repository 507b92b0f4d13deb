//! Quotes Repository Port (Driven Port)
//!
//! Transactional persistence of quote, bulk-quote and fx-quote rows. Business
//! rows are only ever created; reads return a single row or `None`.

use async_trait::async_trait;

use crate::domain::bulk_quote::{BulkQuoteRecord, BulkQuoteResponseRecord};
use crate::domain::duplicate::{DuplicateCheckRecord, DuplicateKind};
use crate::domain::fx_quote::{FxQuoteRecord, FxQuoteResponseRecord};
use crate::domain::quote::{
    QuoteErrorRecord, QuoteExtensionRecord, QuotePartyRecord, QuoteRecord, QuoteResponseRecord,
    TransactionReferenceRecord,
};
use crate::error::{ErrorCode, QuoteError};

/// Persistence port error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
    /// Lookup found no row.
    #[error("{lookup} '{key}' not found")]
    NotFound {
        /// Lookup or table name.
        lookup: String,
        /// Key looked up.
        key: String,
    },

    /// A duplicate-check record for this id already exists.
    #[error("Duplicate check record already exists for {kind} {id}")]
    DuplicateRecord {
        /// Duplicate-check table.
        kind: DuplicateKind,
        /// Message id.
        id: String,
    },

    /// Another unique constraint was violated.
    #[error("Unique constraint violated on {entity}: {key}")]
    UniqueViolation {
        /// Table.
        entity: String,
        /// Conflicting key.
        key: String,
    },

    /// Storage failure.
    #[error("Storage error: {message}")]
    Storage {
        /// Error details.
        message: String,
    },
}

impl PersistenceError {
    /// Shorthand for a not-found error.
    #[must_use]
    pub fn not_found(lookup: &str, key: &str) -> Self {
        Self::NotFound {
            lookup: lookup.to_string(),
            key: key.to_string(),
        }
    }
}

impl From<PersistenceError> for QuoteError {
    fn from(error: PersistenceError) -> Self {
        match &error {
            PersistenceError::NotFound { lookup, key } => {
                Self::new(ErrorCode::IdNotFound, error.to_string())
                    .with_context("lookup", lookup.as_str())
                    .with_context("key", key.as_str())
            }
            _ => Self::internal(error.to_string()),
        }
    }
}

/// One open persistence transaction.
///
/// Writes become visible only after `commit`. Dropping or rolling back a
/// transaction discards every write made through it.
#[async_trait]
pub trait QuoteTransaction: Send {
    /// Create the transaction reference of a quote.
    async fn create_transaction_reference(
        &mut self,
        record: TransactionReferenceRecord,
    ) -> Result<(), PersistenceError>;

    /// Create a quote header row.
    async fn create_quote(&mut self, record: QuoteRecord) -> Result<(), PersistenceError>;

    /// Create a payer or payee row.
    async fn create_quote_party(&mut self, record: QuotePartyRecord)
    -> Result<(), PersistenceError>;

    /// Create extension rows.
    async fn create_quote_extensions(
        &mut self,
        records: Vec<QuoteExtensionRecord>,
    ) -> Result<(), PersistenceError>;

    /// Create a quote response row.
    async fn create_quote_response(
        &mut self,
        record: QuoteResponseRecord,
    ) -> Result<(), PersistenceError>;

    /// Record an error received for a known quote, bulk quote or fx quote.
    async fn create_quote_error(&mut self, record: QuoteErrorRecord)
    -> Result<(), PersistenceError>;

    /// Create a bulk quote header row.
    async fn create_bulk_quote(&mut self, record: BulkQuoteRecord) -> Result<(), PersistenceError>;

    /// Create a bulk quote response row.
    async fn create_bulk_quote_response(
        &mut self,
        record: BulkQuoteResponseRecord,
    ) -> Result<(), PersistenceError>;

    /// Create a conversion request with its terms and charges.
    async fn create_fx_quote(&mut self, record: FxQuoteRecord) -> Result<(), PersistenceError>;

    /// Create a conversion response.
    async fn create_fx_quote_response(
        &mut self,
        record: FxQuoteResponseRecord,
    ) -> Result<(), PersistenceError>;

    /// Create a duplicate-check record.
    ///
    /// Fails with [`PersistenceError::DuplicateRecord`] when one already
    /// exists for `(kind, id)`, here or at commit.
    async fn create_duplicate_check(
        &mut self,
        record: DuplicateCheckRecord,
    ) -> Result<(), PersistenceError>;

    /// Make every write visible atomically.
    async fn commit(self: Box<Self>) -> Result<(), PersistenceError>;

    /// Discard every write.
    async fn rollback(self: Box<Self>) -> Result<(), PersistenceError>;
}

/// Port for quote persistence.
#[async_trait]
pub trait QuotesRepository: Send + Sync {
    /// Open a new transaction.
    async fn begin(&self) -> Result<Box<dyn QuoteTransaction>, PersistenceError>;

    /// Committed duplicate-check record for `(kind, id)`.
    async fn get_duplicate_check(
        &self,
        kind: DuplicateKind,
        id: &str,
    ) -> Result<Option<DuplicateCheckRecord>, PersistenceError>;

    /// Quote header row.
    async fn get_quote(&self, quote_id: &str) -> Result<Option<QuoteRecord>, PersistenceError>;

    /// Payer and payee rows of a quote.
    async fn get_quote_parties(
        &self,
        quote_id: &str,
    ) -> Result<Vec<QuotePartyRecord>, PersistenceError>;

    /// Response row of a quote.
    async fn get_quote_response(
        &self,
        quote_id: &str,
    ) -> Result<Option<QuoteResponseRecord>, PersistenceError>;

    /// Bulk quote header row.
    async fn get_bulk_quote(
        &self,
        bulk_quote_id: &str,
    ) -> Result<Option<BulkQuoteRecord>, PersistenceError>;

    /// Conversion request row.
    async fn get_fx_quote(
        &self,
        conversion_request_id: &str,
    ) -> Result<Option<FxQuoteRecord>, PersistenceError>;
}
