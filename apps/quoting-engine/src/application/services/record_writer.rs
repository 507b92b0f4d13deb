//! Record Writer
//!
//! Writes the rows of one inbound message in a single transaction. The
//! duplicate-check record is written last so that losing a concurrent insert
//! race leaves nothing behind.

use std::sync::Arc;

use crate::application::ports::{PersistenceError, QuoteTransaction, QuotesRepository};
use crate::domain::bulk_quote::{BulkQuoteRecord, BulkQuoteResponseRecord};
use crate::domain::duplicate::DuplicateCheckRecord;
use crate::domain::fx_quote::{FxQuoteRecord, FxQuoteResponseRecord};
use crate::domain::quote::{
    QuoteErrorRecord, QuoteExtensionRecord, QuotePartyRecord, QuoteRecord, QuoteResponseRecord,
    TransactionReferenceRecord,
};
use crate::error::QuoteError;

/// One row to create.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingWrite {
    /// Transaction reference.
    TransactionReference(TransactionReferenceRecord),
    /// Quote header.
    Quote(QuoteRecord),
    /// Payer or payee.
    QuoteParty(QuotePartyRecord),
    /// Extensions.
    QuoteExtensions(Vec<QuoteExtensionRecord>),
    /// Quote response.
    QuoteResponse(QuoteResponseRecord),
    /// Error received for a known resource.
    QuoteError(QuoteErrorRecord),
    /// Bulk quote header.
    BulkQuote(BulkQuoteRecord),
    /// Bulk quote response.
    BulkQuoteResponse(BulkQuoteResponseRecord),
    /// Conversion request.
    FxQuote(FxQuoteRecord),
    /// Conversion response.
    FxQuoteResponse(FxQuoteResponseRecord),
}

impl PendingWrite {
    async fn apply(self, tx: &mut dyn QuoteTransaction) -> Result<(), PersistenceError> {
        match self {
            Self::TransactionReference(record) => tx.create_transaction_reference(record).await,
            Self::Quote(record) => tx.create_quote(record).await,
            Self::QuoteParty(record) => tx.create_quote_party(record).await,
            Self::QuoteExtensions(records) if records.is_empty() => Ok(()),
            Self::QuoteExtensions(records) => tx.create_quote_extensions(records).await,
            Self::QuoteResponse(record) => tx.create_quote_response(record).await,
            Self::QuoteError(record) => tx.create_quote_error(record).await,
            Self::BulkQuote(record) => tx.create_bulk_quote(record).await,
            Self::BulkQuoteResponse(record) => tx.create_bulk_quote_response(record).await,
            Self::FxQuote(record) => tx.create_fx_quote(record).await,
            Self::FxQuoteResponse(record) => tx.create_fx_quote_response(record).await,
        }
    }
}

/// Result of a committed or abandoned write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Every row is visible.
    Committed,
    /// Another writer stored the duplicate-check record first; nothing was
    /// written.
    LostRace,
}

/// Transactional writer over a [`QuotesRepository`].
pub struct RecordWriter {
    repository: Arc<dyn QuotesRepository>,
}

impl RecordWriter {
    /// Create a writer.
    #[must_use]
    pub fn new(repository: Arc<dyn QuotesRepository>) -> Self {
        Self { repository }
    }

    /// Write `writes` and the optional duplicate-check record atomically.
    ///
    /// # Errors
    ///
    /// Internal error for any storage failure; the transaction is rolled
    /// back first.
    pub async fn write(
        &self,
        writes: Vec<PendingWrite>,
        duplicate_check: Option<DuplicateCheckRecord>,
    ) -> Result<WriteOutcome, QuoteError> {
        let mut tx = self.repository.begin().await.map_err(storage_failure)?;

        if let Err(e) = apply_all(tx.as_mut(), writes, duplicate_check).await {
            if let Err(rollback) = tx.rollback().await {
                tracing::error!(error = %rollback, "rollback failed");
            }
            return match e {
                PersistenceError::DuplicateRecord { kind, id } => {
                    tracing::info!(kind = %kind, id = %id, "duplicate check insert lost a race");
                    Ok(WriteOutcome::LostRace)
                }
                other => Err(storage_failure(other)),
            };
        }

        match tx.commit().await {
            Ok(()) => Ok(WriteOutcome::Committed),
            Err(PersistenceError::DuplicateRecord { kind, id }) => {
                tracing::info!(kind = %kind, id = %id, "duplicate check commit lost a race");
                Ok(WriteOutcome::LostRace)
            }
            Err(e) => Err(storage_failure(e)),
        }
    }
}

async fn apply_all(
    tx: &mut dyn QuoteTransaction,
    writes: Vec<PendingWrite>,
    duplicate_check: Option<DuplicateCheckRecord>,
) -> Result<(), PersistenceError> {
    for write in writes {
        write.apply(tx).await?;
    }
    if let Some(record) = duplicate_check {
        tx.create_duplicate_check(record).await?;
    }
    Ok(())
}

fn storage_failure(error: PersistenceError) -> QuoteError {
    tracing::error!(error = %error, "persistence failed");
    QuoteError::internal(format!("failed to persist records: {error}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::duplicate::DuplicateKind;
    use crate::domain::shared::{QuoteId, ResourceType, TransactionId};
    use crate::error::ErrorKind;
    use crate::infrastructure::persistence::InMemoryQuotesRepository;
    use chrono::Utc;

    fn reference(quote_id: &str) -> PendingWrite {
        PendingWrite::TransactionReference(TransactionReferenceRecord {
            transaction_reference_id: TransactionId::new(format!("tx-{quote_id}")),
            quote_id: QuoteId::new(quote_id),
            created_at: Utc::now(),
        })
    }

    fn error_record(id: &str) -> PendingWrite {
        PendingWrite::QuoteError(QuoteErrorRecord {
            resource: ResourceType::Quote,
            id: id.to_string(),
            error_code: "5100".to_string(),
            error_description: "Payee error".to_string(),
            created_at: Utc::now(),
        })
    }

    fn dup(id: &str, hash: &str) -> DuplicateCheckRecord {
        DuplicateCheckRecord {
            kind: DuplicateKind::QuoteRequest,
            id: id.to_string(),
            hash: hash.to_string(),
        }
    }

    #[tokio::test]
    async fn commits_all_rows() {
        let repository = Arc::new(InMemoryQuotesRepository::new());
        let writer = RecordWriter::new(repository.clone());

        let outcome = writer
            .write(vec![reference("q-1"), error_record("q-1")], Some(dup("q-1", "h1")))
            .await
            .unwrap();

        assert_eq!(outcome, WriteOutcome::Committed);
        assert_eq!(repository.error_records().len(), 1);
        assert_eq!(repository.duplicate_check_count(), 1);
    }

    #[tokio::test]
    async fn failure_rolls_back_everything() {
        let repository = Arc::new(InMemoryQuotesRepository::new());
        repository.fail_on("create_quote_error");
        let writer = RecordWriter::new(repository.clone());

        let err = writer
            .write(vec![reference("q-1"), error_record("q-1")], Some(dup("q-1", "h1")))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.code().fspiop_code(), "2001");
        assert_eq!(repository.duplicate_check_count(), 0);
        assert!(repository.error_records().is_empty());
    }

    #[tokio::test]
    async fn existing_duplicate_check_is_lost_race() {
        let repository = Arc::new(InMemoryQuotesRepository::new());
        repository.seed_duplicate_check(DuplicateKind::QuoteRequest, "q-1", "h1");
        let writer = RecordWriter::new(repository.clone());

        let outcome = writer
            .write(vec![error_record("q-1")], Some(dup("q-1", "h1")))
            .await
            .unwrap();

        assert_eq!(outcome, WriteOutcome::LostRace);
        assert!(repository.error_records().is_empty());
    }
}
