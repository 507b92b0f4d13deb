//! Duplicate Detector
//!
//! Classifies an inbound request or response as new, an identical resend or
//! a conflicting reuse of an id.

use std::sync::Arc;

use serde_json::Value;

use crate::application::ports::QuotesRepository;
use crate::domain::duplicate::{DuplicateCheckResult, DuplicateKind, payload_hash};
use crate::error::QuoteError;

/// Hash-based idempotency check over the duplicate-check tables.
pub struct DuplicateDetector {
    repository: Arc<dyn QuotesRepository>,
}

impl DuplicateDetector {
    /// Create a detector over `repository`.
    #[must_use]
    pub fn new(repository: Arc<dyn QuotesRepository>) -> Self {
        Self { repository }
    }

    /// Check a payload against the stored record for `(kind, id)`.
    ///
    /// # Errors
    ///
    /// `ModifiedRequest` when a record exists with a different hash; an
    /// internal error when the lookup fails.
    pub async fn check(
        &self,
        kind: DuplicateKind,
        id: &str,
        payload: &Value,
    ) -> Result<DuplicateCheckResult, QuoteError> {
        let hash = payload_hash(payload);
        let existing = self.repository.get_duplicate_check(kind, id).await?;

        match existing {
            None => Ok(DuplicateCheckResult::new_message(hash)),
            Some(record) if record.hash == hash => {
                tracing::info!(kind = %kind, id, "resend of a known message");
                Ok(DuplicateCheckResult::resend(hash))
            }
            Some(_) => {
                tracing::warn!(kind = %kind, id, "id reused with a different payload");
                Err(QuoteError::conflict(id))
            }
        }
    }

    /// Check a request payload.
    ///
    /// # Errors
    ///
    /// See [`DuplicateDetector::check`].
    pub async fn check_request(
        &self,
        kind: DuplicateKind,
        id: &str,
        payload: &Value,
    ) -> Result<DuplicateCheckResult, QuoteError> {
        debug_assert!(matches!(
            kind,
            DuplicateKind::QuoteRequest
                | DuplicateKind::BulkQuoteRequest
                | DuplicateKind::FxQuoteRequest
        ));
        self.check(kind, id, payload).await
    }

    /// Check a response payload.
    ///
    /// # Errors
    ///
    /// See [`DuplicateDetector::check`].
    pub async fn check_response(
        &self,
        kind: DuplicateKind,
        id: &str,
        payload: &Value,
    ) -> Result<DuplicateCheckResult, QuoteError> {
        debug_assert!(matches!(
            kind,
            DuplicateKind::QuoteResponse
                | DuplicateKind::BulkQuoteResponse
                | DuplicateKind::FxQuoteResponse
        ));
        self.check(kind, id, payload).await
    }

    /// Re-read the record that won a concurrent insert.
    ///
    /// # Errors
    ///
    /// `ModifiedRequest` when the winner's hash differs from `hash`.
    pub async fn resolve_lost_race(
        &self,
        kind: DuplicateKind,
        id: &str,
        hash: &str,
    ) -> Result<DuplicateCheckResult, QuoteError> {
        match self.repository.get_duplicate_check(kind, id).await? {
            Some(record) if record.hash == hash => {
                tracing::info!(kind = %kind, id, "lost insert race to an identical message");
                Ok(DuplicateCheckResult::resend(hash.to_string()))
            }
            Some(_) => Err(QuoteError::conflict(id)),
            None => Err(QuoteError::internal(format!(
                "duplicate check record for {kind} {id} reported but not found"
            ))),
        }
    }
}
