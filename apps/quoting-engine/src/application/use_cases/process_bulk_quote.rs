//! Bulk Quote Processor
//!
//! Bulk quotes carry no business rules. Requests go to the FSP named by the
//! destination header; responses go back to the payer FSP of the stored
//! bulk quote.

use chrono::Utc;

use super::common::{
    declared_destination, decode_error_body, forward_to, log_only, persist_error, reject,
    relay_error, relay_get, write_once,
};
use super::context::EngineContext;
use crate::application::dto::{InboundMessage, ProcessOutcome};
use crate::application::ports::HttpMethod;
use crate::application::services::{CallbackPath, PendingWrite};
use crate::domain::bulk_quote::{
    BulkQuoteRecord, BulkQuoteRequest, BulkQuoteResponse, BulkQuoteResponseRecord,
};
use crate::domain::duplicate::DuplicateKind;
use crate::domain::quote::QuoteState;
use crate::domain::shared::{Action, BulkQuoteId, FspId, ResourceType, decode_payload};
use crate::error::{ErrorCode, QuoteError};

/// Processor for the bulk quote resource family.
#[derive(Debug, Clone)]
pub struct BulkQuoteProcessor {
    ctx: EngineContext,
}

impl BulkQuoteProcessor {
    /// Create a processor over a wired engine context.
    #[must_use]
    pub const fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    /// Route a message to the handler for its action.
    pub async fn handle(&self, message: &InboundMessage) -> ProcessOutcome {
        let mut state = QuoteState::Received;
        let result = match message.action {
            Action::Post => self.run_request(message, &mut state).await,
            Action::Put => self.run_response(message, &mut state).await,
            Action::Error => {
                return match self.run_error(message, &mut state).await {
                    Ok(outcome) => outcome,
                    Err(error) => log_only(message, error, state),
                };
            }
            Action::Get => relay_get(&self.ctx, message, &mut state).await,
        };

        match result {
            Ok(outcome) => outcome,
            Err(error) => reject(&self.ctx, message, error, state).await,
        }
    }

    async fn run_request(
        &self,
        message: &InboundMessage,
        state: &mut QuoteState,
    ) -> Result<ProcessOutcome, QuoteError> {
        let request: BulkQuoteRequest = decode_payload(&message.payload)?;
        request.validate(Utc::now())?;
        let destination = declared_destination(message)?;
        let bulk_quote_id = request.bulk_quote_id.as_str();
        *state = QuoteState::Validated;

        let mut resend = false;
        if !self.ctx.is_simple_routing() {
            let check = self
                .ctx
                .duplicates
                .check_request(DuplicateKind::BulkQuoteRequest, bulk_quote_id, &message.payload)
                .await?;
            *state = QuoteState::DedupeChecked;

            resend = check.is_resend;
            if !resend {
                let payer_fsp = message
                    .headers
                    .source()
                    .map(FspId::new)
                    .or_else(|| request.payer.fsp().cloned())
                    .ok_or_else(|| QuoteError::missing_element("payer.partyIdInfo.fspId"))?;
                let record = BulkQuoteRecord {
                    bulk_quote_id: request.bulk_quote_id.clone(),
                    payer_fsp,
                    payee_fsp: FspId::new(destination),
                    individual_quote_ids: request
                        .individual_quotes
                        .iter()
                        .map(|quote| quote.quote_id.clone())
                        .collect(),
                    expiration: request.expiration,
                    created_at: Utc::now(),
                };
                resend = write_once(
                    &self.ctx,
                    DuplicateKind::BulkQuoteRequest,
                    bulk_quote_id,
                    &check.hash,
                    vec![PendingWrite::BulkQuote(record)],
                )
                .await?;
                if !resend {
                    *state = QuoteState::Persisted;
                    tracing::info!(
                        bulk_quote_id,
                        quotes = request.individual_quotes.len(),
                        "bulk quote persisted"
                    );
                }
            }
        }

        let delivered = forward_to(
            &self.ctx,
            destination,
            message,
            HttpMethod::Post,
            CallbackPath::Collection,
            bulk_quote_id,
            state,
        )
        .await?;
        Ok(delivered.into_outcome(resend, Vec::new()))
    }

    async fn run_response(
        &self,
        message: &InboundMessage,
        state: &mut QuoteState,
    ) -> Result<ProcessOutcome, QuoteError> {
        let bulk_quote_id = message.require_id()?;
        let response: BulkQuoteResponse = decode_payload(&message.payload)?;
        *state = QuoteState::Validated;

        let (destination, resend) = if self.ctx.is_simple_routing() {
            (declared_destination(message)?.to_string(), false)
        } else {
            let check = self
                .ctx
                .duplicates
                .check_response(DuplicateKind::BulkQuoteResponse, bulk_quote_id, &message.payload)
                .await?;
            *state = QuoteState::DedupeChecked;

            let bulk_quote = self
                .ctx
                .repository
                .get_bulk_quote(bulk_quote_id)
                .await?
                .ok_or_else(|| {
                    QuoteError::new(
                        ErrorCode::BulkQuoteIdNotFound,
                        format!("Bulk quote {bulk_quote_id} not found"),
                    )
                    .with_context("bulk_quote_id", bulk_quote_id)
                })?;

            let mut resend = check.is_resend;
            if !resend {
                let record = BulkQuoteResponseRecord {
                    bulk_quote_id: BulkQuoteId::new(bulk_quote_id),
                    accepted_quote_ids: response
                        .individual_quote_results
                        .iter()
                        .filter(|result| result.transfer_amount.is_some())
                        .map(|result| result.quote_id.clone())
                        .collect(),
                    expiration: response.expiration,
                    created_at: Utc::now(),
                };
                resend = write_once(
                    &self.ctx,
                    DuplicateKind::BulkQuoteResponse,
                    bulk_quote_id,
                    &check.hash,
                    vec![PendingWrite::BulkQuoteResponse(record)],
                )
                .await?;
                if !resend {
                    *state = QuoteState::Persisted;
                }
            }
            (bulk_quote.payer_fsp.into_inner(), resend)
        };

        let delivered = forward_to(
            &self.ctx,
            &destination,
            message,
            HttpMethod::Put,
            CallbackPath::Item,
            bulk_quote_id,
            state,
        )
        .await?;
        Ok(delivered.into_outcome(resend, Vec::new()))
    }

    async fn run_error(
        &self,
        message: &InboundMessage,
        state: &mut QuoteState,
    ) -> Result<ProcessOutcome, QuoteError> {
        let bulk_quote_id = message.require_id()?;
        let body = decode_error_body(message)?;
        *state = QuoteState::Validated;

        let known = if self.ctx.is_simple_routing() {
            None
        } else {
            self.ctx.repository.get_bulk_quote(bulk_quote_id).await?
        };

        let mut counterparty = None;
        if let Some(bulk_quote) = known {
            persist_error(&self.ctx, ResourceType::BulkQuote, bulk_quote_id, &body).await?;
            *state = QuoteState::Persisted;
            let sender = message.headers.source().unwrap_or_default();
            counterparty = Some(bulk_quote.counterparty_of(sender).to_string());
        }

        relay_error(&self.ctx, message, bulk_quote_id, counterparty, state).await
    }
}
