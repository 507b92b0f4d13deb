//! FX Quote Processor
//!
//! Conversion requests go to the FX provider named in the terms; responses
//! go back to the initiating FSP.

use chrono::Utc;

use super::common::{
    declared_destination, decode_error_body, forward_to, log_only, persist_error, reject,
    relay_error, relay_get, write_once,
};
use super::context::EngineContext;
use crate::application::dto::{InboundMessage, ProcessOutcome};
use crate::application::ports::HttpMethod;
use crate::application::services::{CallbackPath, PendingWrite};
use crate::domain::duplicate::DuplicateKind;
use crate::domain::fx_quote::{
    FxQuoteRecord, FxQuoteRequest, FxQuoteResponse, FxQuoteResponseRecord,
};
use crate::domain::quote::QuoteState;
use crate::domain::shared::headers::FSPIOP_SOURCE;
use crate::domain::shared::{Action, ConversionRequestId, ResourceType, decode_payload};
use crate::error::{ErrorCode, QuoteError};

/// Processor for the fx quote resource family.
#[derive(Debug, Clone)]
pub struct FxQuoteProcessor {
    ctx: EngineContext,
}

impl FxQuoteProcessor {
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
        let request: FxQuoteRequest = decode_payload(&message.payload)?;
        let source = message
            .headers
            .source()
            .ok_or_else(|| QuoteError::missing_element(FSPIOP_SOURCE))?;
        request.validate(source, Utc::now())?;
        let conversion_request_id = request.conversion_request_id.as_str();
        let terms = &request.conversion_terms;
        *state = QuoteState::Validated;

        let mut resend = false;
        if !self.ctx.is_simple_routing() {
            let check = self
                .ctx
                .duplicates
                .check_request(
                    DuplicateKind::FxQuoteRequest,
                    conversion_request_id,
                    &message.payload,
                )
                .await?;
            *state = QuoteState::DedupeChecked;

            resend = check.is_resend;
            if !resend {
                let record = FxQuoteRecord {
                    conversion_request_id: request.conversion_request_id.clone(),
                    conversion_id: terms.conversion_id.clone(),
                    determining_transfer_id: terms.determining_transfer_id.clone(),
                    initiating_fsp: terms.initiating_fsp.clone(),
                    counter_party_fsp: terms.counter_party_fsp.clone(),
                    amount_type: terms.amount_type,
                    source_amount: terms.source_amount.clone(),
                    target_amount: terms.target_amount.clone(),
                    expiration: terms.expiration,
                    charges: terms.charges.clone().unwrap_or_default(),
                    created_at: Utc::now(),
                };
                resend = write_once(
                    &self.ctx,
                    DuplicateKind::FxQuoteRequest,
                    conversion_request_id,
                    &check.hash,
                    vec![PendingWrite::FxQuote(record)],
                )
                .await?;
                if !resend {
                    *state = QuoteState::Persisted;
                    tracing::info!(
                        conversion_request_id,
                        counter_party = %terms.counter_party_fsp,
                        "fx quote persisted"
                    );
                }
            }
        }

        let delivered = forward_to(
            &self.ctx,
            terms.counter_party_fsp.as_str(),
            message,
            HttpMethod::Post,
            CallbackPath::Collection,
            conversion_request_id,
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
        let conversion_request_id = message.require_id()?;
        let response: FxQuoteResponse = decode_payload(&message.payload)?;
        response.validate()?;
        *state = QuoteState::Validated;

        let (destination, resend) = if self.ctx.is_simple_routing() {
            (declared_destination(message)?.to_string(), false)
        } else {
            let check = self
                .ctx
                .duplicates
                .check_response(
                    DuplicateKind::FxQuoteResponse,
                    conversion_request_id,
                    &message.payload,
                )
                .await?;
            *state = QuoteState::DedupeChecked;

            let fx_quote = self
                .ctx
                .repository
                .get_fx_quote(conversion_request_id)
                .await?
                .ok_or_else(|| {
                    QuoteError::new(
                        ErrorCode::IdNotFound,
                        format!("Conversion request {conversion_request_id} not found"),
                    )
                    .with_context("conversion_request_id", conversion_request_id)
                })?;

            let mut resend = check.is_resend;
            if !resend {
                let terms = response.conversion_terms;
                let record = FxQuoteResponseRecord {
                    conversion_request_id: ConversionRequestId::new(conversion_request_id),
                    conversion_id: terms.conversion_id,
                    condition: response.condition,
                    source_amount: terms.source_amount,
                    target_amount: terms.target_amount,
                    expiration: terms.expiration,
                    charges: terms.charges.unwrap_or_default(),
                    created_at: Utc::now(),
                };
                resend = write_once(
                    &self.ctx,
                    DuplicateKind::FxQuoteResponse,
                    conversion_request_id,
                    &check.hash,
                    vec![PendingWrite::FxQuoteResponse(record)],
                )
                .await?;
                if !resend {
                    *state = QuoteState::Persisted;
                }
            }
            (fx_quote.initiating_fsp.into_inner(), resend)
        };

        let delivered = forward_to(
            &self.ctx,
            &destination,
            message,
            HttpMethod::Put,
            CallbackPath::Item,
            conversion_request_id,
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
        let conversion_request_id = message.require_id()?;
        let body = decode_error_body(message)?;
        *state = QuoteState::Validated;

        let known = if self.ctx.is_simple_routing() {
            None
        } else {
            self.ctx.repository.get_fx_quote(conversion_request_id).await?
        };

        let mut counterparty = None;
        if let Some(fx_quote) = known {
            persist_error(&self.ctx, ResourceType::FxQuote, conversion_request_id, &body).await?;
            *state = QuoteState::Persisted;
            let sender = message.headers.source().unwrap_or_default();
            counterparty = Some(fx_quote.counterparty_of(sender).to_string());
        }

        relay_error(&self.ctx, message, conversion_request_id, counterparty, state).await
    }
}
