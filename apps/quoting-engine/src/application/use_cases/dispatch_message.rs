//! Message Dispatcher
//!
//! Entry point for one inbound envelope: decode, route to the processor of
//! its resource family, record the outcome.

use std::time::Instant;

use tracing::Instrument;

use super::context::EngineContext;
use super::process_bulk_quote::BulkQuoteProcessor;
use super::process_fx_quote::FxQuoteProcessor;
use super::process_quote::QuoteProcessor;
use crate::application::dto::{InboundMessage, MessageEnvelope, ProcessOutcome};
use crate::domain::shared::ResourceType;
use crate::error::QuoteError;
use crate::observability::record_message_processed;

/// Routes envelopes to the quote, bulk quote and fx quote processors.
#[derive(Debug, Clone)]
pub struct MessageDispatcher {
    quotes: QuoteProcessor,
    bulk_quotes: BulkQuoteProcessor,
    fx_quotes: FxQuoteProcessor,
}

impl MessageDispatcher {
    /// Create a dispatcher over a wired engine context.
    #[must_use]
    pub fn new(ctx: EngineContext) -> Self {
        Self {
            quotes: QuoteProcessor::new(ctx.clone()),
            bulk_quotes: BulkQuoteProcessor::new(ctx.clone()),
            fx_quotes: FxQuoteProcessor::new(ctx),
        }
    }

    /// Process one envelope.
    ///
    /// # Errors
    ///
    /// Returns the decode error when the envelope names an unknown resource
    /// or action, or carries an undecodable payload. Nobody can be called
    /// back in that case.
    pub async fn dispatch(&self, envelope: MessageEnvelope) -> Result<ProcessOutcome, QuoteError> {
        let correlation_id = envelope
            .metadata
            .correlation_id
            .clone()
            .unwrap_or_else(|| envelope.id.clone());

        let message = InboundMessage::try_from(envelope).inspect_err(|e| {
            tracing::warn!(correlation_id = %correlation_id, error = %e, "envelope rejected");
        })?;

        let span = tracing::info_span!(
            "process_message",
            resource = %message.resource,
            action = %message.action,
            id = message.id().unwrap_or_default(),
            correlation_id = %correlation_id,
        );
        Ok(self.process(&message).instrument(span).await)
    }

    /// Process an already decoded message.
    pub async fn process(&self, message: &InboundMessage) -> ProcessOutcome {
        let started = Instant::now();
        let outcome = match message.resource {
            ResourceType::Quote => self.quotes.handle(message).await,
            ResourceType::BulkQuote => self.bulk_quotes.handle(message).await,
            ResourceType::FxQuote => self.fx_quotes.handle(message).await,
        };

        record_message_processed(
            message.resource.as_str(),
            message.action.as_str(),
            outcome.label(),
            started.elapsed().as_secs_f64(),
        );
        tracing::debug!(outcome = outcome.label(), state = %outcome.state(), "message processed");
        outcome
    }
}
