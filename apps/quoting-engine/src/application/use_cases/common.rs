//! Steps shared by the quote, bulk-quote and fx-quote processors.

use chrono::Utc;

use super::context::EngineContext;
use crate::application::dto::{InboundMessage, ProcessOutcome};
use crate::application::ports::HttpMethod;
use crate::application::services::{
    CallbackPath, OutboundMessage, PendingWrite, ResolvedRecipient, WriteOutcome,
};
use crate::domain::duplicate::{DuplicateCheckRecord, DuplicateKind};
use crate::domain::quote::{QuoteErrorRecord, QuoteState};
use crate::domain::rules::RuleEvent;
use crate::domain::shared::headers::FSPIOP_DESTINATION;
use crate::domain::shared::{ResourceType, decode_payload};
use crate::error::{ErrorInformationBody, QuoteError};

/// A delivered message.
pub(crate) struct Delivered {
    pub(crate) recipient: ResolvedRecipient,
    pub(crate) url: String,
}

impl Delivered {
    pub(crate) fn into_outcome(self, resend: bool, events: Vec<RuleEvent>) -> ProcessOutcome {
        ProcessOutcome::Forwarded {
            destination: self.recipient.destination,
            url: self.url,
            resend,
            proxy: self.recipient.proxy,
            events,
        }
    }
}

/// Resolve `participant` and deliver the inbound message to it.
pub(crate) async fn forward_to(
    ctx: &EngineContext,
    participant: &str,
    message: &InboundMessage,
    method: HttpMethod,
    path: CallbackPath,
    id: &str,
    state: &mut QuoteState,
) -> Result<Delivered, QuoteError> {
    let recipient = ctx
        .resolver
        .resolve(participant, message.resource.endpoint_type(), id)
        .await?;
    *state = QuoteState::Resolved;

    let body = (method != HttpMethod::Get).then_some(&message.payload);
    let url = ctx
        .callbacks
        .forward(
            &recipient,
            OutboundMessage {
                resource: message.resource,
                method,
                path,
                id,
                headers: &message.headers,
                body,
            },
        )
        .await?;
    *state = QuoteState::Forwarded;

    tracing::info!(
        resource = %message.resource,
        id,
        destination = %recipient.destination,
        proxy = ?recipient.proxy,
        url = %url,
        "message forwarded"
    );
    Ok(Delivered { recipient, url })
}

/// Declared `fspiop-destination` or a missing-element error.
pub(crate) fn declared_destination(message: &InboundMessage) -> Result<&str, QuoteError> {
    message
        .headers
        .destination()
        .ok_or_else(|| QuoteError::missing_element(FSPIOP_DESTINATION))
}

/// Report a failure to the sender with an error callback.
pub(crate) async fn reject(
    ctx: &EngineContext,
    message: &InboundMessage,
    error: QuoteError,
    failed_at: QuoteState,
) -> ProcessOutcome {
    tracing::warn!(
        resource = %message.resource,
        action = %message.action,
        id = ?message.id(),
        error_code = error.code().fspiop_code(),
        failed_at = %failed_at,
        error = %error,
        "message rejected"
    );

    let callback_delivered = match (message.headers.source(), message.id()) {
        (Some(sender), Some(id)) => {
            match send_error_callback(ctx, message.resource, sender, id, &error).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::error!(sender, id, error = %e, "error callback not delivered");
                    false
                }
            }
        }
        _ => {
            tracing::warn!("message has no source or id; error callback skipped");
            false
        }
    };

    ProcessOutcome::Rejected {
        error,
        failed_at,
        callback_delivered,
    }
}

async fn send_error_callback(
    ctx: &EngineContext,
    resource: ResourceType,
    sender: &str,
    id: &str,
    error: &QuoteError,
) -> Result<(), QuoteError> {
    let recipient = ctx
        .resolver
        .resolve(sender, resource.endpoint_type(), id)
        .await?;
    ctx.callbacks
        .send_error_callback(resource, &recipient, id, error)
        .await
}

/// Record a failure without calling anyone back.
///
/// Used when relaying a participant's error callback fails; answering an
/// error with another error would loop.
pub(crate) fn log_only(
    message: &InboundMessage,
    error: QuoteError,
    failed_at: QuoteState,
) -> ProcessOutcome {
    tracing::error!(
        resource = %message.resource,
        id = ?message.id(),
        error_code = error.code().fspiop_code(),
        failed_at = %failed_at,
        error = %error,
        "error callback could not be relayed"
    );
    ProcessOutcome::Rejected {
        error,
        failed_at,
        callback_delivered: false,
    }
}

/// Decode an inbound error body.
pub(crate) fn decode_error_body(message: &InboundMessage) -> Result<ErrorInformationBody, QuoteError> {
    decode_payload(&message.payload)
}

/// Write `writes` together with the duplicate-check record for `(kind, id)`.
///
/// Returns true when a concurrent identical message won the insert; nothing
/// was written and the message is handled as a resend.
pub(crate) async fn write_once(
    ctx: &EngineContext,
    kind: DuplicateKind,
    id: &str,
    hash: &str,
    writes: Vec<PendingWrite>,
) -> Result<bool, QuoteError> {
    let record = DuplicateCheckRecord {
        kind,
        id: id.to_string(),
        hash: hash.to_string(),
    };
    match ctx.writer.write(writes, Some(record)).await? {
        WriteOutcome::Committed => Ok(false),
        WriteOutcome::LostRace => {
            ctx.duplicates.resolve_lost_race(kind, id, hash).await?;
            Ok(true)
        }
    }
}

/// Persist an error received for a known resource.
pub(crate) async fn persist_error(
    ctx: &EngineContext,
    resource: ResourceType,
    id: &str,
    body: &ErrorInformationBody,
) -> Result<(), QuoteError> {
    let record = QuoteErrorRecord {
        resource,
        id: id.to_string(),
        error_code: body.error_information.error_code.clone(),
        error_description: body.error_information.error_description.clone(),
        created_at: Utc::now(),
    };
    ctx.writer
        .write(vec![PendingWrite::QuoteError(record)], None)
        .await?;
    Ok(())
}

/// Relay a participant's error callback.
///
/// Goes to `counterparty` when the resource is known, otherwise to the
/// declared destination.
pub(crate) async fn relay_error(
    ctx: &EngineContext,
    message: &InboundMessage,
    id: &str,
    counterparty: Option<String>,
    state: &mut QuoteState,
) -> Result<ProcessOutcome, QuoteError> {
    let destination = match counterparty {
        Some(participant) => participant,
        None => declared_destination(message)?.to_string(),
    };
    let delivered = forward_to(
        ctx,
        &destination,
        message,
        HttpMethod::Put,
        CallbackPath::ItemError,
        id,
        state,
    )
    .await?;
    Ok(delivered.into_outcome(false, Vec::new()))
}

/// Relay a GET to the declared destination.
pub(crate) async fn relay_get(
    ctx: &EngineContext,
    message: &InboundMessage,
    state: &mut QuoteState,
) -> Result<ProcessOutcome, QuoteError> {
    let id = message.require_id()?;
    let destination = declared_destination(message)?;
    *state = QuoteState::Validated;

    let delivered = forward_to(
        ctx,
        destination,
        message,
        HttpMethod::Get,
        CallbackPath::Item,
        id,
        state,
    )
    .await?;
    Ok(delivered.into_outcome(false, Vec::new()))
}
