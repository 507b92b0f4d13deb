//! Inbound message envelope.
//!
//! The bus delivers every quote, bulk-quote and fx-quote message wrapped in
//! the same envelope. The payload is either inline JSON or an RFC 2397
//! `data:` URI.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::shared::{Action, Headers, ResourceType};
use crate::error::QuoteError;

/// Envelope wrapping one inbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEnvelope {
    /// Sender.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Addressee.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Envelope id.
    pub id: String,
    /// Resource family name, e.g. `quote` or `fxquotes`.
    #[serde(rename = "type")]
    pub message_type: String,
    /// Message content.
    pub content: EnvelopeContent,
    /// Delivery metadata.
    pub metadata: EnvelopeMetadata,
}

/// Content of an envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeContent {
    /// HTTP headers of the original request.
    #[serde(default)]
    pub headers: Headers,
    /// Body: inline JSON or a `data:` URI string.
    #[serde(default)]
    pub payload: Value,
    /// Path parameters.
    #[serde(default)]
    pub uri_params: UriParams,
    /// Request path, used to recognise `/error` callbacks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Trace context, relayed untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span_context: Option<Value>,
}

/// Path parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UriParams {
    /// Resource id from the path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Envelope metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeMetadata {
    /// Correlation id used in logs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    /// Event details.
    pub event: EnvelopeEvent,
}

/// Event details of an envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeEvent {
    /// Event type, e.g. `quote`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    /// Action: `post`, `put` or `get`.
    pub action: String,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A decoded message ready for a processor.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    /// Resource family.
    pub resource: ResourceType,
    /// Resolved action.
    pub action: Action,
    /// Id from the path, if any.
    pub uri_id: Option<String>,
    /// Headers.
    pub headers: Headers,
    /// Decoded JSON body; `null` for GET.
    pub payload: Value,
}

impl InboundMessage {
    /// Build a message directly, bypassing the envelope.
    #[must_use]
    pub fn new(resource: ResourceType, action: Action, headers: Headers, payload: Value) -> Self {
        Self {
            resource,
            action,
            uri_id: None,
            headers,
            payload,
        }
    }

    /// Builder-style path id.
    #[must_use]
    pub fn with_uri_id(mut self, id: impl Into<String>) -> Self {
        self.uri_id = Some(id.into());
        self
    }

    /// Resource id: the path id, else the id field of the body.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.uri_id
            .as_deref()
            .or_else(|| self.payload.get(self.resource.id_field())?.as_str())
    }

    /// Resource id or a missing-element error.
    ///
    /// # Errors
    ///
    /// `MissingElement` naming the resource's id field.
    pub fn require_id(&self) -> Result<&str, QuoteError> {
        self.id()
            .ok_or_else(|| QuoteError::missing_element(self.resource.id_field()))
    }
}

impl TryFrom<MessageEnvelope> for InboundMessage {
    type Error = QuoteError;

    fn try_from(envelope: MessageEnvelope) -> Result<Self, Self::Error> {
        let resource: ResourceType = envelope.message_type.parse()?;
        let action = Action::resolve(
            &envelope.metadata.event.action,
            envelope.content.path.as_deref(),
        )?;
        let payload = decode_payload_value(envelope.content.payload)?;

        Ok(Self {
            resource,
            action,
            uri_id: envelope.content.uri_params.id,
            headers: envelope.content.headers,
            payload,
        })
    }
}

/// Decode an RFC 2397 `data:` URI payload into JSON.
///
/// Anything that is not a string starting with `data:` is returned as is.
///
/// # Errors
///
/// `MalformedSyntax` when the URI or its JSON content cannot be decoded.
pub fn decode_payload_value(payload: Value) -> Result<Value, QuoteError> {
    let Value::String(text) = &payload else {
        return Ok(payload);
    };
    let Some(uri) = text.strip_prefix("data:") else {
        return Ok(payload);
    };

    let (meta, data) = uri
        .split_once(',')
        .ok_or_else(|| QuoteError::malformed("data URI has no ',' separator"))?;

    let bytes = if meta.ends_with(";base64") {
        STANDARD
            .decode(data.trim())
            .map_err(|e| QuoteError::malformed(format!("invalid base64 payload: {e}")))?
    } else {
        data.as_bytes().to_vec()
    };

    serde_json::from_slice(&bytes)
        .map_err(|e| QuoteError::malformed(format!("payload is not valid JSON: {e}")))
}
