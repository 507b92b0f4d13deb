//! Callback Dispatcher
//!
//! Builds outbound headers and URLs, signs when the hub is the originator,
//! and hands the request to the callback port.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use super::message_signer::MessageSigner;
use super::recipient_resolver::ResolvedRecipient;
use crate::application::ports::{CallbackPort, HttpMethod, OutboundRequest};
use crate::domain::shared::headers::{
    ACCEPT, CONTENT_TYPE, DATE, FSPIOP_DESTINATION, FSPIOP_SOURCE, http_date,
    interop_content_type,
};
use crate::domain::shared::{Headers, ResourceType};
use crate::error::QuoteError;
use crate::observability::record_callback;

/// Path shape appended to a participant endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackPath {
    /// `{endpoint}/{resource}`
    Collection,
    /// `{endpoint}/{resource}/{id}`
    Item,
    /// `{endpoint}/{resource}/{id}/error`
    ItemError,
}

impl CallbackPath {
    const fn metric_kind(self) -> &'static str {
        match self {
            Self::ItemError => "error",
            Self::Collection | Self::Item => "forward",
        }
    }
}

/// Full callback URL for a resource path.
#[must_use]
pub fn callback_url(base: &str, resource: ResourceType, path: CallbackPath, id: &str) -> String {
    let base = base.trim_end_matches('/');
    let segment = resource.path_segment();
    match path {
        CallbackPath::Collection => format!("{base}/{segment}"),
        CallbackPath::Item => format!("{base}/{segment}/{id}"),
        CallbackPath::ItemError => format!("{base}/{segment}/{id}/error"),
    }
}

/// One message to deliver.
#[derive(Debug, Clone, Copy)]
pub struct OutboundMessage<'a> {
    /// Resource family.
    pub resource: ResourceType,
    /// HTTP method.
    pub method: HttpMethod,
    /// URL shape.
    pub path: CallbackPath,
    /// Resource id.
    pub id: &'a str,
    /// Inbound headers to relay.
    pub headers: &'a Headers,
    /// Body; `None` for GET.
    pub body: Option<&'a Value>,
}

/// Delivers forwards and error callbacks.
pub struct CallbackDispatcher {
    client: Arc<dyn CallbackPort>,
    signer: MessageSigner,
    api_version: String,
}

impl CallbackDispatcher {
    /// Create a dispatcher.
    #[must_use]
    pub fn new(
        client: Arc<dyn CallbackPort>,
        signer: MessageSigner,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            client,
            signer,
            api_version: api_version.into(),
        }
    }

    /// Name the hub uses as `fspiop-source`.
    #[must_use]
    pub fn hub_name(&self) -> &str {
        self.signer.hub_name()
    }

    /// Headers for a relayed message.
    ///
    /// Inbound headers are kept except transport ones; the destination is
    /// set to the resolved participant. A message without a source is
    /// treated as hub-originated.
    #[must_use]
    pub fn outbound_headers(
        &self,
        resource: ResourceType,
        method: HttpMethod,
        inbound: &Headers,
        destination: &str,
    ) -> Headers {
        let mut headers = inbound.relayable();
        if headers.source().is_none() {
            headers.insert(FSPIOP_SOURCE, self.hub_name());
        }
        headers.insert(FSPIOP_DESTINATION, destination);
        if method == HttpMethod::Put {
            headers.remove(ACCEPT);
        }
        if !headers.contains(CONTENT_TYPE) {
            headers.insert(
                CONTENT_TYPE,
                interop_content_type(resource.path_segment(), &self.api_version),
            );
        }
        if !headers.contains(DATE) {
            headers.insert(DATE, http_date(Utc::now()));
        }
        headers
    }

    /// Relay a message to a resolved recipient, returning the URL used.
    ///
    /// # Errors
    ///
    /// `DestinationCommunicationError` on connection failure, timeout or a
    /// non-2xx response; internal error when signing fails.
    pub async fn forward(
        &self,
        recipient: &ResolvedRecipient,
        message: OutboundMessage<'_>,
    ) -> Result<String, QuoteError> {
        let headers = self.outbound_headers(
            message.resource,
            message.method,
            message.headers,
            &recipient.destination,
        );
        let url = callback_url(&recipient.url, message.resource, message.path, message.id);
        self.deliver(
            message.resource,
            message.path.metric_kind(),
            message.method,
            url.clone(),
            headers,
            message.body.cloned(),
        )
        .await?;
        Ok(url)
    }

    /// Send an error callback from the hub to `recipient`.
    ///
    /// # Errors
    ///
    /// Same as [`CallbackDispatcher::forward`].
    pub async fn send_error_callback(
        &self,
        resource: ResourceType,
        recipient: &ResolvedRecipient,
        id: &str,
        error: &QuoteError,
    ) -> Result<(), QuoteError> {
        let headers = Headers::new()
            .with(FSPIOP_SOURCE, self.hub_name())
            .with(FSPIOP_DESTINATION, recipient.destination.as_str())
            .with(
                CONTENT_TYPE,
                interop_content_type(resource.path_segment(), &self.api_version),
            )
            .with(DATE, http_date(Utc::now()));
        let body = serde_json::to_value(error.to_error_information())
            .map_err(|e| QuoteError::internal(format!("failed to encode error body: {e}")))?;
        let url = callback_url(&recipient.url, resource, CallbackPath::ItemError, id);

        self.deliver(resource, "error", HttpMethod::Put, url, headers, Some(body))
            .await
    }

    async fn deliver(
        &self,
        resource: ResourceType,
        kind: &str,
        method: HttpMethod,
        url: String,
        headers: Headers,
        body: Option<Value>,
    ) -> Result<(), QuoteError> {
        let headers = self
            .signer
            .maybe_sign(headers, body.as_ref().unwrap_or(&Value::Null))?;
        let request = OutboundRequest {
            method,
            url: url.clone(),
            headers,
            body,
        };

        match self.client.send(request).await {
            Ok(response) => {
                record_callback(resource.as_str(), kind, "delivered");
                tracing::debug!(%method, url = %url, status = response.status, "callback delivered");
                Ok(())
            }
            Err(e) => {
                record_callback(resource.as_str(), kind, e.label());
                tracing::warn!(%method, url = %url, error = %e, "callback delivery failed");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::ForwardError;
    use crate::domain::shared::headers::FSPIOP_SIGNATURE;
    use crate::error::ErrorCode;
    use crate::infrastructure::http::RecordingCallbackClient;
    use serde_json::json;

    struct FixedSigner;

    impl crate::application::ports::SignerPort for FixedSigner {
        fn sign(
            &self,
            _headers: &Headers,
            _body: &Value,
        ) -> Result<String, crate::application::ports::SignerError> {
            Ok("signed".to_string())
        }
    }

    fn dispatcher(client: Arc<RecordingCallbackClient>) -> CallbackDispatcher {
        CallbackDispatcher::new(
            client,
            MessageSigner::new("Hub", true, Some(Arc::new(FixedSigner))),
            "1.1",
        )
    }

    fn recipient() -> ResolvedRecipient {
        ResolvedRecipient {
            url: "http://payeefsp.local/".to_string(),
            destination: "payeefsp".to_string(),
            proxy: None,
        }
    }

    #[test]
    fn urls_per_path_shape() {
        let base = "http://fsp.local/";
        assert_eq!(
            callback_url(base, ResourceType::Quote, CallbackPath::Collection, "q-1"),
            "http://fsp.local/quotes"
        );
        assert_eq!(
            callback_url(base, ResourceType::BulkQuote, CallbackPath::Item, "bq-1"),
            "http://fsp.local/bulkQuotes/bq-1"
        );
        assert_eq!(
            callback_url(base, ResourceType::FxQuote, CallbackPath::ItemError, "cr-1"),
            "http://fsp.local/fxQuotes/cr-1/error"
        );
    }

    #[test]
    fn outbound_headers_relay_and_fill_defaults() {
        let dispatcher = dispatcher(Arc::new(RecordingCallbackClient::new()));
        let inbound = Headers::new()
            .with(FSPIOP_SOURCE, "payerfsp")
            .with(FSPIOP_DESTINATION, "somewhere-else")
            .with("host", "switch.local")
            .with(ACCEPT, "application/vnd.interoperability.quotes+json;version=1")
            .with("traceparent", "00-abc-def-01");

        let headers =
            dispatcher.outbound_headers(ResourceType::Quote, HttpMethod::Put, &inbound, "payeefsp");
        assert_eq!(headers.source(), Some("payerfsp"));
        assert_eq!(headers.destination(), Some("payeefsp"));
        assert_eq!(headers.get("traceparent"), Some("00-abc-def-01"));
        assert!(!headers.contains("host"));
        assert!(!headers.contains(ACCEPT));
        assert_eq!(
            headers.get(CONTENT_TYPE),
            Some("application/vnd.interoperability.quotes+json;version=1.1")
        );
        assert!(headers.contains(DATE));
    }

    #[tokio::test]
    async fn participant_forward_is_not_signed() {
        let client = Arc::new(RecordingCallbackClient::new());
        let dispatcher = dispatcher(client.clone());
        let inbound = Headers::new().with(FSPIOP_SOURCE, "payerfsp");
        let body = json!({"quoteId": "q-1"});

        let url = dispatcher
            .forward(
                &recipient(),
                OutboundMessage {
                    resource: ResourceType::Quote,
                    method: HttpMethod::Post,
                    path: CallbackPath::Collection,
                    id: "q-1",
                    headers: &inbound,
                    body: Some(&body),
                },
            )
            .await
            .unwrap();

        assert_eq!(url, "http://payeefsp.local/quotes");
        let sent = client.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, HttpMethod::Post);
        assert!(sent[0].headers.get(FSPIOP_SIGNATURE).is_none());
        assert_eq!(sent[0].body.as_ref(), Some(&body));
    }

    #[tokio::test]
    async fn error_callback_comes_from_hub_and_is_signed() {
        let client = Arc::new(RecordingCallbackClient::new());
        let dispatcher = dispatcher(client.clone());
        let error = QuoteError::conflict("q-1");

        dispatcher
            .send_error_callback(ResourceType::Quote, &recipient(), "q-1", &error)
            .await
            .unwrap();

        let sent = client.requests();
        assert_eq!(sent[0].method, HttpMethod::Put);
        assert_eq!(sent[0].url, "http://payeefsp.local/quotes/q-1/error");
        assert_eq!(sent[0].headers.source(), Some("Hub"));
        assert_eq!(sent[0].headers.destination(), Some("payeefsp"));
        assert_eq!(sent[0].headers.signature(), Some("signed"));
        let body = sent[0].body.as_ref().unwrap();
        assert_eq!(body["errorInformation"]["errorCode"], "3106");
    }

    #[tokio::test]
    async fn delivery_failure_is_forwarding_error() {
        let client = Arc::new(RecordingCallbackClient::new());
        client.fail_for(
            "http://payeefsp.local",
            ForwardError::Timeout {
                url: "http://payeefsp.local/quotes".to_string(),
            },
        );
        let dispatcher = dispatcher(client);
        let inbound = Headers::new().with(FSPIOP_SOURCE, "payerfsp");

        let err = dispatcher
            .forward(
                &recipient(),
                OutboundMessage {
                    resource: ResourceType::Quote,
                    method: HttpMethod::Post,
                    path: CallbackPath::Collection,
                    id: "q-1",
                    headers: &inbound,
                    body: Some(&json!({})),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::DestinationCommunicationError);
    }
}
