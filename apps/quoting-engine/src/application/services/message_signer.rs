//! Message Signer
//!
//! Decides whether an outgoing message needs an `fspiop-signature` and asks
//! the signer collaborator for one. Only messages the hub itself originates
//! are signed; participant messages keep the signature their sender applied.

use std::sync::Arc;

use serde_json::Value;

use crate::application::ports::SignerPort;
use crate::domain::shared::Headers;
use crate::domain::shared::headers::FSPIOP_SIGNATURE;
use crate::error::QuoteError;

/// Signing policy plus the optional signer.
pub struct MessageSigner {
    hub_name: String,
    signing_enabled: bool,
    signer: Option<Arc<dyn SignerPort>>,
}

impl MessageSigner {
    /// Create a signer policy for `hub_name`.
    #[must_use]
    pub fn new(
        hub_name: impl Into<String>,
        signing_enabled: bool,
        signer: Option<Arc<dyn SignerPort>>,
    ) -> Self {
        Self {
            hub_name: hub_name.into(),
            signing_enabled,
            signer,
        }
    }

    /// A policy that never signs.
    #[must_use]
    pub fn disabled(hub_name: impl Into<String>) -> Self {
        Self::new(hub_name, false, None)
    }

    /// Hub name messages must carry as source to be signed.
    #[must_use]
    pub fn hub_name(&self) -> &str {
        &self.hub_name
    }

    /// Returns true if a message with these headers would be signed.
    #[must_use]
    pub fn should_sign(&self, headers: &Headers) -> bool {
        headers.signature().is_none()
            && self.signing_enabled
            && self.signer.is_some()
            && headers.source() == Some(self.hub_name.as_str())
    }

    /// Add `fspiop-signature` when required; other headers are untouched.
    ///
    /// # Errors
    ///
    /// Internal error when the signer fails.
    pub fn maybe_sign(&self, mut headers: Headers, body: &Value) -> Result<Headers, QuoteError> {
        if !self.should_sign(&headers) {
            return Ok(headers);
        }
        let Some(signer) = &self.signer else {
            return Ok(headers);
        };

        let signature = signer.sign(&headers, body)?;
        headers.insert(FSPIOP_SIGNATURE, signature);
        tracing::debug!(hub = %self.hub_name, "signed hub-originated message");
        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{MockSignerPort, SignerError};
    use crate::domain::shared::headers::{FSPIOP_DESTINATION, FSPIOP_SOURCE};
    use crate::error::ErrorKind;
    use serde_json::json;

    fn hub_headers() -> Headers {
        Headers::new()
            .with(FSPIOP_SOURCE, "Hub")
            .with(FSPIOP_DESTINATION, "payerfsp")
    }

    fn signing_mock(times: usize) -> MockSignerPort {
        let mut signer = MockSignerPort::new();
        signer
            .expect_sign()
            .times(times)
            .returning(|_, _| Ok("jws-signature".to_string()));
        signer
    }

    #[test]
    fn hub_originated_message_is_signed() {
        let signer = MessageSigner::new("Hub", true, Some(Arc::new(signing_mock(1))));
        let headers = signer.maybe_sign(hub_headers(), &json!({"a": 1})).unwrap();

        assert_eq!(headers.signature(), Some("jws-signature"));
        assert_eq!(headers.len(), 3);
        assert_eq!(headers.destination(), Some("payerfsp"));
    }

    #[test]
    fn participant_message_is_not_signed() {
        let signer = MessageSigner::new("Hub", true, Some(Arc::new(signing_mock(0))));
        let headers = Headers::new().with(FSPIOP_SOURCE, "payeefsp");

        let out = signer.maybe_sign(headers.clone(), &json!({})).unwrap();
        assert_eq!(out, headers);
    }

    #[test]
    fn existing_signature_is_kept() {
        let signer = MessageSigner::new("Hub", true, Some(Arc::new(signing_mock(0))));
        let headers = hub_headers().with(FSPIOP_SIGNATURE, "original");

        let out = signer.maybe_sign(headers, &json!({})).unwrap();
        assert_eq!(out.signature(), Some("original"));
    }

    #[test]
    fn disabled_signing_or_missing_signer_skips() {
        let disabled = MessageSigner::new("Hub", false, Some(Arc::new(signing_mock(0))));
        assert!(disabled.maybe_sign(hub_headers(), &json!({})).unwrap().signature().is_none());

        let unconfigured = MessageSigner::new("Hub", true, None);
        assert!(!unconfigured.should_sign(&hub_headers()));
        assert!(MessageSigner::disabled("Hub")
            .maybe_sign(hub_headers(), &json!({}))
            .unwrap()
            .signature()
            .is_none());
    }

    #[test]
    fn signer_failure_is_internal() {
        let mut mock = MockSignerPort::new();
        mock.expect_sign()
            .returning(|_, _| Err(SignerError::KeyUnavailable));
        let signer = MessageSigner::new("Hub", true, Some(Arc::new(mock)));

        let err = signer.maybe_sign(hub_headers(), &json!({})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
