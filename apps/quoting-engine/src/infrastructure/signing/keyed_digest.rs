//! Keyed SHA-256 signer.
//!
//! Produces an `fspiop-signature` value in the scheme's JSON shape,
//! `{"signature": ..., "protectedHeader": ...}`. The protected header covers
//! source, destination, URI, method and date; the signature is the base64url
//! SHA-256 of `key.protectedHeader.canonicalBody`.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};

use crate::application::ports::{SignerError, SignerPort};
use crate::domain::duplicate::canonical_json;
use crate::domain::shared::Headers;
use crate::domain::shared::headers::{
    DATE, FSPIOP_DESTINATION, FSPIOP_HTTP_METHOD, FSPIOP_SOURCE, FSPIOP_URI,
};

const ALGORITHM: &str = "SHA256";
const PROTECTED: [&str; 5] = [
    FSPIOP_SOURCE,
    FSPIOP_DESTINATION,
    FSPIOP_URI,
    FSPIOP_HTTP_METHOD,
    DATE,
];

/// Signs with a shared secret.
pub struct KeyedDigestSigner {
    key: Vec<u8>,
}

impl std::fmt::Debug for KeyedDigestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyedDigestSigner")
            .field("key", &"<redacted>")
            .finish()
    }
}

impl KeyedDigestSigner {
    /// Create a signer. An empty key is rejected at sign time.
    #[must_use]
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into() }
    }

    fn protected_header(headers: &Headers) -> Value {
        let mut protected = Map::new();
        protected.insert("alg".to_string(), Value::String(ALGORITHM.to_string()));
        for name in PROTECTED {
            if let Some(value) = headers.get(name) {
                protected.insert(name.to_uppercase(), Value::String(value.to_string()));
            }
        }
        Value::Object(protected)
    }
}

impl SignerPort for KeyedDigestSigner {
    fn sign(&self, headers: &Headers, body: &Value) -> Result<String, SignerError> {
        if self.key.is_empty() {
            return Err(SignerError::KeyUnavailable);
        }

        let protected = URL_SAFE_NO_PAD.encode(canonical_json(&Self::protected_header(headers)));
        let mut hasher = Sha256::new();
        hasher.update(&self.key);
        hasher.update(b".");
        hasher.update(protected.as_bytes());
        hasher.update(b".");
        hasher.update(canonical_json(body).as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(hasher.finalize());

        Ok(json!({"signature": signature, "protectedHeader": protected}).to_string())
    }
}
