//! Canonical payload hashing for idempotency checks.
//!
//! Payloads are canonicalized (object keys sorted at every depth, no
//! insignificant whitespace) and hashed with SHA-256. Two payloads that differ
//! only in key order produce the same hash.

use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Which duplicate-check table a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DuplicateKind {
    /// Quote request.
    QuoteRequest,
    /// Quote response.
    QuoteResponse,
    /// Bulk quote request.
    BulkQuoteRequest,
    /// Bulk quote response.
    BulkQuoteResponse,
    /// FX quote request.
    FxQuoteRequest,
    /// FX quote response.
    FxQuoteResponse,
}

impl DuplicateKind {
    /// Label used in logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::QuoteRequest => "quote_request",
            Self::QuoteResponse => "quote_response",
            Self::BulkQuoteRequest => "bulk_quote_request",
            Self::BulkQuoteResponse => "bulk_quote_response",
            Self::FxQuoteRequest => "fx_quote_request",
            Self::FxQuoteResponse => "fx_quote_response",
        }
    }
}

impl fmt::Display for DuplicateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stored `(id, hash)` pair. At most one exists per `(kind, id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateCheckRecord {
    /// Table the record lives in.
    pub kind: DuplicateKind,
    /// Message id.
    pub id: String,
    /// Hex SHA-256 of the canonical payload.
    pub hash: String,
}

/// Outcome of a duplicate check that did not conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateCheckResult {
    /// A record for this id already exists.
    pub is_duplicate_id: bool,
    /// The existing record has the same hash.
    pub is_resend: bool,
    /// Hash of the checked payload.
    pub hash: String,
}

impl DuplicateCheckResult {
    /// First sighting of an id.
    #[must_use]
    pub const fn new_message(hash: String) -> Self {
        Self {
            is_duplicate_id: false,
            is_resend: false,
            hash,
        }
    }

    /// Byte-identical resend of a known id.
    #[must_use]
    pub const fn resend(hash: String) -> Self {
        Self {
            is_duplicate_id: true,
            is_resend: true,
            hash,
        }
    }
}

/// Serialize a JSON value with object keys sorted at every depth.
#[must_use]
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                if let Some(inner) = map.get(key) {
                    write_canonical(inner, out);
                }
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => {
            let _ = write!(out, "{scalar}");
        }
    }
}

/// Hex-encoded SHA-256 of the canonical payload.
#[must_use]
pub fn payload_hash(value: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_json(value).as_bytes());
    hex::encode(hasher.finalize())
}
