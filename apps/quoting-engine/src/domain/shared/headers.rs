//! Scheme message headers.
//!
//! Header names are case-insensitive on the wire; they are stored lowercased.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// `FSPIOP-Source` header.
pub const FSPIOP_SOURCE: &str = "fspiop-source";
/// `FSPIOP-Destination` header.
pub const FSPIOP_DESTINATION: &str = "fspiop-destination";
/// `FSPIOP-Signature` header.
pub const FSPIOP_SIGNATURE: &str = "fspiop-signature";
/// `FSPIOP-HTTP-Method` header, covered by the signature.
pub const FSPIOP_HTTP_METHOD: &str = "fspiop-http-method";
/// `FSPIOP-URI` header, covered by the signature.
pub const FSPIOP_URI: &str = "fspiop-uri";
/// `Content-Type` header.
pub const CONTENT_TYPE: &str = "content-type";
/// `Accept` header.
pub const ACCEPT: &str = "accept";
/// `Date` header.
pub const DATE: &str = "date";

/// Transport headers never relayed to the next hop.
const HOP_BY_HOP: [&str; 5] = [
    "host",
    "content-length",
    "connection",
    "transfer-encoding",
    "keep-alive",
];

/// Case-insensitive header map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct Headers(BTreeMap<String, String>);

impl Headers {
    /// Create an empty header map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace a header.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.0.insert(name.to_ascii_lowercase(), value.into());
    }

    /// Remove a header, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.remove(&name.to_ascii_lowercase())
    }

    /// Get a header value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Returns true if the header is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(&name.to_ascii_lowercase())
    }

    /// The declared source FSP.
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.get(FSPIOP_SOURCE).filter(|v| !v.is_empty())
    }

    /// The declared destination FSP.
    #[must_use]
    pub fn destination(&self) -> Option<&str> {
        self.get(FSPIOP_DESTINATION).filter(|v| !v.is_empty())
    }

    /// The signature header, if any.
    #[must_use]
    pub fn signature(&self) -> Option<&str> {
        self.get(FSPIOP_SIGNATURE).filter(|v| !v.is_empty())
    }

    /// Copy of these headers without transport-level entries.
    #[must_use]
    pub fn relayable(&self) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(name, _)| !HOP_BY_HOP.contains(&name.as_str()))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        )
    }

    /// Iterate over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// JSON object view, used as a rules fact.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect(),
        )
    }
}

impl From<BTreeMap<String, String>> for Headers {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(
            map.into_iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v))
                .collect(),
        )
    }
}

impl From<Headers> for BTreeMap<String, String> {
    fn from(headers: Headers) -> Self {
        headers.0
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for Headers {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// Versioned scheme media type, e.g.
/// `application/vnd.interoperability.quotes+json;version=1.0`.
#[must_use]
pub fn interop_content_type(resource: &str, version: &str) -> String {
    format!("application/vnd.interoperability.{resource}+json;version={version}")
}

/// HTTP date for the `date` header.
#[must_use]
pub fn http_date(now: chrono::DateTime<chrono::Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
