//! Shared Domain Types
//!
//! Value objects shared by the quote, bulk-quote and fx-quote contexts.

pub mod headers;
pub mod identifiers;
pub mod money;
pub mod party;
pub mod resource;

use serde::de::DeserializeOwned;

pub use headers::Headers;
pub use identifiers::{
    BulkQuoteId, ConversionId, ConversionRequestId, FspId, QuoteId, QuoteResponseId,
    TransactionId,
};
pub use money::Money;
pub use party::{
    AmountType, ComplexName, Extension, ExtensionList, GeoCode, Initiator, Party, PartyIdInfo,
    PersonalInfo, TransactionType,
};
pub use resource::{Action, EndpointType, ResourceType};

use crate::error::QuoteError;

/// Decode a JSON payload into a typed message.
///
/// Missing fields map to "missing mandatory element", anything else that
/// fails to decode is "malformed syntax".
pub fn decode_payload<T: DeserializeOwned>(payload: &serde_json::Value) -> Result<T, QuoteError> {
    T::deserialize(payload).map_err(|e| {
        let message = e.to_string();
        if let Some(field) = message
            .strip_prefix("missing field `")
            .and_then(|rest| rest.split('`').next())
        {
            QuoteError::missing_element(field)
        } else {
            QuoteError::malformed(message)
        }
    })
}

/// Returns true if the expiration timestamp has already passed.
#[must_use]
pub fn is_expired(
    expiration: Option<chrono::DateTime<chrono::Utc>>,
    now: chrono::DateTime<chrono::Utc>,
) -> bool {
    expiration.is_some_and(|at| at < now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[derive(Debug, serde::Deserialize)]
    #[allow(dead_code)]
    struct Sample {
        id: String,
        count: u32,
    }

    #[test]
    fn decode_missing_field_is_missing_element() {
        let err = decode_payload::<Sample>(&serde_json::json!({"count": 1})).unwrap_err();
        assert_eq!(err.code(), ErrorCode::MissingElement);
        assert_eq!(err.context_value("element"), Some("id"));
    }

    #[test]
    fn decode_wrong_type_is_malformed() {
        let err =
            decode_payload::<Sample>(&serde_json::json!({"id": "a", "count": "x"})).unwrap_err();
        assert_eq!(err.code(), ErrorCode::MalformedSyntax);
    }

    #[test]
    fn expiration_check() {
        let now = chrono::Utc::now();
        assert!(is_expired(Some(now - chrono::Duration::seconds(1)), now));
        assert!(!is_expired(Some(now + chrono::Duration::seconds(60)), now));
        assert!(!is_expired(None, now));
    }
}
