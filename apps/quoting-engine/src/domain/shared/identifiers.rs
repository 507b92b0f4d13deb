//! Strongly-typed identifiers for quoting entities.
//!
//! These prevent mixing up ids from different resource families.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier from a string.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Generate a new unique identifier using UUID v4.
            #[must_use]
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// Get the inner string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

define_id!(QuoteId, "Scheme-wide quote identifier, assigned by the payer FSP.");
define_id!(TransactionId, "Identifier of the transaction a quote negotiates.");
define_id!(QuoteResponseId, "Switch-generated identifier of a persisted quote response.");
define_id!(BulkQuoteId, "Identifier of a bulk quote.");
define_id!(ConversionRequestId, "Identifier of an fx-quote conversion request.");
define_id!(ConversionId, "Identifier of the conversion an fx-quote prices.");
define_id!(FspId, "Name of a financial service provider.");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_id_new_and_display() {
        let id = QuoteId::new("b51ec534-ee48-4575-b6a9-ead2955b8069");
        assert_eq!(id.as_str(), "b51ec534-ee48-4575-b6a9-ead2955b8069");
        assert_eq!(format!("{id}"), "b51ec534-ee48-4575-b6a9-ead2955b8069");
    }

    #[test]
    fn response_id_generate_is_unique() {
        assert_ne!(QuoteResponseId::generate(), QuoteResponseId::generate());
    }

    #[test]
    fn fsp_id_from_str() {
        let id: FspId = "payerfsp".into();
        assert_eq!(id.into_inner(), "payerfsp");
    }

    #[test]
    fn ids_serialize_transparently() {
        let id = BulkQuoteId::new("bq-1");
        assert_eq!(serde_json::to_value(&id).unwrap(), serde_json::json!("bq-1"));
    }
}
