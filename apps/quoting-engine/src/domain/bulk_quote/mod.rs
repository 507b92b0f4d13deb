//! Bulk Quote Bounded Context
//!
//! A bulk quote carries one payer and up to a thousand individual quotes,
//! each with its own payee.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::shared::{
    AmountType, BulkQuoteId, ExtensionList, FspId, GeoCode, Initiator, Money, Party, QuoteId,
    TransactionId, TransactionType, is_expired,
};
use crate::error::{ErrorCode, QuoteError};

/// Upper bound on individual quotes per bulk quote.
pub const MAX_INDIVIDUAL_QUOTES: usize = 1000;

/// One quote inside a bulk quote request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualQuote {
    /// Quote id.
    pub quote_id: QuoteId,
    /// Transaction id.
    pub transaction_id: TransactionId,
    /// Receiving party.
    pub payee: Party,
    /// Amount type.
    pub amount_type: AmountType,
    /// Amount.
    pub amount: Money,
    /// Fees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fees: Option<Money>,
    /// Transaction type.
    pub transaction_type: TransactionType,
    /// Memo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Extensions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension_list: Option<ExtensionList>,
}

/// `POST /bulkQuotes` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkQuoteRequest {
    /// Bulk quote id.
    pub bulk_quote_id: BulkQuoteId,
    /// Sending party, shared by every individual quote.
    pub payer: Party,
    /// Payer location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_code: Option<GeoCode>,
    /// Expiry of the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<DateTime<Utc>>,
    /// Individual quotes.
    pub individual_quotes: Vec<IndividualQuote>,
    /// Extensions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension_list: Option<ExtensionList>,
}

impl BulkQuoteRequest {
    /// Validate the bulk request and each of its individual quotes.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), QuoteError> {
        if self.payer.fsp().is_none() {
            return Err(QuoteError::missing_element("payer.partyIdInfo.fspId"));
        }
        if self.individual_quotes.is_empty() {
            return Err(QuoteError::missing_element("individualQuotes"));
        }
        if self.individual_quotes.len() > MAX_INDIVIDUAL_QUOTES {
            return Err(QuoteError::validation(format!(
                "individualQuotes exceeds {MAX_INDIVIDUAL_QUOTES} entries"
            )));
        }

        for quote in &self.individual_quotes {
            if quote.transaction_type.initiator != Initiator::Payer {
                return Err(QuoteError::new(
                    ErrorCode::UnsupportedInitiator,
                    format!(
                        "only PAYER initiated transactions are supported, quote {} is {}",
                        quote.quote_id,
                        quote.transaction_type.initiator.as_str()
                    ),
                )
                .with_context("quote_id", quote.quote_id.as_str()));
            }
            if !quote.amount.is_positive() {
                return Err(QuoteError::validation(format!(
                    "amount of quote {} must be positive",
                    quote.quote_id
                )));
            }
        }

        if is_expired(self.expiration, now) {
            return Err(QuoteError::new(
                ErrorCode::QuoteExpired,
                format!("bulk quote {} expired", self.bulk_quote_id),
            ));
        }

        Ok(())
    }
}

/// Result for one quote inside a bulk quote response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualQuoteResult {
    /// Quote id.
    pub quote_id: QuoteId,
    /// Transfer amount, absent when the quote failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer_amount: Option<Money>,
    /// ILP packet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ilp_packet: Option<String>,
    /// Condition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Per-quote error, relayed untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_information: Option<serde_json::Value>,
}

/// `PUT /bulkQuotes/{id}` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkQuoteResponse {
    /// Results per individual quote.
    #[serde(default)]
    pub individual_quote_results: Vec<IndividualQuoteResult>,
    /// Validity of the bulk quote.
    pub expiration: DateTime<Utc>,
    /// Extensions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension_list: Option<ExtensionList>,
}

/// Persisted bulk quote header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkQuoteRecord {
    /// Bulk quote id.
    pub bulk_quote_id: BulkQuoteId,
    /// FSP that sent the request.
    pub payer_fsp: FspId,
    /// FSP the request was addressed to.
    pub payee_fsp: FspId,
    /// Ids of the individual quotes.
    pub individual_quote_ids: Vec<QuoteId>,
    /// Expiry.
    pub expiration: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl BulkQuoteRecord {
    /// The counterparty of `sender`: payer sends to payee and vice versa.
    #[must_use]
    pub fn counterparty_of(&self, sender: &str) -> &FspId {
        if sender == self.payer_fsp.as_str() {
            &self.payee_fsp
        } else {
            &self.payer_fsp
        }
    }
}

/// Persisted bulk quote response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkQuoteResponseRecord {
    /// Bulk quote id.
    pub bulk_quote_id: BulkQuoteId,
    /// Ids of quotes that produced terms.
    pub accepted_quote_ids: Vec<QuoteId>,
    /// Validity.
    pub expiration: DateTime<Utc>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}
