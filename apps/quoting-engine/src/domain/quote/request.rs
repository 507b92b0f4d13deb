//! Quote request message.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::shared::{
    AmountType, ExtensionList, FspId, GeoCode, Initiator, Money, Party, QuoteId, TransactionId,
    TransactionType, is_expired,
};
use crate::error::{ErrorCode, QuoteError};

/// `POST /quotes` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    /// Quote id, unique scheme-wide.
    pub quote_id: QuoteId,
    /// Transaction the quote is for.
    pub transaction_id: TransactionId,
    /// Originating transaction request, for payee-initiated flows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_request_id: Option<String>,
    /// Receiving party.
    pub payee: Party,
    /// Sending party.
    pub payer: Party,
    /// Whether `amount` is sent or received.
    pub amount_type: AmountType,
    /// Quoted amount.
    pub amount: Money,
    /// Payer fees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fees: Option<Money>,
    /// Transaction type.
    pub transaction_type: TransactionType,
    /// Payer location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_code: Option<GeoCode>,
    /// Free-text memo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Expiry of the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<DateTime<Utc>>,
    /// Extensions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension_list: Option<ExtensionList>,
}

impl QuoteRequest {
    /// Structural and scheme validation that needs no collaborator.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), QuoteError> {
        if self.payer.fsp().is_none() {
            return Err(QuoteError::missing_element("payer.partyIdInfo.fspId"));
        }
        if self.payee.fsp().is_none() {
            return Err(QuoteError::missing_element("payee.partyIdInfo.fspId"));
        }

        if self.transaction_type.initiator != Initiator::Payer {
            return Err(QuoteError::new(
                ErrorCode::UnsupportedInitiator,
                format!(
                    "only PAYER initiated transactions are supported, got {}",
                    self.transaction_type.initiator.as_str()
                ),
            )
            .with_context("quote_id", self.quote_id.as_str()));
        }

        if !self.amount.is_positive() {
            return Err(QuoteError::validation("amount must be positive")
                .with_context("quote_id", self.quote_id.as_str()));
        }
        if !self.amount.has_valid_currency() {
            return Err(QuoteError::validation(format!(
                "invalid currency code '{}'",
                self.amount.currency
            )));
        }

        if is_expired(self.expiration, now) {
            return Err(QuoteError::new(
                ErrorCode::QuoteExpired,
                format!("quote {} expired", self.quote_id),
            )
            .with_context("quote_id", self.quote_id.as_str()));
        }

        Ok(())
    }

    /// Payer FSP name.
    #[must_use]
    pub fn payer_fsp(&self) -> Option<&FspId> {
        self.payer.fsp()
    }

    /// Payee FSP name.
    #[must_use]
    pub fn payee_fsp(&self) -> Option<&FspId> {
        self.payee.fsp()
    }

    /// Currencies the payer must hold a position account for.
    ///
    /// The declared `supportedCurrencies` when present, otherwise the quote
    /// currency.
    #[must_use]
    pub fn payer_currencies(&self) -> Vec<String> {
        let mut currencies = match &self.payer.supported_currencies {
            Some(declared) if !declared.is_empty() => declared.clone(),
            _ => vec![self.amount.currency.clone()],
        };
        currencies.sort();
        currencies.dedup();
        currencies
    }

    /// Party amounts as persisted: payer `+amount`, payee `-amount`.
    #[must_use]
    pub fn party_amounts(&self) -> (Money, Money) {
        (self.amount.clone(), -self.amount.clone())
    }
}
