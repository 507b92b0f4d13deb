//! FX Quote Bounded Context
//!
//! Conversion quotes between a payer-side FSP and a foreign-exchange
//! provider, keyed by `conversionRequestId`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{
    AmountType, ConversionId, ConversionRequestId, ExtensionList, FspId, Money, is_expired,
};
use crate::error::{ErrorCode, QuoteError};

/// Currency with an amount that may be left for the counterparty to fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FxMoney {
    /// ISO 4217 currency code.
    pub currency: String,
    /// Amount, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
}

/// Charge applied to a conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FxCharge {
    /// Charge description.
    pub charge_type: String,
    /// Charge in the source currency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_amount: Option<Money>,
    /// Charge in the target currency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_amount: Option<Money>,
}

/// Terms of a currency conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionTerms {
    /// Conversion id.
    pub conversion_id: ConversionId,
    /// Transfer the conversion is attached to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub determining_transfer_id: Option<String>,
    /// FSP requesting the conversion.
    pub initiating_fsp: FspId,
    /// FX provider.
    pub counter_party_fsp: FspId,
    /// Which side of the conversion is fixed.
    pub amount_type: AmountType,
    /// Source side.
    pub source_amount: FxMoney,
    /// Target side.
    pub target_amount: FxMoney,
    /// Validity.
    pub expiration: DateTime<Utc>,
    /// Charges.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charges: Option<Vec<FxCharge>>,
    /// Extensions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension_list: Option<ExtensionList>,
}

impl ConversionTerms {
    fn validate_currencies(&self) -> Result<(), QuoteError> {
        if self.source_amount.currency == self.target_amount.currency {
            return Err(QuoteError::validation(format!(
                "source and target currency must differ, both are {}",
                self.source_amount.currency
            )));
        }
        Ok(())
    }
}

/// `POST /fxQuotes` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FxQuoteRequest {
    /// Conversion request id.
    pub conversion_request_id: ConversionRequestId,
    /// Requested terms.
    pub conversion_terms: ConversionTerms,
}

impl FxQuoteRequest {
    /// Validate against the declared source header.
    pub fn validate(&self, source: &str, now: DateTime<Utc>) -> Result<(), QuoteError> {
        let terms = &self.conversion_terms;
        terms.validate_currencies()?;

        match terms.amount_type {
            AmountType::Send if terms.source_amount.amount.is_none() => {
                return Err(QuoteError::missing_element(
                    "conversionTerms.sourceAmount.amount",
                ));
            }
            AmountType::Receive if terms.target_amount.amount.is_none() => {
                return Err(QuoteError::missing_element(
                    "conversionTerms.targetAmount.amount",
                ));
            }
            _ => {}
        }

        if terms.initiating_fsp.as_str() != source {
            return Err(QuoteError::validation(format!(
                "initiatingFsp {} does not match source {source}",
                terms.initiating_fsp
            ))
            .with_context("conversion_request_id", self.conversion_request_id.as_str()));
        }

        if is_expired(Some(terms.expiration), now) {
            return Err(QuoteError::new(
                ErrorCode::QuoteExpired,
                format!("fx quote {} expired", self.conversion_request_id),
            ));
        }

        Ok(())
    }
}

/// `PUT /fxQuotes/{id}` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FxQuoteResponse {
    /// Commitment for the conversion.
    pub condition: String,
    /// Final terms.
    pub conversion_terms: ConversionTerms,
}

impl FxQuoteResponse {
    /// Both sides must be priced in a response.
    pub fn validate(&self) -> Result<(), QuoteError> {
        self.conversion_terms.validate_currencies()?;
        if self.conversion_terms.source_amount.amount.is_none() {
            return Err(QuoteError::missing_element(
                "conversionTerms.sourceAmount.amount",
            ));
        }
        if self.conversion_terms.target_amount.amount.is_none() {
            return Err(QuoteError::missing_element(
                "conversionTerms.targetAmount.amount",
            ));
        }
        if self.condition.is_empty() {
            return Err(QuoteError::missing_element("condition"));
        }
        Ok(())
    }
}

/// Persisted conversion request with its terms and charges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FxQuoteRecord {
    /// Conversion request id.
    pub conversion_request_id: ConversionRequestId,
    /// Conversion id.
    pub conversion_id: ConversionId,
    /// Determining transfer.
    pub determining_transfer_id: Option<String>,
    /// Initiating FSP.
    pub initiating_fsp: FspId,
    /// FX provider.
    pub counter_party_fsp: FspId,
    /// Amount type.
    pub amount_type: AmountType,
    /// Source side.
    pub source_amount: FxMoney,
    /// Target side.
    pub target_amount: FxMoney,
    /// Validity.
    pub expiration: DateTime<Utc>,
    /// Charges.
    pub charges: Vec<FxCharge>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl FxQuoteRecord {
    /// The counterparty of `sender`.
    #[must_use]
    pub fn counterparty_of(&self, sender: &str) -> &FspId {
        if sender == self.initiating_fsp.as_str() {
            &self.counter_party_fsp
        } else {
            &self.initiating_fsp
        }
    }
}

/// Persisted conversion response terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FxQuoteResponseRecord {
    /// Conversion request id.
    pub conversion_request_id: ConversionRequestId,
    /// Conversion id.
    pub conversion_id: ConversionId,
    /// Commitment.
    pub condition: String,
    /// Priced source side.
    pub source_amount: FxMoney,
    /// Priced target side.
    pub target_amount: FxMoney,
    /// Validity.
    pub expiration: DateTime<Utc>,
    /// Charges.
    pub charges: Vec<FxCharge>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}
