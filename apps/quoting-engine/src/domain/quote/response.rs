//! Quote response message.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::shared::{ExtensionList, GeoCode, Money};
use crate::error::QuoteError;

/// `PUT /quotes/{id}` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    /// Amount the payer FSP transfers.
    pub transfer_amount: Money,
    /// Amount the payee receives.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payee_receive_amount: Option<Money>,
    /// Payee FSP fee.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payee_fsp_fee: Option<Money>,
    /// Payee FSP commission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payee_fsp_commission: Option<Money>,
    /// Validity of the quote.
    pub expiration: DateTime<Utc>,
    /// Payee location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_code: Option<GeoCode>,
    /// ILP packet.
    pub ilp_packet: String,
    /// Cryptographic commitment for the transfer.
    pub condition: String,
    /// Extensions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension_list: Option<ExtensionList>,
}

impl QuoteResponse {
    /// Validate the response terms.
    pub fn validate(&self) -> Result<(), QuoteError> {
        if !self.transfer_amount.is_positive() {
            return Err(QuoteError::validation("transferAmount must be positive"));
        }
        if self.condition.is_empty() {
            return Err(QuoteError::missing_element("condition"));
        }
        if self.ilp_packet.is_empty() {
            return Err(QuoteError::missing_element("ilpPacket"));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::{Value, json};

    /// A valid quote response payload.
    pub(crate) fn quote_response_payload() -> Value {
        json!({
            "transferAmount": {"amount": "101", "currency": "USD"},
            "payeeReceiveAmount": {"amount": "100", "currency": "USD"},
            "payeeFspFee": {"amount": "1", "currency": "USD"},
            "expiration": "2099-01-01T00:00:00.000Z",
            "ilpPacket": "AYIBgQAAAAAAAASwNGxldmVsb25lLmRmc3AxLm1lci45T2RTOF81MDdqUUZERmZlakgyOVc4bXFmNEpLMHlGTFGCAUBQU0svMS4wCk5vbmNlOiB1SXlweUYzY3pYSXBFdzVVc05TYWh3CkVuY3J5cHRpb246IG5vbmUKUGF5bWVudC1JZDogMTMyMzZhM2ItOGZhOC00MTYzLTg0NDctNGMzZWQzZGE5OGE3CgpDb250ZW50LUxlbmd0aDogMTM1CkNvbnRlbnQtVHlwZTogYXBwbGljYXRpb24vanNvbgpTZW5kZXItSWRlbnRpZmllcjogOTI4MDYzOTEKCiJ7XCJmZWVcIjowLFwidHJhbnNmZXJDb2RlXCI6XCJpbnZvaWNlXCIsXCJkZWJpdE5hbWVcIjpcImFsaWNlIGNvb3BlclwiLFwiY3JlZGl0TmFtZVwiOlwibWVyIGNoYW50XCIsXCJkZWJpdElkZW50aWZpZXJcIjpcIjkyODA2MzkxXCJ9IgA",
            "condition": "f5sqb7tBTWPd5Y8BDFdMm9BJR_MNI4isf8p8n4D5pHA"
        })
    }
}
