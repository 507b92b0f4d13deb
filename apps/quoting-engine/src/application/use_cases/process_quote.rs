//! Quote Processor
//!
//! Drives `POST /quotes`, `PUT /quotes/{id}`, `PUT /quotes/{id}/error` and
//! `GET /quotes/{id}` through validation, duplicate detection, persistence,
//! business rules and forwarding.

use chrono::Utc;
use serde_json::{Value, json};

use super::common::{
    declared_destination, decode_error_body, forward_to, log_only, persist_error, reject,
    relay_error, relay_get, write_once,
};
use super::context::EngineContext;
use crate::application::dto::{InboundMessage, ProcessOutcome};
use crate::application::ports::{
    EnumLookup, HttpMethod, PRINCIPLE_VALUE, ParticipantAccount, PersistenceError,
    ReferenceDataPort,
};
use crate::application::services::{CallbackPath, ParticipantLocation, PendingWrite};
use crate::domain::duplicate::DuplicateKind;
use crate::domain::quote::{
    PartyPersonalInfoRecord, PartyRole, QuoteExtensionRecord, QuotePartyRecord, QuoteRecord,
    QuoteRequest, QuoteResponse, QuoteResponseRecord, QuoteState, TransactionReferenceRecord,
};
use crate::domain::rules::{EventType, Facts, RuleEvent, evaluate};
use crate::domain::shared::{
    Action, ExtensionList, FspId, Money, Party, QuoteId, QuoteResponseId, ResourceType,
    decode_payload,
};
use crate::error::{ErrorCode, QuoteError};

/// Reference ids of one party row.
struct PartyRefs {
    party_type_id: i64,
    identifier_type_id: i64,
    role_type_id: i64,
}

/// Processor for the quote resource family.
#[derive(Debug, Clone)]
pub struct QuoteProcessor {
    ctx: EngineContext,
}

impl QuoteProcessor {
    /// Create a processor over a wired engine context.
    #[must_use]
    pub const fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    /// Route a message to the handler for its action.
    pub async fn handle(&self, message: &InboundMessage) -> ProcessOutcome {
        match message.action {
            Action::Post => self.process_request(message).await,
            Action::Put => self.process_response(message).await,
            Action::Error => self.process_error(message).await,
            Action::Get => self.process_get(message).await,
        }
    }

    // ========================================================================
    // POST /quotes
    // ========================================================================

    /// Handle a quote request.
    pub async fn process_request(&self, message: &InboundMessage) -> ProcessOutcome {
        let mut state = QuoteState::Received;
        match self.run_request(message, &mut state).await {
            Ok(outcome) => outcome,
            Err(error) => reject(&self.ctx, message, error, state).await,
        }
    }

    async fn run_request(
        &self,
        message: &InboundMessage,
        state: &mut QuoteState,
    ) -> Result<ProcessOutcome, QuoteError> {
        let request: QuoteRequest = decode_payload(&message.payload)?;
        request.validate(Utc::now())?;

        let payer_fsp = party_fsp(request.payer_fsp(), "payer.partyIdInfo.fspId")?;
        let payee_fsp = party_fsp(request.payee_fsp(), "payee.partyIdInfo.fspId")?;
        let quote_id = request.quote_id.as_str();

        let payer = self.ctx.resolver.locate(payer_fsp).await?;
        let payer_id = known_participant(&payer, payer_fsp, ErrorCode::PayerFspIdNotFound)?;
        if payer.is_local() {
            self.check_payer_currencies(payer_fsp, &request).await?;
        }
        *state = QuoteState::Validated;

        let mut resend = false;
        if !self.ctx.is_simple_routing() {
            let check = self
                .ctx
                .duplicates
                .check_request(DuplicateKind::QuoteRequest, quote_id, &message.payload)
                .await?;
            *state = QuoteState::DedupeChecked;

            if check.is_resend {
                resend = true;
            } else {
                let payee = self.ctx.resolver.locate(payee_fsp).await?;
                let payee_id =
                    known_participant(&payee, payee_fsp, ErrorCode::PayeeFspIdNotFound)?;
                let writes = self.quote_records(&request, payer_id, payee_id).await?;
                resend = write_once(
                    &self.ctx,
                    DuplicateKind::QuoteRequest,
                    quote_id,
                    &check.hash,
                    writes,
                )
                .await?;
                if !resend {
                    *state = QuoteState::Persisted;
                    tracing::info!(quote_id, payer = payer_fsp, payee = payee_fsp, "quote persisted");
                }
            }
        }

        // Resends are re-evaluated: a held or rejected quote is already stored.
        let events = self.evaluate_rules(message, payer_fsp, payee_fsp).await?;
        if let Some(invalid) = events
            .iter()
            .find(|event| event.event_type == EventType::InvalidQuoteRequest)
        {
            return Err(invalid.to_error());
        }
        if events
            .iter()
            .any(|event| event.event_type == EventType::InterceptQuote)
        {
            *state = QuoteState::Held;
            tracing::info!(quote_id, resend, "quote held by business rule");
            return Ok(ProcessOutcome::Held { events });
        }
        *state = QuoteState::RuleEvaluated;

        let destination = message.headers.destination().unwrap_or(payee_fsp);
        let delivered = forward_to(
            &self.ctx,
            destination,
            message,
            HttpMethod::Post,
            CallbackPath::Collection,
            quote_id,
            state,
        )
        .await?;
        Ok(delivered.into_outcome(resend, events))
    }

    async fn check_payer_currencies(
        &self,
        payer: &str,
        request: &QuoteRequest,
    ) -> Result<(), QuoteError> {
        let accounts = self.accounts_of(payer).await?;
        for currency in request.payer_currencies() {
            if !accounts
                .iter()
                .any(|account| account.is_active_position_in(&currency))
            {
                return Err(QuoteError::new(
                    ErrorCode::UnsupportedParticipant,
                    format!("Payer FSP {payer} has no active position account in {currency}"),
                )
                .with_context("participant", payer)
                .with_context("currency", currency));
            }
        }
        Ok(())
    }

    async fn accounts_of(&self, participant: &str) -> Result<Vec<ParticipantAccount>, QuoteError> {
        match self.ctx.reference_data.participant_accounts(participant).await {
            Ok(accounts) => Ok(accounts),
            Err(PersistenceError::NotFound { .. }) => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn quote_records(
        &self,
        request: &QuoteRequest,
        payer_id: i64,
        payee_id: i64,
    ) -> Result<Vec<PendingWrite>, QuoteError> {
        let reference = self.ctx.reference_data.as_ref();
        let transaction_type = &request.transaction_type;

        let (
            initiator_id,
            initiator_type_id,
            scenario_id,
            amount_type_id,
            ledger_entry_type_id,
            payer_refs,
            payee_refs,
        ) = tokio::try_join!(
            reference.lookup_id(
                EnumLookup::TransactionInitiator,
                transaction_type.initiator.as_str()
            ),
            reference.lookup_id(
                EnumLookup::TransactionInitiatorType,
                &transaction_type.initiator_type
            ),
            reference.lookup_id(EnumLookup::TransactionScenario, &transaction_type.scenario),
            reference.lookup_id(EnumLookup::AmountType, request.amount_type.as_str()),
            reference.lookup_id(EnumLookup::LedgerEntryType, PRINCIPLE_VALUE),
            party_refs(reference, PartyRole::Payer, &request.payer),
            party_refs(reference, PartyRole::Payee, &request.payee),
        )?;

        let now = Utc::now();
        let quote_id = &request.quote_id;
        let (payer_amount, payee_amount) = request.party_amounts();

        let mut writes = vec![
            PendingWrite::TransactionReference(TransactionReferenceRecord {
                transaction_reference_id: request.transaction_id.clone(),
                quote_id: quote_id.clone(),
                created_at: now,
            }),
            PendingWrite::Quote(QuoteRecord {
                quote_id: quote_id.clone(),
                transaction_reference_id: request.transaction_id.clone(),
                transaction_request_id: request.transaction_request_id.clone(),
                note: request.note.clone(),
                expiration: request.expiration,
                transaction_initiator_id: initiator_id,
                transaction_initiator_type_id: initiator_type_id,
                transaction_scenario_id: scenario_id,
                transaction_sub_scenario: transaction_type.sub_scenario.clone(),
                balance_of_payments: transaction_type.balance_of_payments.clone(),
                amount_type_id,
                amount: request.amount.clone(),
                created_at: now,
            }),
        ];

        for (role, party, refs, participant_id, amount) in [
            (PartyRole::Payer, &request.payer, payer_refs, payer_id, payer_amount),
            (PartyRole::Payee, &request.payee, payee_refs, payee_id, payee_amount),
        ] {
            writes.push(PendingWrite::QuoteParty(party_record(
                quote_id,
                role,
                party,
                &refs,
                participant_id,
                ledger_entry_type_id,
                amount,
            )?));
        }

        let extensions = extension_records(quote_id, None, request.extension_list.as_ref());
        if !extensions.is_empty() {
            writes.push(PendingWrite::QuoteExtensions(extensions));
        }
        Ok(writes)
    }

    async fn evaluate_rules(
        &self,
        message: &InboundMessage,
        payer: &str,
        payee: &str,
    ) -> Result<Vec<RuleEvent>, QuoteError> {
        if self.ctx.rules.is_empty() {
            return Ok(Vec::new());
        }

        let (payer_accounts, payee_accounts) =
            tokio::try_join!(self.accounts_of(payer), self.accounts_of(payee))?;
        let facts = Facts::new()
            .with("payload", message.payload.clone())
            .with("headers", message.headers.to_json())
            .with("payer", participant_fact(payer, &payer_accounts)?)
            .with("payee", participant_fact(payee, &payee_accounts)?);

        let events = evaluate(&self.ctx.rules, &facts);
        for event in &events {
            tracing::debug!(event = %event.event_type, "rule fired");
        }
        Ok(events)
    }

    // ========================================================================
    // PUT /quotes/{id}
    // ========================================================================

    /// Handle a quote response.
    pub async fn process_response(&self, message: &InboundMessage) -> ProcessOutcome {
        let mut state = QuoteState::Received;
        match self.run_response(message, &mut state).await {
            Ok(outcome) => outcome,
            Err(error) => reject(&self.ctx, message, error, state).await,
        }
    }

    async fn run_response(
        &self,
        message: &InboundMessage,
        state: &mut QuoteState,
    ) -> Result<ProcessOutcome, QuoteError> {
        let quote_id = message.require_id()?;
        let response: QuoteResponse = decode_payload(&message.payload)?;
        response.validate()?;
        *state = QuoteState::Validated;

        if self.ctx.is_simple_routing() {
            let destination = declared_destination(message)?;
            let delivered = forward_to(
                &self.ctx,
                destination,
                message,
                HttpMethod::Put,
                CallbackPath::Item,
                quote_id,
                state,
            )
            .await?;
            return Ok(delivered.into_outcome(false, Vec::new()));
        }

        let check = self
            .ctx
            .duplicates
            .check_response(DuplicateKind::QuoteResponse, quote_id, &message.payload)
            .await?;
        *state = QuoteState::DedupeChecked;

        if self.ctx.repository.get_quote(quote_id).await?.is_none() {
            return Err(QuoteError::new(
                ErrorCode::QuoteIdNotFound,
                format!("Quote {quote_id} not found"),
            )
            .with_context("quote_id", quote_id));
        }

        let mut resend = check.is_resend;
        if !resend {
            let record_id = QuoteId::new(quote_id);
            let response_id = QuoteResponseId::generate();
            let mut writes = vec![PendingWrite::QuoteResponse(response_record(
                &record_id,
                &response_id,
                &response,
            ))];
            let extensions = extension_records(
                &record_id,
                Some(&response_id),
                response.extension_list.as_ref(),
            );
            if !extensions.is_empty() {
                writes.push(PendingWrite::QuoteExtensions(extensions));
            }
            resend = write_once(
                &self.ctx,
                DuplicateKind::QuoteResponse,
                quote_id,
                &check.hash,
                writes,
            )
            .await?;
            if !resend {
                *state = QuoteState::Persisted;
                tracing::info!(quote_id, quote_response_id = %response_id, "quote response persisted");
            }
        }

        let payer = match self.party_fsp_of(quote_id, PartyRole::Payer).await? {
            Some(payer) => payer,
            None => declared_destination(message)?.to_string(),
        };
        let delivered = forward_to(
            &self.ctx,
            &payer,
            message,
            HttpMethod::Put,
            CallbackPath::Item,
            quote_id,
            state,
        )
        .await?;
        Ok(delivered.into_outcome(resend, Vec::new()))
    }

    async fn party_fsp_of(
        &self,
        quote_id: &str,
        role: PartyRole,
    ) -> Result<Option<String>, QuoteError> {
        let parties = self.ctx.repository.get_quote_parties(quote_id).await?;
        Ok(parties
            .into_iter()
            .find(|party| party.role == role)
            .map(|party| party.fsp_id.into_inner()))
    }

    // ========================================================================
    // PUT /quotes/{id}/error
    // ========================================================================

    /// Handle an error callback for a quote. Failures are logged only.
    pub async fn process_error(&self, message: &InboundMessage) -> ProcessOutcome {
        let mut state = QuoteState::Received;
        match self.run_error(message, &mut state).await {
            Ok(outcome) => outcome,
            Err(error) => log_only(message, error, state),
        }
    }

    async fn run_error(
        &self,
        message: &InboundMessage,
        state: &mut QuoteState,
    ) -> Result<ProcessOutcome, QuoteError> {
        let quote_id = message.require_id()?;
        let body = decode_error_body(message)?;
        *state = QuoteState::Validated;

        let mut counterparty = None;
        if !self.ctx.is_simple_routing() && self.ctx.repository.get_quote(quote_id).await?.is_some()
        {
            persist_error(&self.ctx, ResourceType::Quote, quote_id, &body).await?;
            *state = QuoteState::Persisted;
            tracing::info!(
                quote_id,
                error_code = %body.error_information.error_code,
                "quote error persisted"
            );

            let sender = message.headers.source().unwrap_or_default();
            let payer = self.party_fsp_of(quote_id, PartyRole::Payer).await?;
            counterparty = if payer.as_deref() == Some(sender) {
                self.party_fsp_of(quote_id, PartyRole::Payee).await?
            } else {
                payer
            };
        }

        relay_error(&self.ctx, message, quote_id, counterparty, state).await
    }

    // ========================================================================
    // GET /quotes/{id}
    // ========================================================================

    /// Relay a quote lookup to the declared destination.
    pub async fn process_get(&self, message: &InboundMessage) -> ProcessOutcome {
        let mut state = QuoteState::Received;
        match relay_get(&self.ctx, message, &mut state).await {
            Ok(outcome) => outcome,
            Err(error) => reject(&self.ctx, message, error, state).await,
        }
    }
}

fn party_fsp<'a>(fsp: Option<&'a FspId>, element: &str) -> Result<&'a str, QuoteError> {
    fsp.map(FspId::as_str)
        .ok_or_else(|| QuoteError::missing_element(element))
}

fn known_participant(
    location: &ParticipantLocation,
    participant: &str,
    code: ErrorCode,
) -> Result<i64, QuoteError> {
    location.participant_id().ok_or_else(|| {
        QuoteError::new(code, format!("Participant {participant} is not registered"))
            .with_context("participant", participant)
    })
}

async fn party_refs(
    reference: &dyn ReferenceDataPort,
    role: PartyRole,
    party: &Party,
) -> Result<PartyRefs, PersistenceError> {
    let (party_type_id, identifier_type_id, role_type_id) = tokio::try_join!(
        reference.lookup_id(EnumLookup::PartyType, role.as_str()),
        reference.lookup_id(
            EnumLookup::PartyIdentifierType,
            &party.party_id_info.party_id_type
        ),
        reference.lookup_id(EnumLookup::TransferParticipantRoleType, role.participant_role()),
    )?;
    Ok(PartyRefs {
        party_type_id,
        identifier_type_id,
        role_type_id,
    })
}

fn party_record(
    quote_id: &QuoteId,
    role: PartyRole,
    party: &Party,
    refs: &PartyRefs,
    participant_id: i64,
    ledger_entry_type_id: i64,
    amount: Money,
) -> Result<QuotePartyRecord, QuoteError> {
    let fsp_id = party
        .fsp()
        .cloned()
        .ok_or_else(|| QuoteError::missing_element("partyIdInfo.fspId"))?;
    Ok(QuotePartyRecord {
        quote_id: quote_id.clone(),
        role,
        party_type_id: refs.party_type_id,
        party_identifier_type_id: refs.identifier_type_id,
        party_identifier_value: party.party_id_info.party_identifier.clone(),
        party_sub_id_or_type: party.party_id_info.party_sub_id_or_type.clone(),
        fsp_id,
        participant_id,
        transfer_participant_role_type_id: refs.role_type_id,
        ledger_entry_type_id,
        amount,
        merchant_classification_code: party.merchant_classification_code.clone(),
        personal_info: party.personal_info.as_ref().map(|info| {
            let name = info.complex_name.clone().unwrap_or_default();
            PartyPersonalInfoRecord {
                first_name: name.first_name,
                middle_name: name.middle_name,
                last_name: name.last_name,
                date_of_birth: info.date_of_birth.clone(),
            }
        }),
    })
}

fn response_record(
    quote_id: &QuoteId,
    response_id: &QuoteResponseId,
    response: &QuoteResponse,
) -> QuoteResponseRecord {
    QuoteResponseRecord {
        quote_response_id: response_id.clone(),
        quote_id: quote_id.clone(),
        transfer_amount: response.transfer_amount.clone(),
        payee_receive_amount: response.payee_receive_amount.clone(),
        payee_fsp_fee: response.payee_fsp_fee.clone(),
        payee_fsp_commission: response.payee_fsp_commission.clone(),
        ilp_condition: response.condition.clone(),
        ilp_packet: response.ilp_packet.clone(),
        expiration: response.expiration,
        geo_code: response.geo_code.clone(),
        is_valid: true,
        created_at: Utc::now(),
    }
}

fn extension_records(
    quote_id: &QuoteId,
    response_id: Option<&QuoteResponseId>,
    list: Option<&ExtensionList>,
) -> Vec<QuoteExtensionRecord> {
    list.map(|list| {
        list.extension
            .iter()
            .map(|extension| QuoteExtensionRecord {
                quote_id: quote_id.clone(),
                quote_response_id: response_id.cloned(),
                key: extension.key.clone(),
                value: extension.value.clone(),
            })
            .collect()
    })
    .unwrap_or_default()
}

fn participant_fact(name: &str, accounts: &[ParticipantAccount]) -> Result<Value, QuoteError> {
    let accounts = serde_json::to_value(accounts)
        .map_err(|e| QuoteError::internal(format!("failed to encode accounts: {e}")))?;
    Ok(json!({"name": name, "accounts": accounts}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{ForwardError, MockSignerPort};
    use crate::application::use_cases::EngineSettings;
    use crate::application::use_cases::test_support::{TestEngine, engine, message, signing_engine};
    use crate::domain::quote::request::fixtures::quote_request_payload;
    use crate::domain::quote::response::fixtures::quote_response_payload;
    use crate::domain::rules::parse_rules;
    use crate::domain::shared::headers::FSPIOP_SIGNATURE;
    use rust_decimal::Decimal;
    use std::sync::Arc;

    fn post(payload: Value) -> InboundMessage {
        message(ResourceType::Quote, Action::Post, "payerfsp", "payeefsp", payload)
    }

    fn put(quote_id: &str, payload: Value) -> InboundMessage {
        message(ResourceType::Quote, Action::Put, "payeefsp", "payerfsp", payload)
            .with_uri_id(quote_id)
    }

    fn processor(settings: EngineSettings) -> (QuoteProcessor, TestEngine) {
        let test = engine(settings, Vec::new());
        (QuoteProcessor::new(test.ctx.clone()), test)
    }

    #[tokio::test]
    async fn usd_request_is_persisted_and_forwarded_to_payee() {
        let (processor, test) = processor(EngineSettings::default());

        let outcome = processor
            .handle(&post(quote_request_payload("q-1", "USD")))
            .await;

        let ProcessOutcome::Forwarded {
            destination, url, resend, ..
        } = outcome
        else {
            panic!("expected forward, got {outcome:?}");
        };
        assert_eq!(destination, "payeefsp");
        assert_eq!(url, "http://payeefsp.local/quotes");
        assert!(!resend);

        assert_eq!(test.repository.quote_count(), 1);
        let parties = test.repository.parties_for("q-1");
        assert_eq!(parties.len(), 2);
        let payer = parties.iter().find(|p| p.role == PartyRole::Payer).unwrap();
        let payee = parties.iter().find(|p| p.role == PartyRole::Payee).unwrap();
        assert_eq!(payer.amount.amount, Decimal::from(100));
        assert_eq!(payee.amount.amount, Decimal::from(-100));
        assert_eq!(
            payer.personal_info.as_ref().and_then(|i| i.first_name.as_deref()),
            Some("Mats")
        );
        assert_eq!(test.repository.extension_count(), 1);

        let requests = test.client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, HttpMethod::Post);
        assert_eq!(requests[0].headers.destination(), Some("payeefsp"));
        assert_eq!(requests[0].body.as_ref(), Some(&quote_request_payload("q-1", "USD")));
    }

    #[tokio::test]
    async fn currency_without_position_is_unsupported_participant() {
        let (processor, test) = processor(EngineSettings::default());

        let outcome = processor
            .handle(&post(quote_request_payload("q-1", "GBP")))
            .await;

        let ProcessOutcome::Rejected {
            error,
            failed_at,
            callback_delivered,
        } = outcome
        else {
            panic!("expected rejection, got {outcome:?}");
        };
        assert_eq!(error.code(), ErrorCode::UnsupportedParticipant);
        assert_eq!(error.context_value("currency"), Some("GBP"));
        assert_eq!(failed_at, QuoteState::Received);
        assert!(callback_delivered);
        assert_eq!(test.repository.quote_count(), 0);

        let requests = test.client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "http://payerfsp.local/quotes/q-1/error");
        assert_eq!(requests[0].headers.source(), Some("Hub"));
        assert_eq!(requests[0].headers.destination(), Some("payerfsp"));
        assert_eq!(
            requests[0].body.as_ref().unwrap()["errorInformation"]["errorCode"],
            "3100"
        );
    }

    #[tokio::test]
    async fn identical_resend_forwards_again_without_persisting() {
        let (processor, test) = processor(EngineSettings::default());
        let request = post(quote_request_payload("q-1", "USD"));

        assert_eq!(processor.handle(&request).await.label(), "forwarded");
        assert_eq!(processor.handle(&request).await.label(), "resent");

        assert_eq!(test.repository.quote_count(), 1);
        assert_eq!(test.client.requests().len(), 2);
    }

    #[tokio::test]
    async fn modified_resend_is_a_conflict() {
        let (processor, test) = processor(EngineSettings::default());
        processor
            .handle(&post(quote_request_payload("q-1", "USD")))
            .await;

        let mut modified = quote_request_payload("q-1", "USD");
        modified["amount"]["amount"] = json!("200");
        let outcome = processor.handle(&post(modified)).await;

        assert_eq!(outcome.error().map(QuoteError::code), Some(ErrorCode::ModifiedRequest));
        assert_eq!(test.repository.quote_count(), 1);
        let requests = test.client.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].url.ends_with("/quotes/q-1/error"));
    }

    #[tokio::test]
    async fn intercept_rule_holds_the_quote() {
        let rules = parse_rules(
            r#"[{"conditions": {"all": [{"fact": "payload", "path": "$.amount.currency", "operator": "equal", "value": "USD"}]},
                 "event": {"type": "INTERCEPT_QUOTE"}}]"#,
        )
        .unwrap();
        let test = engine(EngineSettings::default(), rules);
        let processor = QuoteProcessor::new(test.ctx.clone());

        let outcome = processor
            .handle(&post(quote_request_payload("q-1", "USD")))
            .await;

        assert_eq!(outcome.label(), "held");
        assert!(test.client.requests().is_empty());
        assert_eq!(test.repository.quote_count(), 1);
    }

    #[tokio::test]
    async fn invalid_rule_rejects_with_rule_error_code() {
        let rules = parse_rules(
            r#"[{"conditions": {"any": [{"fact": "payee", "path": "$.accounts[*].currency", "operator": "doesNotContain", "value": "EUR"}]},
                 "event": {"type": "INVALID_QUOTE_REQUEST", "params": {"FSPIOPError": "PAYEE_UNSUPPORTED_CURRENCY", "message": "Payee does not support EUR"}}}]"#,
        )
        .unwrap();
        let test = engine(EngineSettings::default(), rules);
        let processor = QuoteProcessor::new(test.ctx.clone());

        let outcome = processor
            .handle(&post(quote_request_payload("q-1", "USD")))
            .await;

        let error = outcome.error().unwrap();
        assert_eq!(error.code(), ErrorCode::PayeeUnsupportedCurrency);
        assert_eq!(error.message(), "Payee does not support EUR");
        assert!(test.client.requests()[0].url.ends_with("/error"));
    }

    #[tokio::test]
    async fn resent_intercepted_quote_stays_held() {
        let rules = parse_rules(
            r#"[{"conditions": {"all": [{"fact": "payload", "path": "$.amount.amount", "operator": "greaterThan", "value": 50}]},
                 "event": {"type": "INTERCEPT_QUOTE"}}]"#,
        )
        .unwrap();
        let test = engine(EngineSettings::default(), rules);
        let processor = QuoteProcessor::new(test.ctx.clone());
        let request = post(quote_request_payload("q-1", "USD"));

        assert_eq!(processor.handle(&request).await.label(), "held");
        assert_eq!(processor.handle(&request).await.label(), "held");

        assert!(test.client.requests().is_empty());
        assert_eq!(test.repository.quote_count(), 1);
    }

    #[tokio::test]
    async fn resent_invalid_quote_is_rejected_again() {
        let rules = parse_rules(
            r#"[{"conditions": {"all": [{"fact": "payload", "path": "$.amount.currency", "operator": "equal", "value": "USD"}]},
                 "event": {"type": "INVALID_QUOTE_REQUEST", "params": {"FSPIOPError": "PAYEE_UNSUPPORTED_CURRENCY", "message": "USD blocked"}}}]"#,
        )
        .unwrap();
        let test = engine(EngineSettings::default(), rules);
        let processor = QuoteProcessor::new(test.ctx.clone());
        let request = post(quote_request_payload("q-1", "USD"));

        let first = processor.handle(&request).await;
        let second = processor.handle(&request).await;

        assert_eq!(first.label(), "rejected");
        assert_eq!(
            second.error().map(QuoteError::code),
            Some(ErrorCode::PayeeUnsupportedCurrency)
        );
        let requests = test.client.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.url == "http://payerfsp.local/quotes/q-1/error"));
    }

    #[tokio::test]
    async fn missing_payee_endpoint_reports_destination_error() {
        let (processor, test) = processor(EngineSettings::default());
        test.reference
            .deactivate_endpoint("payeefsp", crate::domain::shared::EndpointType::Quotes);

        let outcome = processor
            .handle(&post(quote_request_payload("q-1", "USD")))
            .await;

        let ProcessOutcome::Rejected { error, failed_at, .. } = outcome else {
            panic!("expected rejection");
        };
        assert_eq!(error.code().fspiop_code(), "3201");
        assert_eq!(error.context_value("participant"), Some("payeefsp"));
        assert_eq!(failed_at, QuoteState::RuleEvaluated);
    }

    #[tokio::test]
    async fn forwarding_failure_is_reported_to_payer() {
        let (processor, test) = processor(EngineSettings::default());
        test.client.fail_for(
            "http://payeefsp.local",
            ForwardError::Status {
                url: "http://payeefsp.local/quotes".to_string(),
                status: 503,
            },
        );

        let outcome = processor
            .handle(&post(quote_request_payload("q-1", "USD")))
            .await;

        assert_eq!(
            outcome.error().map(QuoteError::code),
            Some(ErrorCode::DestinationCommunicationError)
        );
        let requests = test.client.requests();
        assert_eq!(requests.last().unwrap().url, "http://payerfsp.local/quotes/q-1/error");
    }

    #[tokio::test]
    async fn simple_routing_skips_persistence() {
        let (processor, test) = processor(EngineSettings {
            simple_routing_mode: true,
            ..EngineSettings::default()
        });

        let outcome = processor
            .handle(&post(quote_request_payload("q-1", "USD")))
            .await;

        assert!(outcome.is_forwarded());
        assert_eq!(test.repository.quote_count(), 0);
        assert_eq!(test.repository.duplicate_check_count(), 0);
    }

    #[tokio::test]
    async fn response_is_persisted_and_forwarded_to_payer() {
        let (processor, test) = processor(EngineSettings::default());
        processor
            .handle(&post(quote_request_payload("q-1", "USD")))
            .await;

        let outcome = processor.handle(&put("q-1", quote_response_payload())).await;

        let ProcessOutcome::Forwarded { destination, url, .. } = outcome else {
            panic!("expected forward, got {outcome:?}");
        };
        assert_eq!(destination, "payerfsp");
        assert_eq!(url, "http://payerfsp.local/quotes/q-1");
        assert_eq!(test.repository.response_count(), 1);

        let forwarded = test.client.requests().pop().unwrap();
        assert_eq!(forwarded.method, HttpMethod::Put);
        assert!(forwarded.headers.get("accept").is_none());
    }

    #[tokio::test]
    async fn response_for_unknown_quote_is_not_found() {
        let (processor, test) = processor(EngineSettings::default());

        let outcome = processor.handle(&put("q-404", quote_response_payload())).await;

        assert_eq!(outcome.error().map(QuoteError::code), Some(ErrorCode::QuoteIdNotFound));
        let requests = test.client.requests();
        assert_eq!(requests[0].url, "http://payeefsp.local/quotes/q-404/error");
    }

    #[tokio::test]
    async fn error_is_persisted_and_relayed_to_counterparty() {
        let (processor, test) = processor(EngineSettings::default());
        processor
            .handle(&post(quote_request_payload("q-1", "USD")))
            .await;

        let error = message(
            ResourceType::Quote,
            Action::Error,
            "payeefsp",
            "someoneelse",
            json!({"errorInformation": {"errorCode": "5100", "errorDescription": "Payee error"}}),
        )
        .with_uri_id("q-1");
        let outcome = processor.handle(&error).await;

        let ProcessOutcome::Forwarded { destination, url, .. } = outcome else {
            panic!("expected forward, got {outcome:?}");
        };
        assert_eq!(destination, "payerfsp");
        assert_eq!(url, "http://payerfsp.local/quotes/q-1/error");
        assert_eq!(test.repository.error_records().len(), 1);
        assert_eq!(test.repository.error_records()[0].error_code, "5100");
    }

    #[tokio::test]
    async fn error_for_unknown_quote_goes_to_declared_destination() {
        let (processor, test) = processor(EngineSettings::default());

        let error = message(
            ResourceType::Quote,
            Action::Error,
            "payeefsp",
            "payerfsp",
            json!({"errorInformation": {"errorCode": "3100", "errorDescription": "bad"}}),
        )
        .with_uri_id("q-9");
        let outcome = processor.handle(&error).await;

        assert!(outcome.is_forwarded());
        assert!(test.repository.error_records().is_empty());
    }

    #[tokio::test]
    async fn failed_error_relay_is_not_answered() {
        let (processor, test) = processor(EngineSettings::default());

        let error = message(
            ResourceType::Quote,
            Action::Error,
            "payeefsp",
            "ghostfsp",
            json!({"errorInformation": {"errorCode": "3100", "errorDescription": "bad"}}),
        )
        .with_uri_id("q-9");
        let outcome = processor.handle(&error).await;

        let ProcessOutcome::Rejected { callback_delivered, .. } = outcome else {
            panic!("expected rejection");
        };
        assert!(!callback_delivered);
        assert!(test.client.requests().is_empty());
    }

    #[tokio::test]
    async fn hub_originated_error_relay_is_signed() {
        let mut signer = MockSignerPort::new();
        signer
            .expect_sign()
            .times(1)
            .returning(|_, _| Ok("sig".to_string()));
        let test = signing_engine(Arc::new(signer));
        let processor = QuoteProcessor::new(test.ctx.clone());

        let error = InboundMessage::new(
            ResourceType::Quote,
            Action::Error,
            crate::domain::shared::Headers::new()
                .with(crate::domain::shared::headers::FSPIOP_DESTINATION, "payerfsp"),
            json!({"errorInformation": {"errorCode": "2001", "errorDescription": "Internal"}}),
        )
        .with_uri_id("q-1");
        let outcome = processor.handle(&error).await;

        assert!(outcome.is_forwarded());
        let forwarded = test.client.requests().pop().unwrap();
        assert_eq!(forwarded.headers.source(), Some("Hub"));
        assert_eq!(forwarded.headers.get(FSPIOP_SIGNATURE), Some("sig"));
    }

    #[tokio::test]
    async fn get_is_relayed_without_body() {
        let (processor, test) = processor(EngineSettings::default());

        let get = message(ResourceType::Quote, Action::Get, "payerfsp", "payeefsp", Value::Null)
            .with_uri_id("q-1");
        let outcome = processor.handle(&get).await;

        assert!(outcome.is_forwarded());
        let request = test.client.requests().pop().unwrap();
        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.url, "http://payeefsp.local/quotes/q-1");
        assert!(request.body.is_none());
    }
}
