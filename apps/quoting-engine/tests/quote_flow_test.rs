//! Quote Flow Integration Tests
//!
//! Drives envelopes through a container built from YAML configuration and
//! checks what was persisted and what went out on the wire.
//!
//! Run with: `cargo test --test quote_flow_test`

#![allow(dead_code, clippy::unwrap_used)]

use std::io::Write;
use std::sync::Arc;

use quoting_engine::application::ports::HttpMethod;
use quoting_engine::config::{Config, load_config_from_string};
use quoting_engine::infrastructure::Container;
use quoting_engine::infrastructure::http::RecordingCallbackClient;
use quoting_engine::infrastructure::persistence::InMemoryQuotesRepository;
use quoting_engine::{ErrorCode, MessageDispatcher, MessageEnvelope, ProcessOutcome, QuoteError};
use serde_json::{Value, json};

// ============================================================================
// Fixtures
// ============================================================================

const BASE_CONFIG: &str = r"
hub:
  name: Hub
participants:
  - name: payerfsp
    currencies: [USD]
    endpoints:
      quotes: http://payerfsp.local
      bulk_quotes: http://payerfsp.local
      fx_quotes: http://payerfsp.local
  - name: payeefsp
    currencies: [USD]
    endpoints:
      quotes: http://payeefsp.local
      bulk_quotes: http://payeefsp.local
  - name: fxpfsp
    currencies: [USD, ZMW]
    endpoints:
      fx_quotes: http://fxpfsp.local
  - name: proxyab
    endpoints:
      quotes: http://proxyab.local
proxies:
  - participant: remotefsp
    proxy: proxyab
";

struct Harness {
    dispatcher: Arc<MessageDispatcher>,
    repository: Arc<InMemoryQuotesRepository>,
    client: Arc<RecordingCallbackClient>,
}

fn harness_with(config: &Config) -> Harness {
    let client = Arc::new(RecordingCallbackClient::new());
    let container = Container::with_callback(config, client.clone()).unwrap();
    Harness {
        dispatcher: container.dispatcher(),
        repository: container.repository(),
        client,
    }
}

fn harness() -> Harness {
    harness_with(&load_config_from_string(BASE_CONFIG).unwrap())
}

fn party(fsp: &str, msisdn: &str) -> Value {
    json!({"partyIdInfo": {"partyIdType": "MSISDN", "partyIdentifier": msisdn, "fspId": fsp}})
}

fn quote_request(quote_id: &str, payee_fsp: &str, amount: &str, currency: &str) -> Value {
    json!({
        "quoteId": quote_id,
        "transactionId": format!("tx-{quote_id}"),
        "payer": party("payerfsp", "27713803911"),
        "payee": party(payee_fsp, "27713803912"),
        "amountType": "SEND",
        "amount": {"amount": amount, "currency": currency},
        "transactionType": {"scenario": "TRANSFER", "initiator": "PAYER", "initiatorType": "CONSUMER"}
    })
}

fn quote_response() -> Value {
    json!({
        "transferAmount": {"amount": "101", "currency": "USD"},
        "payeeReceiveAmount": {"amount": "100", "currency": "USD"},
        "expiration": "2099-01-01T00:00:00.000Z",
        "ilpPacket": "AYIBgQAAAAAAAASwNGxldmVsb25lLmRmc3AxLm1lci45T2RTOF81MDdqUUZERmZlakgyOVc4bXFmNEpLMHlGTFGCAUBQU0svMS4wCk5vbmNlOiB1SXlweUYzY3pYSXBFdzVVc05TYWh3",
        "condition": "f5sqb7tBTWPd5Y8BDFdMm9BJR_MNI4isf8p8n4D5pHA"
    })
}

fn envelope(
    message_type: &str,
    action: &str,
    path: &str,
    id: Option<&str>,
    source: &str,
    destination: &str,
    payload: Value,
) -> MessageEnvelope {
    let mut uri_params = json!({});
    if let Some(id) = id {
        uri_params = json!({"id": id});
    }
    serde_json::from_value(json!({
        "id": format!("env-{path}"),
        "type": message_type,
        "content": {
            "uriParams": uri_params,
            "path": path,
            "headers": {
                "fspiop-source": source,
                "fspiop-destination": destination,
                "content-type": "application/vnd.interoperability.quotes+json;version=1.0",
                "date": "Tue, 20 Oct 2026 10:00:00 GMT"
            },
            "payload": payload
        },
        "metadata": {"event": {"type": message_type, "action": action}}
    }))
    .unwrap()
}

fn post_quote(payload: Value, destination: &str) -> MessageEnvelope {
    envelope("quote", "post", "/quotes", None, "payerfsp", destination, payload)
}

async fn dispatch(harness: &Harness, envelope: MessageEnvelope) -> ProcessOutcome {
    harness.dispatcher.dispatch(envelope).await.unwrap()
}

// ============================================================================
// Quote requests
// ============================================================================

#[tokio::test]
async fn usd_quote_is_persisted_and_forwarded_to_payee() {
    let harness = harness();
    let payload = quote_request("q-1", "payeefsp", "100", "USD");

    let outcome = dispatch(&harness, post_quote(payload.clone(), "payeefsp")).await;

    let ProcessOutcome::Forwarded {
        destination,
        url,
        resend,
        proxy,
        ..
    } = outcome
    else {
        panic!("expected forward, got {outcome:?}");
    };
    assert_eq!(destination, "payeefsp");
    assert_eq!(url, "http://payeefsp.local/quotes");
    assert!(!resend);
    assert_eq!(proxy, None);

    assert_eq!(harness.repository.quote_count(), 1);
    assert_eq!(harness.repository.parties_for("q-1").len(), 2);

    let requests = harness.client.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, HttpMethod::Post);
    assert_eq!(requests[0].headers.source(), Some("payerfsp"));
    assert_eq!(requests[0].body.as_ref(), Some(&payload));
}

#[tokio::test]
async fn unsupported_currency_returns_error_callback_to_payer() {
    let harness = harness();

    let outcome = dispatch(
        &harness,
        post_quote(quote_request("q-2", "payeefsp", "100", "GBP"), "payeefsp"),
    )
    .await;

    let ProcessOutcome::Rejected {
        error,
        callback_delivered,
        ..
    } = &outcome
    else {
        panic!("expected rejection, got {outcome:?}");
    };
    assert_eq!(error.code(), ErrorCode::UnsupportedParticipant);
    assert_eq!(error.code().fspiop_code(), "3100");
    assert!(callback_delivered);
    assert_eq!(harness.repository.quote_count(), 0);

    let requests = harness.client.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, HttpMethod::Put);
    assert_eq!(requests[0].url, "http://payerfsp.local/quotes/q-2/error");
    assert_eq!(requests[0].headers.source(), Some("Hub"));
    assert_eq!(requests[0].headers.destination(), Some("payerfsp"));
    let body = requests[0].body.as_ref().unwrap();
    assert_eq!(body["errorInformation"]["errorCode"], "3100");
}

#[tokio::test]
async fn identical_resend_is_forwarded_without_new_records() {
    let harness = harness();
    let payload = quote_request("q-3", "payeefsp", "100", "USD");

    let first = dispatch(&harness, post_quote(payload.clone(), "payeefsp")).await;
    let second = dispatch(&harness, post_quote(payload, "payeefsp")).await;

    assert_eq!(first.label(), "forwarded");
    assert_eq!(second.label(), "resent");
    assert_eq!(harness.repository.quote_count(), 1);
    assert_eq!(harness.client.requests().len(), 2);
}

#[tokio::test]
async fn modified_resend_is_rejected() {
    let harness = harness();

    dispatch(
        &harness,
        post_quote(quote_request("q-4", "payeefsp", "100", "USD"), "payeefsp"),
    )
    .await;
    let outcome = dispatch(
        &harness,
        post_quote(quote_request("q-4", "payeefsp", "250", "USD"), "payeefsp"),
    )
    .await;

    assert_eq!(
        outcome.error().map(QuoteError::code),
        Some(ErrorCode::ModifiedRequest)
    );
    assert_eq!(harness.repository.quote_count(), 1);
    assert_eq!(
        harness.client.requests()[1].url,
        "http://payerfsp.local/quotes/q-4/error"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_identical_requests_persist_once() {
    let harness = harness();
    let payload = quote_request("q-5", "payeefsp", "100", "USD");

    let first = tokio::spawn({
        let dispatcher = Arc::clone(&harness.dispatcher);
        let envelope = post_quote(payload.clone(), "payeefsp");
        async move { dispatcher.dispatch(envelope).await.unwrap() }
    });
    let second = tokio::spawn({
        let dispatcher = Arc::clone(&harness.dispatcher);
        let envelope = post_quote(payload, "payeefsp");
        async move { dispatcher.dispatch(envelope).await.unwrap() }
    });
    let (first, second) = (first.await.unwrap(), second.await.unwrap());

    assert!(first.is_forwarded(), "first: {first:?}");
    assert!(second.is_forwarded(), "second: {second:?}");
    assert_eq!(harness.repository.quote_count(), 1);
    assert_eq!(harness.repository.parties_for("q-5").len(), 2);
    assert_eq!(harness.client.requests_to("http://payeefsp.local").len(), 2);
}

#[tokio::test]
async fn proxied_payee_is_reached_through_proxy_endpoint() {
    let harness = harness();

    let outcome = dispatch(
        &harness,
        post_quote(quote_request("q-6", "remotefsp", "100", "USD"), "remotefsp"),
    )
    .await;

    let ProcessOutcome::Forwarded {
        destination,
        url,
        proxy,
        ..
    } = outcome
    else {
        panic!("expected forward, got {outcome:?}");
    };
    assert_eq!(destination, "remotefsp");
    assert_eq!(url, "http://proxyab.local/quotes");
    assert_eq!(proxy.as_deref(), Some("proxyab"));
    assert_eq!(
        harness.client.requests()[0].headers.destination(),
        Some("remotefsp")
    );
}

#[tokio::test]
async fn data_uri_payload_is_decoded() {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;

    let harness = harness();
    let payload = quote_request("q-7", "payeefsp", "100", "USD");
    let encoded = format!(
        "data:application/vnd.interoperability.quotes+json;version=1.0;base64,{}",
        STANDARD.encode(payload.to_string())
    );

    let outcome = dispatch(&harness, post_quote(json!(encoded), "payeefsp")).await;

    assert!(outcome.is_forwarded(), "{outcome:?}");
    assert_eq!(harness.client.requests()[0].body.as_ref(), Some(&payload));
}

#[tokio::test]
async fn unknown_action_fails_decoding() {
    let harness = harness();
    let bad = envelope(
        "quote",
        "delete",
        "/quotes",
        None,
        "payerfsp",
        "payeefsp",
        quote_request("q-8", "payeefsp", "100", "USD"),
    );

    assert!(harness.dispatcher.dispatch(bad).await.is_err());
    assert!(harness.client.requests().is_empty());
}

// ============================================================================
// Responses, errors and lookups
// ============================================================================

#[tokio::test]
async fn response_is_forwarded_back_to_payer() {
    let harness = harness();
    dispatch(
        &harness,
        post_quote(quote_request("q-10", "payeefsp", "100", "USD"), "payeefsp"),
    )
    .await;

    let outcome = dispatch(
        &harness,
        envelope(
            "quote",
            "put",
            "/quotes/q-10",
            Some("q-10"),
            "payeefsp",
            "payerfsp",
            quote_response(),
        ),
    )
    .await;

    let ProcessOutcome::Forwarded { destination, url, .. } = outcome else {
        panic!("expected forward, got {outcome:?}");
    };
    assert_eq!(destination, "payerfsp");
    assert_eq!(url, "http://payerfsp.local/quotes/q-10");
    assert_eq!(harness.repository.response_count(), 1);
}

#[tokio::test]
async fn error_for_known_quote_is_relayed_to_counterparty() {
    let harness = harness();
    dispatch(
        &harness,
        post_quote(quote_request("q-11", "payeefsp", "100", "USD"), "payeefsp"),
    )
    .await;

    let outcome = dispatch(
        &harness,
        envelope(
            "quote",
            "put",
            "/quotes/q-11/error",
            Some("q-11"),
            "payeefsp",
            "payerfsp",
            json!({"errorInformation": {"errorCode": "5100", "errorDescription": "Payee rejected"}}),
        ),
    )
    .await;

    let ProcessOutcome::Forwarded { destination, url, .. } = outcome else {
        panic!("expected forward, got {outcome:?}");
    };
    assert_eq!(destination, "payerfsp");
    assert_eq!(url, "http://payerfsp.local/quotes/q-11/error");

    let errors = harness.repository.error_records();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].error_code, "5100");
}

#[tokio::test]
async fn get_is_passed_through_to_destination() {
    let harness = harness();

    let outcome = dispatch(
        &harness,
        envelope(
            "quote",
            "get",
            "/quotes/q-12",
            Some("q-12"),
            "payerfsp",
            "payeefsp",
            Value::Null,
        ),
    )
    .await;

    assert!(outcome.is_forwarded(), "{outcome:?}");
    let requests = harness.client.requests();
    assert_eq!(requests[0].method, HttpMethod::Get);
    assert_eq!(requests[0].url, "http://payeefsp.local/quotes/q-12");
}

// ============================================================================
// Signing
// ============================================================================

#[tokio::test]
async fn hub_errors_are_signed_and_participant_messages_are_not() {
    let mut config = load_config_from_string(BASE_CONFIG).unwrap();
    config.hub.signing_enabled = true;
    config.hub.signing_key = "integration-secret".to_string();
    let harness = harness_with(&config);

    dispatch(
        &harness,
        post_quote(quote_request("q-20", "payeefsp", "100", "USD"), "payeefsp"),
    )
    .await;
    dispatch(
        &harness,
        post_quote(quote_request("q-21", "payeefsp", "100", "GBP"), "payeefsp"),
    )
    .await;

    let forwarded = harness.client.requests_to("http://payeefsp.local");
    assert_eq!(forwarded.len(), 1);
    assert_eq!(forwarded[0].headers.signature(), None);

    let errors = harness.client.requests_to("http://payerfsp.local/quotes/q-21/error");
    assert_eq!(errors.len(), 1);
    let signature: Value = serde_json::from_str(errors[0].headers.signature().unwrap()).unwrap();
    assert!(signature["signature"].as_str().is_some_and(|s| !s.is_empty()));
    assert!(signature["protectedHeader"].is_string());
}

// ============================================================================
// Rules
// ============================================================================

fn config_with_rules(rules: &Value) -> (Config, tempfile::NamedTempFile) {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(rules.to_string().as_bytes()).unwrap();
    let mut config = load_config_from_string(BASE_CONFIG).unwrap();
    config.engine.rules_path = Some(file.path().to_string_lossy().into_owned());
    (config, file)
}

#[tokio::test]
async fn intercept_rule_from_file_holds_large_quotes() {
    let (config, _file) = config_with_rules(&json!([{
        "conditions": {"all": [{
            "fact": "payload",
            "path": "$.amount.amount",
            "operator": "greaterThan",
            "value": 1000
        }]},
        "event": {"type": "INTERCEPT_QUOTE", "params": {"reason": "manual review"}}
    }]));
    let harness = harness_with(&config);

    let small = dispatch(
        &harness,
        post_quote(quote_request("q-30", "payeefsp", "100", "USD"), "payeefsp"),
    )
    .await;
    let large = dispatch(
        &harness,
        post_quote(quote_request("q-31", "payeefsp", "5000", "USD"), "payeefsp"),
    )
    .await;

    assert_eq!(small.label(), "forwarded");
    assert_eq!(large.label(), "held");
    assert_eq!(harness.repository.quote_count(), 2);
    assert_eq!(harness.client.requests().len(), 1);
}

#[tokio::test]
async fn invalid_rule_from_file_rejects_with_its_error_code() {
    let (config, _file) = config_with_rules(&json!([{
        "conditions": {"all": [{
            "fact": "payload",
            "path": "$.amount.currency",
            "operator": "notEqual",
            "value": "USD"
        }]},
        "event": {
            "type": "INVALID_QUOTE_REQUEST",
            "params": {"FSPIOPError": "PAYEE_UNSUPPORTED_CURRENCY", "message": "USD only"}
        }
    }]));
    let mut config = config;
    config.participants[0].currencies.push("EUR".to_string());
    let harness = harness_with(&config);

    let outcome = dispatch(
        &harness,
        post_quote(quote_request("q-32", "payeefsp", "100", "EUR"), "payeefsp"),
    )
    .await;

    let Some(error) = outcome.error() else {
        panic!("expected rejection, got {outcome:?}");
    };
    assert_eq!(error.code(), ErrorCode::PayeeUnsupportedCurrency);
    assert_eq!(error.message(), "USD only");
    assert!(harness.client.requests()[0].url.ends_with("/quotes/q-32/error"));
}

#[tokio::test]
async fn redelivered_held_quote_is_not_forwarded() {
    let (config, _file) = config_with_rules(&json!([{
        "conditions": {"all": [{
            "fact": "payload",
            "path": "$.amount.amount",
            "operator": "greaterThan",
            "value": 1000
        }]},
        "event": {"type": "INTERCEPT_QUOTE"}
    }]));
    let harness = harness_with(&config);
    let payload = quote_request("q-33", "payeefsp", "5000", "USD");

    let first = dispatch(&harness, post_quote(payload.clone(), "payeefsp")).await;
    let second = dispatch(&harness, post_quote(payload, "payeefsp")).await;

    assert_eq!(first.label(), "held");
    assert_eq!(second.label(), "held");
    assert_eq!(harness.repository.quote_count(), 1);
    assert!(harness.client.requests().is_empty());
}

// ============================================================================
// Simple routing
// ============================================================================

#[tokio::test]
async fn simple_routing_forwards_without_persisting() {
    let mut config = load_config_from_string(BASE_CONFIG).unwrap();
    config.engine.simple_routing_mode = true;
    let harness = harness_with(&config);

    let outcome = dispatch(
        &harness,
        post_quote(quote_request("q-40", "payeefsp", "100", "USD"), "payeefsp"),
    )
    .await;

    assert!(outcome.is_forwarded(), "{outcome:?}");
    assert_eq!(harness.repository.quote_count(), 0);
    assert_eq!(harness.repository.duplicate_check_count(), 0);
}

// ============================================================================
// Bulk and FX quotes
// ============================================================================

fn bulk_request(bulk_quote_id: &str) -> Value {
    let individual = |quote_id: &str, msisdn: &str| {
        json!({
            "quoteId": quote_id,
            "transactionId": format!("tx-{quote_id}"),
            "payee": party("payeefsp", msisdn),
            "amountType": "SEND",
            "amount": {"amount": "25", "currency": "USD"},
            "transactionType": {"scenario": "TRANSFER", "initiator": "PAYER", "initiatorType": "CONSUMER"}
        })
    };
    json!({
        "bulkQuoteId": bulk_quote_id,
        "payer": party("payerfsp", "27713803911"),
        "individualQuotes": [individual("bq-q-1", "27713803912"), individual("bq-q-2", "27713803913")]
    })
}

fn conversion_terms(target_amount: Option<&str>) -> Value {
    let mut target = json!({"currency": "ZMW"});
    if let Some(amount) = target_amount {
        target["amount"] = json!(amount);
    }
    json!({
        "conversionId": "c-1",
        "determiningTransferId": "b51ec534-ee48-4575-b6a9-ead2955b8069",
        "initiatingFsp": "payerfsp",
        "counterPartyFsp": "fxpfsp",
        "amountType": "SEND",
        "sourceAmount": {"currency": "USD", "amount": "300"},
        "targetAmount": target,
        "expiration": "2099-01-01T00:00:00Z"
    })
}

#[tokio::test]
async fn bulk_quote_round_trip() {
    let harness = harness();

    let request = dispatch(
        &harness,
        envelope(
            "bulkquotes",
            "post",
            "/bulkQuotes",
            None,
            "payerfsp",
            "payeefsp",
            bulk_request("bq-1"),
        ),
    )
    .await;
    let ProcessOutcome::Forwarded { url, .. } = &request else {
        panic!("expected forward, got {request:?}");
    };
    assert_eq!(url, "http://payeefsp.local/bulkQuotes");
    assert_eq!(harness.repository.bulk_quote_count(), 1);

    let response = dispatch(
        &harness,
        envelope(
            "bulkquotes",
            "put",
            "/bulkQuotes/bq-1",
            Some("bq-1"),
            "payeefsp",
            "payerfsp",
            json!({
                "expiration": "2099-01-01T00:00:00.000Z",
                "individualQuoteResults": [{"quoteId": "bq-q-1"}, {"quoteId": "bq-q-2"}]
            }),
        ),
    )
    .await;
    let ProcessOutcome::Forwarded { destination, url, .. } = response else {
        panic!("expected forward, got {response:?}");
    };
    assert_eq!(destination, "payerfsp");
    assert_eq!(url, "http://payerfsp.local/bulkQuotes/bq-1");
}

#[tokio::test]
async fn fx_quote_round_trip() {
    let harness = harness();

    let request = dispatch(
        &harness,
        envelope(
            "fxquotes",
            "post",
            "/fxQuotes",
            None,
            "payerfsp",
            "fxpfsp",
            json!({"conversionRequestId": "cr-1", "conversionTerms": conversion_terms(None)}),
        ),
    )
    .await;
    let ProcessOutcome::Forwarded { destination, url, .. } = &request else {
        panic!("expected forward, got {request:?}");
    };
    assert_eq!(destination, "fxpfsp");
    assert_eq!(url, "http://fxpfsp.local/fxQuotes");
    assert_eq!(harness.repository.fx_quote_count(), 1);

    let response = dispatch(
        &harness,
        envelope(
            "fxquotes",
            "put",
            "/fxQuotes/cr-1",
            Some("cr-1"),
            "fxpfsp",
            "payerfsp",
            json!({
                "condition": "GRzLaTP7DJ9t4P-a_BA0WA9wzzlsugf00-Tn6kESAfM",
                "conversionTerms": conversion_terms(Some("48000"))
            }),
        ),
    )
    .await;
    let ProcessOutcome::Forwarded { url, .. } = response else {
        panic!("expected forward, got {response:?}");
    };
    assert_eq!(url, "http://payerfsp.local/fxQuotes/cr-1");
}
