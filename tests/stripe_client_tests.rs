// SPDX-License-Identifier: MIT

//! Wire-level tests for the Stripe client against a stub server.

use checkout_bridge::services::StripeClient;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn intent_body(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "object": "payment_intent",
        "amount": 8800,
        "currency": "hkd",
        "status": "requires_payment_method",
        "customer": "cus_test_123",
        "client_secret": format!("{}_secret_abc", id),
        "last_payment_error": null
    })
}

#[tokio::test]
async fn test_intent_creation_sends_record_id_as_idempotency_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/payment_intents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(intent_body("pi_test_123")))
        .expect(2)
        .mount(&server)
        .await;

    let client = StripeClient::with_base_url("sk_test_abc".to_string(), server.uri());
    let payment_id = "3f0e8c1a-9d2b-4f6e-8a4c-5b7d1e2f3a4b";

    // Retrying intent creation for the same record must present the same
    // idempotency key, so Stripe collapses the retry into one intent.
    for _ in 0..2 {
        client
            .create_payment_intent(8800, "hkd", "cus_test_123", payment_id)
            .await
            .unwrap();
    }

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    for request in &requests {
        let key = request
            .headers
            .get("Idempotency-Key")
            .expect("Idempotency-Key header present");
        assert_eq!(key.to_str().unwrap(), payment_id);
    }
}

#[tokio::test]
async fn test_ephemeral_key_sends_requested_api_version() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ephemeral_keys"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "ephkey_test_1",
            "object": "ephemeral_key",
            "secret": "ek_test_secret",
            "expires": 1756450000_i64
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = StripeClient::with_base_url("sk_test_abc".to_string(), server.uri());
    let key = client
        .create_ephemeral_key("cus_test_123", "2020-08-27")
        .await
        .unwrap();
    assert_eq!(key.secret, "ek_test_secret");

    let requests = server.received_requests().await.unwrap();
    let version = requests[0]
        .headers
        .get("Stripe-Version")
        .expect("Stripe-Version header present");
    assert_eq!(version.to_str().unwrap(), "2020-08-27");
}

#[tokio::test]
async fn test_error_envelope_classification_preserved() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/payment_intents"))
        .respond_with(ResponseTemplate::new(402).set_body_json(json!({
            "error": {
                "type": "card_error",
                "code": "card_declined",
                "message": "Your card was declined."
            }
        })))
        .mount(&server)
        .await;

    let client = StripeClient::with_base_url("sk_test_abc".to_string(), server.uri());
    let err = client
        .create_payment_intent(8800, "hkd", "cus_test_123", "pay_doc_1")
        .await
        .unwrap_err();

    // A classified processor error keeps its message for the payer.
    assert_eq!(err.user_facing_message(), "Your card was declined.");
}
