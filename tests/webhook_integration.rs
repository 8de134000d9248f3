// SPDX-License-Identifier: MIT

//! Integration tests for webhook handling.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;

fn event_body(event_type: &str, intent_id: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "id": "evt_test_1",
        "type": event_type,
        "data": { "object": { "id": intent_id, "object": "payment_intent" } }
    }))
    .unwrap()
}

fn webhook_request(body: Vec<u8>, signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json");
    if let Some(sig) = signature {
        builder = builder.header("stripe-signature", sig);
    }
    builder.body(Body::from(body)).unwrap()
}

#[tokio::test]
async fn test_missing_signature_rejected() {
    let (app, _state) = common::create_test_app();

    let body = event_body("payment_intent.succeeded", "pi_test_123");
    let response = app.oneshot(webhook_request(body, None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_garbage_signature_rejected() {
    let (app, _state) = common::create_test_app();

    let body = event_body("payment_intent.succeeded", "pi_test_123");
    let response = app
        .oneshot(webhook_request(body, Some("t=notanumber,v1=deadbeef")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_tampered_body_rejected() {
    let (app, state) = common::create_test_app();

    // Signature computed over a different payload
    let signed = event_body("payment_intent.succeeded", "pi_test_123");
    let sig = common::sign_webhook(&state.config.stripe_webhook_secret, &signed);

    let tampered = event_body("payment_intent.succeeded", "pi_attacker_999");
    let response = app
        .oneshot(webhook_request(tampered, Some(&sig)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_stale_timestamp_rejected() {
    let (app, state) = common::create_test_app();

    let body = event_body("payment_intent.succeeded", "pi_test_123");
    let stale = chrono::Utc::now().timestamp() - 3600;
    let sig = common::sign_webhook_at(&state.config.stripe_webhook_secret, &body, stale);

    let response = app
        .oneshot(webhook_request(body, Some(&sig)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unrecognized_event_acknowledged() {
    let (app, state) = common::create_test_app();

    let body = event_body("charge.refunded", "ch_test_123");
    let sig = common::sign_webhook(&state.config.stripe_webhook_secret, &body);

    let response = app
        .oneshot(webhook_request(body, Some(&sig)))
        .await
        .unwrap();

    // Benign-ignore: 200 with the acknowledgment body, no processing
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["received"], true);
}

#[tokio::test]
async fn test_recognized_event_failure_returns_400() {
    let (app, state) = common::create_test_app();

    // Valid signature, recognized type, but reconciliation cannot complete
    // (the test app's processor endpoint refuses connections): must be a
    // 4xx failure so Stripe redelivers, never a silent 200.
    let body = event_body("payment_intent.succeeded", "pi_test_123");
    let sig = common::sign_webhook(&state.config.stripe_webhook_secret, &body);

    let response = app
        .oneshot(webhook_request(body, Some(&sig)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_payload_with_valid_signature() {
    let (app, state) = common::create_test_app();

    let body = b"not json at all".to_vec();
    let sig = common::sign_webhook(&state.config.stripe_webhook_secret, &body);

    let response = app
        .oneshot(webhook_request(body, Some(&sig)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _state) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
