// SPDX-License-Identifier: MIT

//! Validation tests for payment record creation.
//!
//! Validation must reject bad input before any store access: with the
//! offline mock database, an invalid request yields 400 while a valid one
//! proceeds far enough to hit the (unavailable) store.

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;

async fn post_payment(body: serde_json::Value) -> StatusCode {
    let (app, state) = common::create_test_app();
    let auth = common::bearer_for(&state, "user_1");

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/payments")
                .header("content-type", "application/json")
                .header(header::AUTHORIZATION, auth)
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    response.status()
}

#[tokio::test]
async fn test_zero_amount_rejected() {
    assert_eq!(
        post_payment(json!({"amount": 0, "currency": "hkd"})).await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_negative_amount_rejected() {
    assert_eq!(
        post_payment(json!({"amount": -500, "currency": "usd"})).await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_currency_wrong_length_rejected() {
    assert_eq!(
        post_payment(json!({"amount": 8800, "currency": "hk"})).await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        post_payment(json!({"amount": 8800, "currency": "honk"})).await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_non_alphabetic_currency_rejected() {
    assert_eq!(
        post_payment(json!({"amount": 8800, "currency": "h1d"})).await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_missing_amount_rejected() {
    // Serde-level rejection from the Json extractor
    let status = post_payment(json!({"currency": "hkd"})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_valid_request_reaches_store() {
    // Passes validation, then fails on the offline mock store: proves the
    // store write (not validation) is the next step for a valid request.
    let status = post_payment(json!({"amount": 8800, "currency": "hkd"})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
