// SPDX-License-Identifier: MIT

use checkout_bridge::config::Config;
use checkout_bridge::db::FirestoreDb;
use checkout_bridge::middleware::auth::create_jwt;
use checkout_bridge::routes::create_router;
use checkout_bridge::services::{
    CustomerRegistry, PaymentOrchestrator, StripeClient, WebhookReconciler,
};
use checkout_bridge::AppState;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;

/// Create a test app with offline mock dependencies (no GCP required).
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = FirestoreDb::new_mock();
    // Port 9 (discard) refuses connections immediately, so any code path
    // that reaches the processor fails fast without touching the network.
    let stripe = StripeClient::with_base_url(
        config.stripe_secret_key.clone(),
        "http://127.0.0.1:9".to_string(),
    );

    let registry = CustomerRegistry::new(db.clone(), stripe.clone());
    let orchestrator = PaymentOrchestrator::new(db.clone(), stripe.clone());
    let reconciler = WebhookReconciler::new(db.clone(), stripe.clone());

    let state = Arc::new(AppState {
        config,
        db,
        stripe,
        registry,
        orchestrator,
        reconciler,
    });

    (create_router(state.clone()), state)
}

/// Bearer header value with a JWT signed by the test config's key.
#[allow(dead_code)]
pub fn bearer_for(state: &AppState, user_id: &str) -> String {
    let token = create_jwt(user_id, &state.config.jwt_signing_key).expect("JWT creation");
    format!("Bearer {}", token)
}

/// Build a valid `Stripe-Signature` header for a payload.
#[allow(dead_code)]
pub fn sign_webhook(secret: &str, payload: &[u8]) -> String {
    sign_webhook_at(secret, payload, chrono::Utc::now().timestamp())
}

/// Build a `Stripe-Signature` header with an explicit timestamp.
#[allow(dead_code)]
pub fn sign_webhook_at(secret: &str, payload: &[u8], timestamp: i64) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC can take any key length");
    mac.update(format!("{}.", timestamp).as_bytes());
    mac.update(payload);
    format!(
        "t={},v1={}",
        timestamp,
        hex::encode(mac.finalize().into_bytes())
    )
}
