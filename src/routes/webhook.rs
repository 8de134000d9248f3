// SPDX-License-Identifier: MIT

//! Stripe webhook endpoint.

use crate::error::AppError;
use crate::services::stripe::{verify_webhook_signature, StripeEvent};
use crate::services::WebhookReconciler;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

/// Webhook routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/webhook", post(handle_event))
}

/// Acknowledgment body Stripe expects on success or benign ignore.
#[derive(Serialize)]
struct WebhookAck {
    received: bool,
}

/// Handle an incoming Stripe event (POST).
///
/// Fails closed on signature verification (401, body untouched); recognized
/// events reconcile against authoritative processor state; anything else is
/// acknowledged without action. Processing failures return 400 so Stripe's
/// at-least-once delivery retries the event later.
async fn handle_event(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, AppError> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|h| h.to_str().ok());

    verify_webhook_signature(
        &body,
        signature,
        &state.config.stripe_webhook_secret,
        state.config.webhook_tolerance_secs,
    )?;

    let event: StripeEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Malformed event payload: {}", e)))?;

    if !WebhookReconciler::is_recognized(&event.event_type) {
        tracing::debug!(
            event_id = %event.id,
            event_type = %event.event_type,
            "Ignoring unrecognized event type"
        );
        return Ok(Json(WebhookAck { received: true }));
    }

    let intent_id = &event.data.object.id;

    if let Err(err) = state.reconciler.reconcile(intent_id).await {
        tracing::error!(
            event_id = %event.id,
            event_type = %event.event_type,
            payment_intent_id = %intent_id,
            error = %err,
            "Webhook reconciliation failed"
        );
        // Ambiguous matches surface as-is; everything else collapses to a
        // 400 so the processor's retry policy applies either way.
        return Err(match err {
            e @ AppError::Reconciliation { .. } => e,
            _ => AppError::BadRequest("Webhook handler failed".to_string()),
        });
    }

    Ok(Json(WebhookAck { received: true }))
}
