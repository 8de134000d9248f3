// SPDX-License-Identifier: MIT

//! Payment record routes for authenticated clients.
//!
//! Creating a record is the client's "I want to pay" signal; the
//! orchestrator fills in the intent fields and the client observes the
//! record until `client_secret`/`ephemeral_key_secret` or `error` appear.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{PaymentRecord, PaymentStatus};
use crate::AppState;
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

/// Payment routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/payments", post(create_payment))
        .route("/payments/{payment_id}", get(get_payment))
}

#[derive(Deserialize, Validate)]
struct CreatePaymentRequest {
    /// Amount in minor currency units
    #[validate(range(min = 1, message = "amount must be a positive integer"))]
    amount: i64,
    /// ISO 4217 currency code
    #[validate(length(min = 3, max = 3, message = "currency must be a 3-letter ISO code"))]
    currency: String,
}

/// Payment record as returned to its owner.
#[derive(Serialize)]
struct PaymentResponse {
    payment_id: String,
    amount: i64,
    currency: String,
    status: PaymentStatus,
    payment_intent_id: Option<String>,
    client_secret: Option<String>,
    ephemeral_key_secret: Option<String>,
    error: Option<String>,
    created_at: String,
    updated_at: String,
}

impl PaymentResponse {
    fn from_record(payment_id: String, record: PaymentRecord) -> Self {
        Self {
            payment_id,
            amount: record.amount,
            currency: record.currency,
            status: record.status,
            payment_intent_id: record.payment_intent_id,
            client_secret: record.client_secret,
            ephemeral_key_secret: record.ephemeral_key_secret,
            error: record.error,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Create a payment record and kick off intent orchestration.
///
/// The fresh UUID doubles as the Stripe idempotency key, so re-submitting
/// after an ambiguous failure creates a new logical payment rather than a
/// duplicate charge on the old one.
async fn create_payment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<PaymentResponse>)> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    if !req.currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(AppError::BadRequest(
            "currency must be a 3-letter ISO code".to_string(),
        ));
    }

    let payment_id = uuid::Uuid::new_v4().to_string();
    let record = PaymentRecord::new(
        user.user_id.clone(),
        req.amount,
        req.currency,
        chrono::Utc::now().to_rfc3339(),
    );

    state.db.create_payment(&payment_id, &record).await?;

    tracing::info!(
        user_id = %user.user_id,
        payment_id = %payment_id,
        amount = record.amount,
        currency = %record.currency,
        "Payment record created"
    );

    // Orchestration runs in the background; the response carries the
    // pending record and the client observes it for the intent fields.
    // The watcher may dispatch the same record again, which the Stripe
    // idempotency key absorbs.
    let orchestrator = state.orchestrator.clone();
    let dispatch_id = payment_id.clone();
    let dispatch_record = record.clone();
    tokio::spawn(async move {
        orchestrator.process(&dispatch_id, dispatch_record).await;
    });

    Ok((
        StatusCode::CREATED,
        Json(PaymentResponse::from_record(payment_id, record)),
    ))
}

/// Fetch one of the caller's payment records.
async fn get_payment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(payment_id): Path<String>,
) -> Result<Json<PaymentResponse>> {
    let record = state
        .db
        .get_payment(&payment_id)
        .await?
        // A foreign record reads the same as a missing one.
        .filter(|r| r.user_id == user.user_id)
        .ok_or_else(|| AppError::NotFound(format!("Payment {}", payment_id)))?;

    Ok(Json(PaymentResponse::from_record(payment_id, record)))
}
