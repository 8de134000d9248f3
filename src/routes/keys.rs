// SPDX-License-Identifier: MIT

//! Ephemeral key issuance for authenticated clients.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::services::stripe::EphemeralKey;
use crate::AppState;
use axum::{
    extract::{Json, State},
    routing::post,
    Extension, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Ephemeral key routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/ephemeral_keys", post(create_key))
}

#[derive(Deserialize)]
struct CreateKeyRequest {
    api_version: String,
}

/// Mint a short-lived key scoped to the caller's customer record.
///
/// Stateless and freely retryable; each call mints a fresh key. The
/// processor's key object is returned verbatim so the mobile SDK can
/// consume it directly.
async fn create_key(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateKeyRequest>,
) -> Result<Json<EphemeralKey>> {
    if req.api_version.trim().is_empty() {
        return Err(AppError::BadRequest("api_version is required".to_string()));
    }

    let customer = state
        .db
        .get_customer(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Customer record for user {}", user.user_id)))?;

    let key = state
        .stripe
        .create_ephemeral_key(&customer.customer_id, &req.api_version)
        .await?;

    tracing::info!(
        user_id = %user.user_id,
        customer_id = %customer.customer_id,
        api_version = %req.api_version,
        "Ephemeral key issued"
    );

    Ok(Json(key))
}
