// SPDX-License-Identifier: MIT

//! Auth-provider user lifecycle hooks.
//!
//! The identity provider calls these when a user registers or deregisters;
//! they are the Rust-side replacement for Firebase auth `onCreate` and
//! `onDelete` triggers. Guarded by the shared-secret middleware applied in
//! routes/mod.rs.

use crate::error::{AppError, Result};
use crate::AppState;
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    routing::{delete, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Lifecycle hook routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/hooks/users", post(user_created))
        .route("/hooks/users/{user_id}", delete(user_deleted))
}

#[derive(Deserialize)]
struct UserCreatedPayload {
    user_id: String,
    email: Option<String>,
}

#[derive(Serialize)]
struct UserCreatedResponse {
    user_id: String,
    customer_id: String,
}

/// A user registered: create and persist their customer mapping.
async fn user_created(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UserCreatedPayload>,
) -> Result<(StatusCode, Json<UserCreatedResponse>)> {
    if payload.user_id.trim().is_empty() {
        return Err(AppError::BadRequest("user_id is required".to_string()));
    }

    let customer = state
        .registry
        .handle_user_created(&payload.user_id, payload.email.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UserCreatedResponse {
            user_id: customer.user_id,
            customer_id: customer.customer_id,
        }),
    ))
}

#[derive(Serialize)]
struct UserDeletedResponse {
    deleted: bool,
}

/// A user deregistered: clean up their processor and local state.
async fn user_deleted(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<UserDeletedResponse>> {
    state.registry.handle_user_deleted(&user_id).await?;
    Ok(Json(UserDeletedResponse { deleted: true }))
}
