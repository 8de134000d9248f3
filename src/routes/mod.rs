// SPDX-License-Identifier: MIT

//! HTTP route handlers.

pub mod hooks;
pub mod keys;
pub mod payments;
pub mod webhook;

use crate::middleware::auth::require_auth;
use crate::middleware::hooks_auth::require_hook_auth;
use crate::AppState;
use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id,
    })
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // Public routes: health and the signed webhook endpoint (which does its
    // own authentication via the Stripe signature).
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .merge(webhook::routes());

    // Lifecycle hooks (shared-secret auth, called by the identity provider)
    let hook_routes = hooks::routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), require_hook_auth));

    // Client routes (JWT auth)
    let client_routes = keys::routes()
        .merge(payments::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(hook_routes)
        .merge(client_routes)
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
