// SPDX-License-Identifier: MIT

//! Shared-secret authentication for auth-provider lifecycle hooks.
//!
//! The identity provider (or the relay forwarding its user lifecycle
//! events) presents a static token in `x-auth-hook-token`. Tokens are
//! compared in constant time.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

const HOOK_TOKEN_HEADER: &str = "x-auth-hook-token";

/// Require the lifecycle hook shared secret on `/hooks/*` routes.
pub async fn require_hook_auth(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let presented = request
        .headers()
        .get(HOOK_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    let expected = state.config.auth_hook_token.as_bytes();
    let valid = !expected.is_empty() && bool::from(presented.as_bytes().ct_eq(expected));

    if !valid {
        tracing::warn!("Blocked lifecycle hook request with missing or invalid token");
        return Err(AppError::Unauthenticated);
    }

    Ok(next.run(request).await)
}
