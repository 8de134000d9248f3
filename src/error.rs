// SPDX-License-Identifier: MIT

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Invalid webhook signature: {0}")]
    Unauthorized(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Ambiguous or missing record match during webhook reconciliation.
    /// `matches` is the number of documents the equality query returned;
    /// anything other than exactly one is a reconciliation failure.
    #[error("Reconciliation failed: {matches} {entity} record(s) matched")]
    Reconciliation { entity: &'static str, matches: usize },

    /// Failure surfaced by the Stripe API. `error_type` is Stripe's error
    /// classification (`card_error`, `invalid_request_error`, ...) when the
    /// response carried one; classified errors have user-safe messages.
    #[error("Stripe API error: {message}")]
    Stripe {
        error_type: Option<String>,
        message: String,
    },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Generic message shown to end users for errors Stripe did not classify.
    pub const GENERIC_USER_MESSAGE: &'static str =
        "An error occurred, developers have been alerted";

    /// Sanitized, user-facing message for this error.
    ///
    /// Stripe-classified errors (those with an `error_type`) carry a message
    /// that is safe to show to the payer. Everything else is replaced with a
    /// generic alert; the full detail only goes to the operational log.
    pub fn user_facing_message(&self) -> String {
        match self {
            AppError::Stripe {
                error_type: Some(_),
                message,
            } => message.clone(),
            _ => Self::GENERIC_USER_MESSAGE.to_string(),
        }
    }
}

/// Structured JSON error body returned to RPC callers.
#[derive(Serialize)]
struct ErrorResponse {
    code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Unauthenticated => (StatusCode::UNAUTHORIZED, "unauthenticated", None),
            AppError::Unauthorized(reason) => {
                tracing::warn!(reason = %reason, "Webhook signature verification failed");
                (StatusCode::UNAUTHORIZED, "unauthorized", None)
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Reconciliation { entity, matches } => {
                tracing::error!(entity, matches, "Reconciliation failed");
                (
                    StatusCode::BAD_REQUEST,
                    "reconciliation_error",
                    Some(self.to_string()),
                )
            }
            AppError::Stripe { message, .. } => {
                tracing::error!(error = %message, "Stripe API error");
                (
                    StatusCode::BAD_GATEWAY,
                    "stripe_error",
                    Some(self.user_facing_message()),
                )
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            code: code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
