// SPDX-License-Identifier: MIT

//! Application configuration loaded from environment variables.
//!
//! Secrets arrive as environment variables (Cloud Run secret bindings) and
//! are read once at startup.

use std::env;

/// Stripe API version pinned for the payment intent flow. Ephemeral keys for
/// client-side payment-method listing use the version the client asks for.
pub const PINNED_STRIPE_API_VERSION: &str = "2020-08-27";

/// Default tolerance for the webhook signature timestamp, in seconds.
pub const DEFAULT_WEBHOOK_TOLERANCE_SECS: i64 = 300;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Allowed clock skew when checking webhook signature timestamps
    pub webhook_tolerance_secs: i64,

    // --- Secrets (injected as env vars) ---
    /// Stripe secret API key
    pub stripe_secret_key: String,
    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,
    /// JWT signing key for client session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Shared secret the auth provider presents on user lifecycle hooks
    pub auth_hook_token: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            webhook_tolerance_secs: env::var("WEBHOOK_TOLERANCE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_WEBHOOK_TOLERANCE_SECS),

            stripe_secret_key: env::var("STRIPE_SECRET_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("STRIPE_SECRET_KEY"))?,
            stripe_webhook_secret: env::var("STRIPE_WEBHOOK_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("STRIPE_WEBHOOK_SECRET"))?,
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            auth_hook_token: env::var("AUTH_HOOK_TOKEN")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("AUTH_HOOK_TOKEN"))?,
        })
    }

    /// Fixed config for tests (offline, no secrets required).
    pub fn test_default() -> Self {
        Self {
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            webhook_tolerance_secs: DEFAULT_WEBHOOK_TOLERANCE_SECS,
            stripe_secret_key: "sk_test_checkout_bridge".to_string(),
            stripe_webhook_secret: "whsec_test_secret".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            auth_hook_token: "test_hook_token".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
