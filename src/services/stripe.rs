// SPDX-License-Identifier: MIT

//! Stripe REST API client and webhook signature verification.
//!
//! Handles:
//! - Customer create/delete
//! - Ephemeral key creation (short-lived, scoped client credentials)
//! - Payment intent create/retrieve with idempotency keys
//! - Webhook signature verification (HMAC-SHA256 over `t.body`)

use crate::error::AppError;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

type HmacSha256 = Hmac<Sha256>;

/// Stripe API client.
#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl StripeClient {
    /// Create a new Stripe client with a secret API key.
    pub fn new(secret_key: String) -> Self {
        Self::with_base_url(secret_key, STRIPE_API_BASE.to_string())
    }

    /// Create a client against an alternate API base (stub servers in tests,
    /// stripe-mock in local development).
    pub fn with_base_url(secret_key: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            secret_key,
        }
    }

    /// Create a Stripe customer tied to an auth-provider user via metadata.
    pub async fn create_customer(
        &self,
        user_id: &str,
        email: Option<&str>,
    ) -> Result<StripeCustomer, AppError> {
        let url = format!("{}/customers", self.base_url);

        let mut form: Vec<(String, String)> =
            vec![("metadata[firebase_uid]".to_string(), user_id.to_string())];
        if let Some(email) = email {
            form.push(("email".to_string(), email.to_string()));
        }

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(request_error)?;

        self.check_response_json(response).await
    }

    /// Delete a Stripe customer.
    ///
    /// An already-deleted customer (HTTP 404 / `resource_missing`) is treated
    /// as success: user cleanup runs with at-least-once semantics and must
    /// tolerate replays.
    pub async fn delete_customer(&self, customer_id: &str) -> Result<(), AppError> {
        let url = format!("{}/customers/{}", self.base_url, customer_id);

        let response = self
            .http
            .delete(&url)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(request_error)?;

        if response.status().as_u16() == 404 {
            tracing::warn!(customer_id, "Stripe customer already deleted");
            return Ok(());
        }

        self.check_response(response).await
    }

    /// Mint a short-lived ephemeral key scoped to a customer.
    ///
    /// The requested API version is sent as the `Stripe-Version` header; the
    /// key is only usable by a client pinned to that version.
    pub async fn create_ephemeral_key(
        &self,
        customer_id: &str,
        api_version: &str,
    ) -> Result<EphemeralKey, AppError> {
        let url = format!("{}/ephemeral_keys", self.base_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.secret_key)
            .header("Stripe-Version", api_version)
            .form(&[("customer", customer_id)])
            .send()
            .await
            .map_err(request_error)?;

        self.check_response_json(response).await
    }

    /// Create a payment intent for (amount, currency, customer).
    ///
    /// The caller-supplied idempotency key guarantees at-most-one intent per
    /// logical payment, even under retry or duplicate trigger delivery.
    pub async fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
        customer_id: &str,
        idempotency_key: &str,
    ) -> Result<PaymentIntent, AppError> {
        let url = format!("{}/payment_intents", self.base_url);

        let form = [
            ("amount", amount.to_string()),
            ("currency", currency.to_lowercase()),
            ("customer", customer_id.to_string()),
        ];

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.secret_key)
            .header("Idempotency-Key", idempotency_key)
            .form(&form)
            .send()
            .await
            .map_err(request_error)?;

        self.check_response_json(response).await
    }

    /// Retrieve the authoritative state of a payment intent.
    pub async fn retrieve_payment_intent(&self, intent_id: &str) -> Result<PaymentIntent, AppError> {
        let url = format!("{}/payment_intents/{}", self.base_url, intent_id);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(request_error)?;

        self.check_response_json(response).await
    }

    /// Check response status and return error if not successful.
    async fn check_response(&self, response: reqwest::Response) -> Result<(), AppError> {
        if response.status().is_success() {
            return Ok(());
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(map_api_error(status.as_u16(), &body))
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(map_api_error(status.as_u16(), &body));
        }

        response.json().await.map_err(|e| AppError::Stripe {
            error_type: None,
            message: format!("JSON parse error: {}", e),
        })
    }
}

/// Transport-level failures carry no Stripe classification, so they are
/// sanitized to the generic user message downstream.
fn request_error(e: reqwest::Error) -> AppError {
    AppError::Stripe {
        error_type: None,
        message: e.to_string(),
    }
}

/// Map a non-2xx Stripe response to an error, keeping the classification
/// from the error envelope when one is present.
fn map_api_error(status: u16, body: &str) -> AppError {
    if let Ok(envelope) = serde_json::from_str::<StripeErrorEnvelope>(body) {
        return AppError::Stripe {
            error_type: envelope.error.error_type,
            message: envelope
                .error
                .message
                .unwrap_or_else(|| format!("HTTP {}", status)),
        };
    }
    AppError::Stripe {
        error_type: None,
        message: format!("HTTP {}: {}", status, body),
    }
}

// ─── Wire Types ──────────────────────────────────────────────────

/// Stripe error envelope: `{"error": {"type": ..., "message": ..., "code": ...}}`.
#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorBody,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    #[serde(rename = "type")]
    error_type: Option<String>,
    message: Option<String>,
}

/// Stripe customer object (subset).
#[derive(Debug, Clone, Deserialize)]
pub struct StripeCustomer {
    pub id: String,
    pub email: Option<String>,
}

/// Ephemeral key object, returned to the requesting client verbatim.
///
/// Only `secret` is consumed server-side; the rest of the processor's
/// payload is carried through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EphemeralKey {
    pub id: String,
    pub secret: String,
    pub expires: i64,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

/// Payment intent object (subset).
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    pub customer: Option<String>,
    pub client_secret: Option<String>,
    pub last_payment_error: Option<LastPaymentError>,
}

/// Failure detail attached to an intent after a declined attempt.
#[derive(Debug, Clone, Deserialize)]
pub struct LastPaymentError {
    pub message: Option<String>,
    pub code: Option<String>,
}

/// Webhook event envelope (subset: only the fields reconciliation needs).
#[derive(Debug, Clone, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: StripeEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeEventData {
    pub object: StripeEventObject,
}

/// The embedded object is only trusted for its ID; authoritative state is
/// always re-fetched from Stripe before any write.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeEventObject {
    pub id: String,
}

// ─── Webhook Signature Verification ──────────────────────────────

/// Verify a `Stripe-Signature` header against the raw request body.
///
/// The header has the form `t=<unix>,v1=<hex>[,v1=<hex>...]` where each v1
/// value is HMAC-SHA256 of `"{t}.{body}"` under the shared signing secret.
/// Fails closed: any missing, malformed, stale, or mismatched signature is
/// `Unauthorized`, and the body must not be processed.
pub fn verify_webhook_signature(
    payload: &[u8],
    signature_header: Option<&str>,
    signing_secret: &str,
    tolerance_secs: i64,
) -> Result<(), AppError> {
    let header = signature_header
        .ok_or_else(|| AppError::Unauthorized("missing Stripe-Signature header".to_string()))?;

    let mut timestamp: Option<i64> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {} // Ignore unknown scheme fields
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| AppError::Unauthorized("missing timestamp in signature".to_string()))?;

    if signatures.is_empty() {
        return Err(AppError::Unauthorized("no v1 signature found".to_string()));
    }

    let now = chrono::Utc::now().timestamp();
    if (now - timestamp).abs() > tolerance_secs {
        return Err(AppError::Unauthorized(format!(
            "timestamp outside tolerance window ({}s)",
            tolerance_secs
        )));
    }

    let mut mac = HmacSha256::new_from_slice(signing_secret.as_bytes())
        .map_err(|e| AppError::Unauthorized(format!("HMAC init error: {}", e)))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    let expected = hex::encode(mac.finalize().into_bytes());

    let valid = signatures
        .iter()
        .any(|sig| expected.as_bytes().ct_eq(sig.as_bytes()).into());

    if !valid {
        return Err(AppError::Unauthorized("signature mismatch".to_string()));
    }

    Ok(())
}
