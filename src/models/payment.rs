// SPDX-License-Identifier: MIT

//! Payment record model and status mapping.

use crate::services::stripe::PaymentIntent;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a payment record.
///
/// `status` always equals the most recent webhook-confirmed state, or
/// `Pending` if no webhook has arrived yet. The orchestrator never advances
/// it locally; only the reconciler writes a non-pending status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Succeeded,
    Processing,
    Failed,
    Canceled,
}

impl PaymentStatus {
    /// Map an authoritative Stripe intent to a record status.
    ///
    /// Intents that bounced back to `requires_payment_method` after a
    /// declined attempt carry a `last_payment_error` and count as failed;
    /// without one the intent is simply awaiting client action and the
    /// record stays pending.
    pub fn from_intent(intent: &PaymentIntent) -> Self {
        match intent.status.as_str() {
            "succeeded" => PaymentStatus::Succeeded,
            "processing" => PaymentStatus::Processing,
            "canceled" => PaymentStatus::Canceled,
            _ if intent.last_payment_error.is_some() => PaymentStatus::Failed,
            _ => PaymentStatus::Pending,
        }
    }
}

/// Payment record stored in the `payments` collection.
///
/// The document ID is the record's own identifier and is passed to Stripe as
/// the idempotency key, so retried intent creation cannot double-charge.
/// Records are never deleted by this flow; they remain as an audit trail.
///
/// Client SDKs writing directly to the store only need to supply `user_id`,
/// `amount`, and `currency`; everything else defaults, with timestamps
/// stamped when the record is first read back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// Document ID, which is also the Stripe idempotency token. Populated
    /// from `_firestore_id` on reads; never written back as a field.
    #[serde(alias = "_firestore_id", default, skip_serializing)]
    pub id: Option<String>,
    /// Owning user (auth provider UID)
    pub user_id: String,
    /// Amount in minor currency units (positive)
    pub amount: i64,
    /// ISO 4217 currency code, lowercase
    pub currency: String,
    /// Webhook-confirmed status; `pending` until the first webhook lands
    #[serde(default)]
    pub status: PaymentStatus,
    /// Stripe payment intent ID (`pi_...`), set once by the orchestrator
    #[serde(default)]
    pub payment_intent_id: Option<String>,
    /// Client-usable intent secret, set once by the orchestrator
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Ephemeral key secret minted for this payment
    #[serde(default)]
    pub ephemeral_key_secret: Option<String>,
    /// Sanitized user-facing error message, set if orchestration failed
    #[serde(default)]
    pub error: Option<String>,
    /// When the record was created (ISO 8601)
    #[serde(default = "now_rfc3339")]
    pub created_at: String,
    /// Last mutation timestamp (ISO 8601)
    #[serde(default = "now_rfc3339")]
    pub updated_at: String,
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

impl PaymentRecord {
    /// Create a fresh pending record for (user, amount, currency).
    pub fn new(user_id: String, amount: i64, currency: String, now: String) -> Self {
        Self {
            id: None,
            user_id,
            amount,
            currency: currency.to_lowercase(),
            status: PaymentStatus::Pending,
            payment_intent_id: None,
            client_secret: None,
            ephemeral_key_secret: None,
            error: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// True while the record still awaits intent creation.
    ///
    /// The watcher uses this to decide whether a change event is a cue to
    /// orchestrate: a record with an intent already attached or an error
    /// already captured has settled and must not be re-dispatched.
    pub fn needs_processing(&self) -> bool {
        self.payment_intent_id.is_none() && self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::stripe::LastPaymentError;

    fn intent(status: &str, last_error: Option<&str>) -> PaymentIntent {
        PaymentIntent {
            id: "pi_test_123".to_string(),
            amount: 8800,
            currency: "hkd".to_string(),
            status: status.to_string(),
            customer: Some("cus_test_123".to_string()),
            client_secret: Some("pi_test_123_secret_abc".to_string()),
            last_payment_error: last_error.map(|m| LastPaymentError {
                message: Some(m.to_string()),
                code: None,
            }),
        }
    }

    #[test]
    fn test_status_from_terminal_intent_states() {
        assert_eq!(
            PaymentStatus::from_intent(&intent("succeeded", None)),
            PaymentStatus::Succeeded
        );
        assert_eq!(
            PaymentStatus::from_intent(&intent("processing", None)),
            PaymentStatus::Processing
        );
        assert_eq!(
            PaymentStatus::from_intent(&intent("canceled", None)),
            PaymentStatus::Canceled
        );
    }

    #[test]
    fn test_status_declined_attempt_is_failed() {
        let declined = intent("requires_payment_method", Some("Your card was declined."));
        assert_eq!(PaymentStatus::from_intent(&declined), PaymentStatus::Failed);
    }

    #[test]
    fn test_status_awaiting_client_action_stays_pending() {
        assert_eq!(
            PaymentStatus::from_intent(&intent("requires_payment_method", None)),
            PaymentStatus::Pending
        );
        assert_eq!(
            PaymentStatus::from_intent(&intent("requires_confirmation", None)),
            PaymentStatus::Pending
        );
    }

    #[test]
    fn test_minimal_client_write_deserializes() {
        // The shape a mobile SDK writes directly to the store
        let record: PaymentRecord =
            serde_json::from_value(serde_json::json!({
                "user_id": "user_1",
                "amount": 8800,
                "currency": "hkd"
            }))
            .unwrap();

        assert_eq!(record.status, PaymentStatus::Pending);
        assert!(record.needs_processing());
        assert!(!record.created_at.is_empty());
        assert!(!record.updated_at.is_empty());
    }

    #[test]
    fn test_needs_processing() {
        let mut record = PaymentRecord::new(
            "user_1".to_string(),
            8800,
            "HKD".to_string(),
            "2026-01-01T00:00:00Z".to_string(),
        );
        assert_eq!(record.currency, "hkd");
        assert!(record.needs_processing());

        record.payment_intent_id = Some("pi_test_123".to_string());
        assert!(!record.needs_processing());

        record.payment_intent_id = None;
        record.error = Some("An error occurred".to_string());
        assert!(!record.needs_processing());
    }
}
