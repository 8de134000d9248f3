// SPDX-License-Identifier: MIT

//! Webhook reconciliation: converge payment records to Stripe's state.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{PaymentRecord, PaymentStatus};
use crate::services::StripeClient;

/// Event types that drive reconciliation. Anything else is acknowledged and
/// ignored; unrecognized-but-benign events are not errors.
pub const RECOGNIZED_EVENTS: [&str; 4] = [
    "payment_intent.succeeded",
    "payment_intent.processing",
    "payment_intent.payment_failed",
    "payment_intent.canceled",
];

/// Applies processor-confirmed state changes to payment records.
#[derive(Clone)]
pub struct WebhookReconciler {
    db: FirestoreDb,
    stripe: StripeClient,
}

impl WebhookReconciler {
    pub fn new(db: FirestoreDb, stripe: StripeClient) -> Self {
        Self { db, stripe }
    }

    /// True if the event type is one reconciliation acts on.
    pub fn is_recognized(event_type: &str) -> bool {
        RECOGNIZED_EVENTS.contains(&event_type)
    }

    /// Reconcile the payment record for an intent with Stripe's state.
    ///
    /// The event payload is only trusted for the intent ID; the write is
    /// always derived from a fresh retrieve. Replays converge the record to
    /// the same state, so at-least-once delivery is safe.
    pub async fn reconcile(&self, intent_id: &str) -> Result<(), AppError> {
        // Re-fetch the authoritative intent state; webhook delivery order
        // tells us nothing about which state is current.
        let intent = self.stripe.retrieve_payment_intent(intent_id).await?;

        let customer_id = intent
            .customer
            .as_deref()
            .ok_or(AppError::Reconciliation {
                entity: "customer",
                matches: 0,
            })?;

        let customers = self.db.find_customers_by_stripe_id(customer_id).await?;
        let customer = exactly_one(customers, "customer")?;

        let payments = self.db.find_payments_by_intent(&intent.id).await?;
        let mut record = exactly_one(payments, "payment")?;

        if record.user_id != customer.user_id {
            // The intent's customer and the record's owner disagree; a
            // partial write here could leak state across users.
            return Err(AppError::Reconciliation {
                entity: "payment",
                matches: 0,
            });
        }

        let payment_id = record
            .id
            .clone()
            .ok_or_else(|| AppError::Database("payment record missing document id".to_string()))?;

        overwrite_from_intent(&mut record, &intent);
        self.db.set_payment(&payment_id, &record).await?;

        tracing::info!(
            user_id = %record.user_id,
            payment_id = %payment_id,
            payment_intent_id = %intent.id,
            status = ?record.status,
            "Payment record reconciled"
        );
        Ok(())
    }
}

/// Overwrite a record with the authoritative intent state. Amount and
/// currency come from the intent too: Stripe is the source of truth once an
/// intent exists.
fn overwrite_from_intent(record: &mut PaymentRecord, intent: &crate::services::stripe::PaymentIntent) {
    record.status = PaymentStatus::from_intent(intent);
    record.amount = intent.amount;
    record.currency = intent.currency.clone();
    record.payment_intent_id = Some(intent.id.clone());
    if let Some(secret) = &intent.client_secret {
        record.client_secret = Some(secret.clone());
    }
    record.error = match record.status {
        PaymentStatus::Failed => intent
            .last_payment_error
            .as_ref()
            .and_then(|e| e.message.clone())
            .or_else(|| Some(AppError::GENERIC_USER_MESSAGE.to_string())),
        _ => None,
    };
    record.updated_at = chrono::Utc::now().to_rfc3339();
}

/// The zero, one, and many match cases are where reconciliation correctness
/// hinges, so each is an explicit branch. Zero and many both fail delivery
/// (HTTP 400) so Stripe retries later.
fn exactly_one<T>(mut matches: Vec<T>, entity: &'static str) -> Result<T, AppError> {
    match matches.len() {
        0 => Err(AppError::Reconciliation { entity, matches: 0 }),
        1 => Ok(matches.remove(0)),
        n => Err(AppError::Reconciliation { entity, matches: n }),
    }
}
