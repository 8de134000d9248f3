// SPDX-License-Identifier: MIT

//! Payment intent orchestration.
//!
//! A newly created payment record is the request; the fields written back
//! onto it are the response the client observes. Failures never propagate
//! across the trigger boundary: they are captured onto the record in
//! sanitized form and reported in full to the operational log.

use crate::config::PINNED_STRIPE_API_VERSION;
use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::PaymentRecord;
use crate::services::StripeClient;

/// Creates Stripe payment intents for newly observed payment records.
#[derive(Clone)]
pub struct PaymentOrchestrator {
    db: FirestoreDb,
    stripe: StripeClient,
}

impl PaymentOrchestrator {
    pub fn new(db: FirestoreDb, stripe: StripeClient) -> Self {
        Self { db, stripe }
    }

    /// Process a newly created payment record.
    ///
    /// Any failure is captured onto the record; this method itself never
    /// fails. Not retried automatically: the only retry path is the client
    /// creating a new record, which the Stripe idempotency key makes safe.
    pub async fn process(&self, payment_id: &str, record: PaymentRecord) {
        let user_id = record.user_id.clone();
        if let Err(err) = self.create_intent(payment_id, record).await {
            self.capture_failure(payment_id, &user_id, err).await;
        }
    }

    /// The happy path: resolve customer, mint ephemeral key, create intent,
    /// write the combined result back. Each step's failure aborts the rest.
    async fn create_intent(
        &self,
        payment_id: &str,
        mut record: PaymentRecord,
    ) -> Result<(), AppError> {
        let customer = self
            .db
            .get_customer(&record.user_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Customer record for user {}", record.user_id))
            })?;

        let ephemeral_key = self
            .stripe
            .create_ephemeral_key(&customer.customer_id, PINNED_STRIPE_API_VERSION)
            .await?;

        // The record's own identifier is the idempotency key: duplicate
        // trigger delivery or client retries can never create a second
        // processor-side intent for the same logical payment.
        let intent = self
            .stripe
            .create_payment_intent(
                record.amount,
                &record.currency,
                &customer.customer_id,
                payment_id,
            )
            .await?;

        record.payment_intent_id = Some(intent.id.clone());
        record.client_secret = intent.client_secret.clone();
        record.ephemeral_key_secret = Some(ephemeral_key.secret);
        record.updated_at = chrono::Utc::now().to_rfc3339();
        // Status stays pending: only webhook-confirmed states advance it.

        self.db.set_payment(payment_id, &record).await?;

        tracing::info!(
            user_id = %record.user_id,
            payment_id,
            payment_intent_id = %intent.id,
            amount = record.amount,
            currency = %record.currency,
            "Payment intent created"
        );
        Ok(())
    }

    /// Capture a failure onto the record (sanitized) and report the full
    /// detail to the operational log, tagged with the user for diagnosis.
    async fn capture_failure(&self, payment_id: &str, user_id: &str, err: AppError) {
        tracing::error!(
            user_id,
            payment_id,
            error = %err,
            "Payment orchestration failed"
        );

        let message = err.user_facing_message();
        if let Err(write_err) = self.set_payment_error(payment_id, &message).await {
            tracing::error!(
                user_id,
                payment_id,
                error = %write_err,
                "Failed to record payment error"
            );
        }
    }

    /// Merge an error message onto the record, preserving the other fields.
    async fn set_payment_error(&self, payment_id: &str, message: &str) -> Result<(), AppError> {
        let mut record = self
            .db
            .get_payment(payment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Payment {}", payment_id)))?;

        record.error = Some(message.to_string());
        record.updated_at = chrono::Utc::now().to_rfc3339();
        self.db.set_payment(payment_id, &record).await
    }
}
