// SPDX-License-Identifier: MIT

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Customers (user → Stripe customer mappings)
//! - Payments (payment records, also the client rendezvous documents)
//! - Payment methods (cached references, deleted on user cleanup)

use crate::db::collections;
use crate::error::AppError;
use crate::models::{Customer, PaymentMethodRef, PaymentRecord};
use futures_util::{stream, StreamExt};

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated
        // connection to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    ///
    /// The emulator ignores credentials, so a static unsigned JWT stands in
    /// for a real token source.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Connecting to the Firestore emulator without credentials");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJsb2NhbCJ9."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let client = firestore::FirestoreDb::with_options_token_source(
            firestore::FirestoreDbOptions::new(project_id.to_string()),
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore emulator: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore (emulator)");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Raw client handle, used by the payment watcher to register listeners.
    pub(crate) fn raw_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.get_client()
    }

    // ─── Customer Operations ─────────────────────────────────────

    /// Get the customer mapping for a user.
    pub async fn get_customer(&self, user_id: &str) -> Result<Option<Customer>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::CUSTOMERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Persist a new customer mapping (document ID = user ID).
    pub async fn create_customer(&self, customer: &Customer) -> Result<(), AppError> {
        let _: Customer = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::CUSTOMERS)
            .document_id(&customer.user_id)
            .object(customer)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a customer mapping.
    pub async fn delete_customer(&self, user_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::CUSTOMERS)
            .document_id(user_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Find customer mappings by Stripe customer ID.
    ///
    /// Returns all matches; the reconciler enforces the exactly-one rule.
    pub async fn find_customers_by_stripe_id(
        &self,
        customer_id: &str,
    ) -> Result<Vec<Customer>, AppError> {
        let customer_id = customer_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::CUSTOMERS)
            .filter(move |q| q.for_all([q.field("customer_id").eq(customer_id.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Payment Operations ──────────────────────────────────────

    /// Get a payment record by its identifier.
    pub async fn get_payment(&self, payment_id: &str) -> Result<Option<PaymentRecord>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PAYMENTS)
            .obj()
            .one(payment_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new payment record. Fails if the document already exists,
    /// which keeps record creation a true create (not an upsert).
    pub async fn create_payment(
        &self,
        payment_id: &str,
        record: &PaymentRecord,
    ) -> Result<(), AppError> {
        let _: PaymentRecord = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::PAYMENTS)
            .document_id(payment_id)
            .object(record)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Overwrite a payment record (orchestrator write-back and reconciler
    /// authoritative updates).
    pub async fn set_payment(
        &self,
        payment_id: &str,
        record: &PaymentRecord,
    ) -> Result<(), AppError> {
        let _: PaymentRecord = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::PAYMENTS)
            .document_id(payment_id)
            .object(record)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Find payment records by Stripe payment intent ID.
    ///
    /// Returns all matches; the reconciler enforces the exactly-one rule.
    pub async fn find_payments_by_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Vec<PaymentRecord>, AppError> {
        let payment_intent_id = payment_intent_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::PAYMENTS)
            .filter(move |q| q.for_all([q.field("payment_intent_id").eq(payment_intent_id.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Payment Method Operations ───────────────────────────────

    /// List cached payment method references for a user.
    pub async fn list_payment_methods(
        &self,
        user_id: &str,
    ) -> Result<Vec<PaymentMethodRef>, AppError> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::PAYMENT_METHODS)
            .filter(move |q| q.for_all([q.field("user_id").eq(user_id.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete all cached payment method references for a user.
    ///
    /// Uses concurrent deletes with a limit to avoid overloading Firestore.
    /// Returns the number of documents deleted.
    pub async fn delete_payment_methods(&self, user_id: &str) -> Result<usize, AppError> {
        let refs = self.list_payment_methods(user_id).await?;
        let count = refs.len();
        let client = self.get_client()?;

        stream::iter(refs)
            .map(|pm| async move {
                client
                    .fluent()
                    .delete()
                    .from(collections::PAYMENT_METHODS)
                    .document_id(&pm.id)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok::<_, AppError>(())
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        Ok(count)
    }
}
