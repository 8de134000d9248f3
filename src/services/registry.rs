// SPDX-License-Identifier: MIT

//! Customer registry: maps auth-provider users to Stripe customers.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::Customer;
use crate::services::StripeClient;

/// Handles user lifecycle signals from the auth provider.
#[derive(Clone)]
pub struct CustomerRegistry {
    db: FirestoreDb,
    stripe: StripeClient,
}

impl CustomerRegistry {
    pub fn new(db: FirestoreDb, stripe: StripeClient) -> Self {
        Self { db, stripe }
    }

    /// On user creation: create a Stripe customer carrying the user ID in
    /// its metadata, then persist the mapping. The mapping is created once
    /// and never mutated.
    pub async fn handle_user_created(
        &self,
        user_id: &str,
        email: Option<&str>,
    ) -> Result<Customer, AppError> {
        if let Some(existing) = self.db.get_customer(user_id).await? {
            // Duplicate delivery of the creation signal; the mapping is
            // immutable, so the first write wins.
            tracing::info!(user_id, customer_id = %existing.customer_id, "Customer mapping already exists");
            return Ok(existing);
        }

        let stripe_customer = self.stripe.create_customer(user_id, email).await?;

        let customer = Customer {
            user_id: user_id.to_string(),
            customer_id: stripe_customer.id,
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        self.db.create_customer(&customer).await?;

        tracing::info!(
            user_id,
            customer_id = %customer.customer_id,
            "Stripe customer created and mapped"
        );
        Ok(customer)
    }

    /// On user deletion: delete the Stripe customer, then the locally cached
    /// payment method references, then the mapping, in that order.
    ///
    /// The ordering means a crash mid-sequence leaves the mapping in place,
    /// so a redelivered deletion signal retries the remote delete (which
    /// tolerates an already-absent customer) before any local state is lost.
    pub async fn handle_user_deleted(&self, user_id: &str) -> Result<(), AppError> {
        let customer = match self.db.get_customer(user_id).await? {
            Some(c) => c,
            None => {
                // Replayed deletion or user never completed registration.
                tracing::info!(user_id, "No customer mapping to clean up");
                return Ok(());
            }
        };

        self.stripe.delete_customer(&customer.customer_id).await?;

        let removed = self.db.delete_payment_methods(user_id).await?;
        self.db.delete_customer(user_id).await?;

        tracing::info!(
            user_id,
            customer_id = %customer.customer_id,
            payment_methods_removed = removed,
            "User cleanup complete"
        );
        Ok(())
    }
}
