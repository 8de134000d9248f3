// SPDX-License-Identifier: MIT

//! Customer mapping model for storage.

use serde::{Deserialize, Serialize};

/// Mapping from an auth-provider user to a Stripe customer, stored in the
/// `customers` collection (document ID = user ID). Created once on user
/// registration and immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    /// Stable user identifier owned by the auth provider
    pub user_id: String,
    /// Stripe customer ID (`cus_...`)
    pub customer_id: String,
    /// When the mapping was created (ISO 8601)
    pub created_at: String,
}

/// Cached payment method reference written by the mobile clients.
///
/// This service never creates these; it only deletes them when cleaning up
/// after a deregistered user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethodRef {
    /// Stripe payment method ID (also the document ID)
    pub id: String,
    /// Owning user
    pub user_id: String,
}
