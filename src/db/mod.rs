// SPDX-License-Identifier: MIT

//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    /// User → Stripe customer mappings (keyed by user ID)
    pub const CUSTOMERS: &str = "customers";
    /// Payment records (keyed by the record's own identifier)
    pub const PAYMENTS: &str = "payments";
    /// Cached payment method references written by clients
    pub const PAYMENT_METHODS: &str = "payment_methods";
}
