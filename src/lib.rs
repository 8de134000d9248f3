// SPDX-License-Identifier: MIT

//! Checkout-Bridge: Stripe mobile checkout backend over Firestore
//!
//! This crate bridges authenticated mobile clients, a Firestore document
//! store, and the Stripe REST API: customer registration, ephemeral key
//! issuance, payment intent orchestration, and webhook reconciliation.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::FirestoreDb;
use services::{CustomerRegistry, PaymentOrchestrator, StripeClient, WebhookReconciler};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub stripe: StripeClient,
    pub registry: CustomerRegistry,
    pub orchestrator: PaymentOrchestrator,
    pub reconciler: WebhookReconciler,
}
