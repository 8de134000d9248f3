// SPDX-License-Identifier: MIT

//! Checkout-Bridge API server
//!
//! Bridges mobile checkout clients to Stripe: customer registration,
//! ephemeral key issuance, payment intent orchestration over Firestore
//! payment documents, and webhook reconciliation.

use checkout_bridge::{
    config::Config,
    db::FirestoreDb,
    services::{
        CustomerRegistry, PaymentOrchestrator, PaymentWatcher, StripeClient, WebhookReconciler,
    },
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Checkout-Bridge API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Stripe REST client, constructed once and shared by every handler
    let stripe = StripeClient::new(config.stripe_secret_key.clone());

    let registry = CustomerRegistry::new(db.clone(), stripe.clone());
    let orchestrator = PaymentOrchestrator::new(db.clone(), stripe.clone());
    let reconciler = WebhookReconciler::new(db.clone(), stripe.clone());

    // Subscribe to payment document changes so records created directly in
    // the store (by mobile SDK clients) also reach the orchestrator.
    let mut watcher = PaymentWatcher::start(&db, orchestrator.clone())
        .await
        .expect("Failed to start payment watcher");

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        stripe,
        registry,
        orchestrator,
        reconciler,
    });

    // Build router
    let app = checkout_bridge::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    watcher.shutdown().await?;
    Ok(())
}

/// Resolve when SIGTERM/ctrl-c arrives (Cloud Run sends SIGTERM on scale-down).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("checkout_bridge=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
