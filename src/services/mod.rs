// SPDX-License-Identifier: MIT

//! Services module - business logic layer.

pub mod orchestrator;
pub mod reconciler;
pub mod registry;
pub mod stripe;
pub mod watcher;

pub use orchestrator::PaymentOrchestrator;
pub use reconciler::WebhookReconciler;
pub use registry::CustomerRegistry;
pub use stripe::StripeClient;
pub use watcher::{PaymentWatcher, WatcherHandle};
