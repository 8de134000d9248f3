// SPDX-License-Identifier: MIT

//! Payment document watcher.
//!
//! Subscribes to change events on the payments collection and dispatches
//! records that still need an intent to the orchestrator. This is how a
//! payment document written by a client SDK directly against the store
//! reaches the orchestrator without an HTTP request to this service.
//!
//! Firestore delivers changes in write order per document; a record that
//! has already settled (intent attached or error captured) is skipped, and
//! duplicate dispatch of an unsettled record is harmless because intent
//! creation is idempotent on the record's own identifier.

use crate::db::{collections, FirestoreDb};
use crate::error::AppError;
use crate::models::PaymentRecord;
use crate::services::PaymentOrchestrator;
use firestore::{
    FirestoreListenEvent, FirestoreListener, FirestoreListenerTarget,
    FirestoreTempFilesListenStateStorage,
};

/// Listener target id for the payments collection subscription.
const PAYMENTS_TARGET: u32 = 1;

/// Running subscription on the payments collection.
///
/// Dropping the handle leaves the background listener running; call
/// [`WatcherHandle::shutdown`] to cancel the subscription.
pub struct WatcherHandle {
    listener: FirestoreListener<firestore::FirestoreDb, FirestoreTempFilesListenStateStorage>,
}

impl WatcherHandle {
    /// Cancel the subscription and stop the background listener.
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.listener
            .shutdown()
            .await
            .map_err(|e| AppError::Database(format!("Failed to shut down listener: {}", e)))
    }
}

/// Watches the payments collection for newly created records.
pub struct PaymentWatcher;

impl PaymentWatcher {
    /// Start listening and dispatching. Resume state is kept in temp files
    /// so a restarted process does not replay the full collection.
    pub async fn start(
        db: &FirestoreDb,
        orchestrator: PaymentOrchestrator,
    ) -> Result<WatcherHandle, AppError> {
        let client = db.raw_client()?.clone();

        let mut listener = client
            .create_listener(FirestoreTempFilesListenStateStorage::new())
            .await
            .map_err(|e| AppError::Database(format!("Failed to create listener: {}", e)))?;

        client
            .fluent()
            .select()
            .from(collections::PAYMENTS)
            .listen()
            .add_target(FirestoreListenerTarget::new(PAYMENTS_TARGET), &mut listener)
            .map_err(|e| AppError::Database(format!("Failed to add listen target: {}", e)))?;

        listener
            .start(move |event| {
                let orchestrator = orchestrator.clone();
                async move {
                    handle_event(&orchestrator, event).await;
                    Ok(())
                }
            })
            .await
            .map_err(|e| AppError::Database(format!("Failed to start listener: {}", e)))?;

        tracing::info!(collection = collections::PAYMENTS, "Payment watcher started");

        Ok(WatcherHandle { listener })
    }
}

/// Handle one change event from the subscription.
async fn handle_event(orchestrator: &PaymentOrchestrator, event: FirestoreListenEvent) {
    let change = match event {
        FirestoreListenEvent::DocumentChange(change) => change,
        _ => return,
    };
    let Some(doc) = &change.document else {
        return;
    };

    let record = match firestore::FirestoreDb::deserialize_doc_to::<PaymentRecord>(doc) {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!(doc = %doc.name, error = %e, "Ignoring undecodable payment document");
            return;
        }
    };

    if !record.needs_processing() {
        return;
    }

    let Some(payment_id) = record.id.clone() else {
        tracing::warn!(doc = %doc.name, "Payment change event without document id");
        return;
    };

    tracing::info!(
        payment_id = %payment_id,
        user_id = %record.user_id,
        "Dispatching payment record from watcher"
    );
    orchestrator.process(&payment_id, record).await;
}
