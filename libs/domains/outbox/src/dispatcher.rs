//! Outbox dispatcher
//!
//! Drains unprocessed FOOD_DELETED events: deletes the blob folder of
//! each deleted food, then marks exactly the successful events processed.
//! Failed events stay unprocessed and are retried on the next cycle.

use std::sync::Arc;

use storage::BlobStore;
use tracing::{debug, info, instrument, warn};

use crate::error::OutboxResult;
use crate::lease::Lease;
use crate::repository::{OutboxRepository, EVENT_FOOD_DELETED};

const LEASE_NAME: &str = "outbox_food_deleted";

/// Blob folder for a food's product images
pub fn blob_prefix(food_id: &str) -> String {
    format!("images/products/{}/", food_id)
}

pub struct OutboxDispatcher {
    outbox: Arc<dyn OutboxRepository>,
    blobs: Arc<dyn BlobStore>,
    lease: Arc<dyn Lease>,
    batch_size: u64,
}

impl OutboxDispatcher {
    pub fn new(
        outbox: Arc<dyn OutboxRepository>,
        blobs: Arc<dyn BlobStore>,
        lease: Arc<dyn Lease>,
        batch_size: u64,
    ) -> Self {
        Self {
            outbox,
            blobs,
            lease,
            batch_size,
        }
    }

    /// Run a single dispatch cycle. Never fails: every error is logged
    /// and left for the next cycle.
    #[instrument(skip(self))]
    pub async fn run_cycle(&self) {
        let token = match self.lease.acquire(LEASE_NAME).await {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!("Lease held by another worker, skipping cycle");
                return;
            }
            Err(e) => {
                warn!(error = %e, "Failed to acquire lease");
                return;
            }
        };

        if let Err(e) = self.process_batch().await {
            warn!(error = %e, "Outbox batch failed");
        }

        if let Err(e) = self.lease.release(token).await {
            warn!(error = %e, "Failed to release lease");
        }
    }

    async fn process_batch(&self) -> OutboxResult<()> {
        let events = self
            .outbox
            .fetch_unprocessed(EVENT_FOOD_DELETED, self.batch_size)
            .await?;

        if events.is_empty() {
            debug!("No unprocessed outbox events");
            return Ok(());
        }

        let mut succeeded: Vec<i64> = Vec::with_capacity(events.len());
        for event in &events {
            let prefix = blob_prefix(&event.aggregate_id);
            match self.blobs.delete_folder(&prefix).await {
                Ok(()) => succeeded.push(event.id),
                Err(e) => {
                    warn!(event_id = event.id, prefix, error = %e, "Blob cleanup failed, will retry");
                }
            }
        }

        if !succeeded.is_empty() {
            let marked = self.outbox.mark_processed(&succeeded).await?;
            info!(
                fetched = events.len(),
                processed = marked,
                "Outbox cycle complete"
            );
        }

        Ok(())
    }
}
