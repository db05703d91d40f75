use async_trait::async_trait;

use crate::entity;
use crate::error::OutboxResult;

/// Aggregate type recorded for food events
pub const AGGREGATE_FOOD: &str = "FOOD";
/// Event type for food deletions awaiting blob cleanup
pub const EVENT_FOOD_DELETED: &str = "FOOD_DELETED";

/// Repository trait for the outbox table
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OutboxRepository: Send + Sync {
    /// Append a new unprocessed event
    async fn record(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
        event_type: &str,
        payload: Option<String>,
    ) -> OutboxResult<entity::Model>;

    /// Fetch the oldest unprocessed events of a type, ordered by creation time
    async fn fetch_unprocessed(
        &self,
        event_type: &str,
        limit: u64,
    ) -> OutboxResult<Vec<entity::Model>>;

    /// Mark the given events processed, returning how many rows changed
    async fn mark_processed(&self, ids: &[i64]) -> OutboxResult<u64>;
}
