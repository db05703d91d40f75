//! Request deduplication backed by the cache
//!
//! Client retries of mutating requests carry a request id; the outcome of
//! the first attempt is stored under a TTL key and replayed on duplicates.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use strum::Display;
use tracing::instrument;

use crate::cache::Cache;
use crate::error::FoodResult;

/// How long a processed marker lives, in seconds
const PROCESSED_TTL_SECS: u64 = 3600;

/// Entity kinds that participate in request deduplication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ProcessedEntityType {
    Food,
}

/// Stores and replays the outcomes of deduplicated requests
pub struct RequestDeduplication {
    cache: Arc<dyn Cache>,
    ttl_secs: u64,
}

impl RequestDeduplication {
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self {
            cache,
            ttl_secs: PROCESSED_TTL_SECS,
        }
    }

    fn key(entity: ProcessedEntityType, owner: &str, request_id: &str) -> String {
        format!("processed:{}:{}:{}", entity, owner, request_id)
    }

    /// Whether this request id was already processed for the owner
    #[instrument(skip(self))]
    pub async fn is_processed(
        &self,
        entity: ProcessedEntityType,
        owner: &str,
        request_id: &str,
    ) -> FoodResult<bool> {
        self.cache.exists(&Self::key(entity, owner, request_id)).await
    }

    /// Record the outcome of a processed request
    #[instrument(skip(self, outcome))]
    pub async fn mark_processed<T: Serialize + Sync>(
        &self,
        entity: ProcessedEntityType,
        owner: &str,
        request_id: &str,
        outcome: &T,
    ) -> FoodResult<()> {
        let payload = serde_json::to_string(outcome)?;
        self.cache
            .set(&Self::key(entity, owner, request_id), &payload, self.ttl_secs)
            .await
    }

    /// Fetch a previously stored outcome. A marker that no longer
    /// deserializes is treated as absent.
    #[instrument(skip(self))]
    pub async fn get_processed<T: DeserializeOwned>(
        &self,
        entity: ProcessedEntityType,
        owner: &str,
        request_id: &str,
    ) -> FoodResult<Option<T>> {
        let raw = self.cache.get(&Self::key(entity, owner, request_id)).await?;

        Ok(raw.and_then(|payload| serde_json::from_str(&payload).ok()))
    }
}
