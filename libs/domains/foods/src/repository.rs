use async_trait::async_trait;

use crate::error::FoodResult;
use crate::models::Food;

/// Repository trait for Food persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FoodRepository: Send + Sync {
    /// Insert a new food document.
    ///
    /// Returns [`FoodError::DuplicateCode`](crate::FoodError::DuplicateCode)
    /// when a document with the same code already exists.
    async fn insert(&self, food: &Food) -> FoodResult<()>;

    /// Get a food by its id (which equals its code)
    async fn find_by_id(&self, id: &str) -> FoodResult<Option<Food>>;

    /// Replace an existing food document
    async fn save(&self, food: &Food) -> FoodResult<()>;

    /// Delete a food owned by the given user.
    ///
    /// Returns `true` only if a document was actually removed.
    async fn delete_by_id_and_user(&self, id: &str, user_id: &str) -> FoodResult<bool>;

    /// List foods submitted by a user, newest ids last, paginated
    async fn find_all_by_user(&self, user_id: &str, offset: u64, limit: u64)
        -> FoodResult<Vec<Food>>;
}

/// Monotonic sequence source for generated food codes
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SequenceRepository: Send + Sync {
    /// Atomically increment and return the named sequence
    async fn next(&self, name: &str) -> FoodResult<i64>;
}

/// Records domain events in the transactional outbox
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OutboxRecorder: Send + Sync {
    /// Record that a food was deleted so its blobs get cleaned up later
    async fn record_food_deleted(&self, food_id: &str) -> FoodResult<()>;
}
