//! Cache-aside layer over the food service
//!
//! Redis keeps hot foods, search pages, and suggestion lists. The cache
//! is strictly an accelerator: every cache failure is logged and the
//! request falls through to the underlying service.

use std::sync::Arc;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::Serialize;
use tracing::{instrument, warn};

use crate::dedup::{ProcessedEntityType, RequestDeduplication};
use crate::error::FoodResult;
use crate::models::{CreateFood, Food, PatchFood};
use crate::query::{normalize_query, normalize_suggestion_query};
use crate::service::FoodService;

/// Default TTL for cached entries, in seconds
const CACHE_TTL_SECS: u64 = 3600;

/// Minimal key-value cache operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> FoodResult<Option<String>>;
    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> FoodResult<()>;
    async fn delete(&self, key: &str) -> FoodResult<()>;
    async fn exists(&self, key: &str) -> FoodResult<bool>;
}

/// Redis implementation of [`Cache`]
///
/// [`ConnectionManager`] is cheap to clone and reconnects on its own.
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> FoodResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> FoodResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key, value, ttl_secs).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> FoodResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> FoodResult<bool> {
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }
}

pub fn food_key(id: &str) -> String {
    format!("food:{}", id)
}

pub fn search_key(normalized: &str, offset: u64, limit: u64) -> String {
    let digest = md5::compute(format!("{}-{}-{}", normalized, offset, limit));
    format!("search:{:x}", digest)
}

pub fn suggest_key(normalized: &str) -> String {
    format!("suggest:{:x}", md5::compute(normalized))
}

/// [`FoodService`] wrapped with cache-aside reads, write-through on
/// mutation, and request deduplication for creates.
pub struct CachedFoodService {
    inner: FoodService,
    cache: Arc<dyn Cache>,
    dedup: RequestDeduplication,
    ttl_secs: u64,
}

impl CachedFoodService {
    pub fn new(inner: FoodService, cache: Arc<dyn Cache>) -> Self {
        let dedup = RequestDeduplication::new(Arc::clone(&cache));
        Self {
            inner,
            cache,
            dedup,
            ttl_secs: CACHE_TTL_SECS,
        }
    }

    pub fn with_ttl(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    /// Create a food, replaying the stored outcome when the same
    /// (user, request id) pair was already processed.
    #[instrument(skip(self, input), fields(product_name = %input.product_name))]
    pub async fn create(
        &self,
        input: CreateFood,
        user_id: Option<String>,
        request_id: Option<String>,
    ) -> FoodResult<Food> {
        let dedup_ids = match (&user_id, &request_id) {
            (Some(user), Some(request)) => Some((user.clone(), request.clone())),
            _ => None,
        };

        if let Some((user, request)) = &dedup_ids {
            match self
                .dedup
                .get_processed::<Food>(ProcessedEntityType::Food, user, request)
                .await
            {
                Ok(Some(replay)) => return Ok(replay),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Deduplication lookup failed"),
            }
        }

        let created = self.inner.create(input, user_id).await?;

        if let Some((user, request)) = &dedup_ids {
            if let Err(e) = self
                .dedup
                .mark_processed(ProcessedEntityType::Food, user, request, &created)
                .await
            {
                warn!(error = %e, "Failed to mark request processed");
            }
        }

        self.put(&food_key(&created.id), &created).await;
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: &str) -> FoodResult<Food> {
        let key = food_key(id);
        if let Some(food) = self.read::<Food>(&key).await {
            return Ok(food);
        }

        let food = self.inner.find_by_id(id).await?;
        self.put(&key, &food).await;
        Ok(food)
    }

    #[instrument(skip(self))]
    pub async fn find_all_by_user(
        &self,
        user_id: &str,
        offset: u64,
        limit: u64,
    ) -> FoodResult<Vec<Food>> {
        self.inner.find_all_by_user(user_id, offset, limit).await
    }

    #[instrument(skip(self, patch))]
    pub async fn patch(&self, id: &str, patch: PatchFood) -> FoodResult<Food> {
        let food = self.inner.patch(id, patch).await?;
        self.put(&food_key(id), &food).await;
        Ok(food)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str, user_id: &str) -> FoodResult<bool> {
        let removed = self.inner.delete(id, user_id).await?;
        if removed {
            self.evict(&food_key(id)).await;
        }
        Ok(removed)
    }

    /// Search with cached result pages. Empty result sets are never
    /// cached so late-indexed documents show up without waiting for
    /// the TTL.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, offset: u64, limit: u64) -> FoodResult<Vec<Food>> {
        let normalized = normalize_query(query);
        let key = search_key(&normalized, offset, limit);

        if let Some(foods) = self.read::<Vec<Food>>(&key).await {
            return Ok(foods);
        }

        let foods = self.inner.search(query, offset, limit).await?;
        if !foods.is_empty() {
            self.put(&key, &foods).await;
        }
        Ok(foods)
    }

    #[instrument(skip(self))]
    pub async fn suggestions(&self, query: &str) -> FoodResult<Vec<String>> {
        let normalized = normalize_suggestion_query(query);
        let key = suggest_key(&normalized);

        if let Some(names) = self.read::<Vec<String>>(&key).await {
            return Ok(names);
        }

        let names = self.inner.suggestions(query).await?;
        if !names.is_empty() {
            self.put(&key, &names).await;
        }
        Ok(names)
    }

    /// Read and deserialize a cached value. Misses, read failures, and
    /// stale payloads all come back as `None`.
    async fn read<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.cache.get(key).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key, error = %e, "Cache read failed");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "Discarding undeserializable cache entry");
                None
            }
        }
    }

    async fn put<T: Serialize>(&self, key: &str, value: &T) {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key, error = %e, "Failed to serialize cache entry");
                return;
            }
        };

        if let Err(e) = self.cache.set(key, &payload, self.ttl_secs).await {
            warn!(key, error = %e, "Cache write failed");
        }
    }

    async fn evict(&self, key: &str) {
        if let Err(e) = self.cache.delete(key).await {
            warn!(key, error = %e, "Cache eviction failed");
        }
    }
}
