//! Food Service - Business logic layer

use std::sync::Arc;
use std::time::Duration;

use database::common::retry_fixed;
use tracing::{instrument, warn};
use validator::Validate;

use crate::enrichment::KeywordGenerator;
use crate::error::{FoodError, FoodResult};
use crate::models::{internal_code, is_plausible_barcode, CreateFood, Food, PatchFood, CODE_SEQUENCE};
use crate::query::{
    build_search_query, build_suggestion_query, normalize_query, normalize_suggestion_query,
};
use crate::repository::{FoodRepository, OutboxRecorder, SequenceRepository};
use crate::search::SearchIndex;

/// Attempts for inserting with a freshly generated code before giving up
const CREATE_RETRY_ATTEMPTS: u32 = 3;
const CREATE_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Maximum suggestions returned to the caller
const SUGGESTION_LIMIT: usize = 16;
/// Fetched from the index before name deduplication
const SUGGESTION_FETCH_SIZE: u64 = 32;

/// Food service providing business logic operations
///
/// Orchestrates the primary store, the code sequence, the outbox,
/// the search index, and keyword enrichment.
pub struct FoodService {
    foods: Arc<dyn FoodRepository>,
    sequences: Arc<dyn SequenceRepository>,
    outbox: Arc<dyn OutboxRecorder>,
    keywords: Arc<dyn KeywordGenerator>,
    index: Arc<dyn SearchIndex>,
}

impl FoodService {
    pub fn new(
        foods: Arc<dyn FoodRepository>,
        sequences: Arc<dyn SequenceRepository>,
        outbox: Arc<dyn OutboxRecorder>,
        keywords: Arc<dyn KeywordGenerator>,
        index: Arc<dyn SearchIndex>,
    ) -> Self {
        Self {
            foods,
            sequences,
            outbox,
            keywords,
            index,
        }
    }

    /// Create a food.
    ///
    /// A plausible supplied barcode becomes the document id; replaying the
    /// same payload against an existing code returns the stored food instead
    /// of failing. An absent or implausible code falls back to a generated
    /// internal code, retrying on the (unlikely) sequence collision.
    #[instrument(skip(self, input), fields(product_name = %input.product_name))]
    pub async fn create(&self, input: CreateFood, user_id: Option<String>) -> FoodResult<Food> {
        input
            .validate()
            .map_err(|e| FoodError::Validation(e.to_string()))?;

        let supplied_code = input
            .code
            .as_deref()
            .filter(|code| is_plausible_barcode(code));

        let food = match supplied_code {
            Some(code) => self.create_with_barcode(&input, code, user_id).await?,
            None => self.create_with_generated_code(&input, user_id).await?,
        };

        self.spawn_enrichment(food.clone());
        Ok(food)
    }

    async fn create_with_barcode(
        &self,
        input: &CreateFood,
        code: &str,
        user_id: Option<String>,
    ) -> FoodResult<Food> {
        if let Some(existing) = self.foods.find_by_id(code).await? {
            return if existing.matches_request(input) {
                Ok(existing)
            } else {
                Err(FoodError::Conflict(code.to_string()))
            };
        }

        let food = Food::from_create(input, code.to_string(), user_id);
        match self.foods.insert(&food).await {
            Ok(()) => Ok(food),
            // Lost a concurrent race on the same barcode; re-check for a replay
            Err(FoodError::DuplicateCode(_)) => match self.foods.find_by_id(code).await? {
                Some(existing) if existing.matches_request(input) => Ok(existing),
                _ => Err(FoodError::Conflict(code.to_string())),
            },
            Err(e) => Err(e),
        }
    }

    async fn create_with_generated_code(
        &self,
        input: &CreateFood,
        user_id: Option<String>,
    ) -> FoodResult<Food> {
        retry_fixed(
            || {
                let user_id = &user_id;
                async move {
                    let sequence = self.sequences.next(CODE_SEQUENCE).await?;
                    let food = Food::from_create(input, internal_code(sequence), user_id.clone());
                    self.foods.insert(&food).await?;
                    Ok(food)
                }
            },
            CREATE_RETRY_ATTEMPTS,
            CREATE_RETRY_DELAY,
            |e| matches!(e, FoodError::DuplicateCode(_)),
        )
        .await
        .map_err(|e| match e {
            FoodError::DuplicateCode(code) => FoodError::Conflict(code),
            other => other,
        })
    }

    /// Get a food by id
    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: &str) -> FoodResult<Food> {
        self.foods
            .find_by_id(id)
            .await?
            .ok_or_else(|| FoodError::NotFound(id.to_string()))
    }

    /// List foods submitted by a user, paginated
    #[instrument(skip(self))]
    pub async fn find_all_by_user(
        &self,
        user_id: &str,
        offset: u64,
        limit: u64,
    ) -> FoodResult<Vec<Food>> {
        self.foods.find_all_by_user(user_id, offset, limit).await
    }

    /// Apply a partial update to a food
    #[instrument(skip(self, patch))]
    pub async fn patch(&self, id: &str, patch: PatchFood) -> FoodResult<Food> {
        patch
            .validate()
            .map_err(|e| FoodError::Validation(e.to_string()))?;

        let mut food = self.find_by_id(id).await?;
        food.apply_patch(&patch);
        self.foods.save(&food).await?;
        Ok(food)
    }

    /// Delete a user's food.
    ///
    /// Records a deletion event in the outbox only when a document was
    /// actually removed, so blob cleanup never runs for foreign or
    /// unknown ids.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str, user_id: &str) -> FoodResult<bool> {
        let removed = self.foods.delete_by_id_and_user(id, user_id).await?;

        if removed {
            self.outbox.record_food_deleted(id).await?;
        }

        Ok(removed)
    }

    /// Full-text search over the catalog
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, offset: u64, limit: u64) -> FoodResult<Vec<Food>> {
        let normalized = normalize_query(query);
        if normalized.is_empty() {
            return Err(FoodError::Validation(
                "search query must not be empty".to_string(),
            ));
        }

        let body = build_search_query(&normalized);
        self.index.search(&body, offset, limit).await
    }

    /// Autocomplete suggestions: distinct product names in relevance order
    #[instrument(skip(self))]
    pub async fn suggestions(&self, query: &str) -> FoodResult<Vec<String>> {
        let normalized = normalize_suggestion_query(query);
        if normalized.is_empty() {
            return Ok(Vec::new());
        }

        let body = build_suggestion_query(&normalized);
        let foods = self.index.search(&body, 0, SUGGESTION_FETCH_SIZE).await?;

        let mut names: Vec<String> = Vec::new();
        for food in foods {
            let name = food.product_name;
            if !names.iter().any(|n| n.eq_ignore_ascii_case(&name)) {
                names.push(name);
            }
            if names.len() == SUGGESTION_LIMIT {
                break;
            }
        }

        Ok(names)
    }

    fn spawn_enrichment(&self, food: Food) {
        // Already-enriched replays don't need another round trip
        if !food.keywords.is_empty() {
            return;
        }

        let foods = Arc::clone(&self.foods);
        let keywords = Arc::clone(&self.keywords);
        tokio::spawn(async move {
            enrich_keywords(foods, keywords, food).await;
        });
    }
}

/// Generate keywords for a freshly created food and store them.
///
/// Runs detached from the create request. Failures are logged and the
/// food simply stays without keywords.
async fn enrich_keywords(
    foods: Arc<dyn FoodRepository>,
    generator: Arc<dyn KeywordGenerator>,
    food: Food,
) {
    let generated = match generator.generate_keywords(&food).await {
        Ok(keywords) => keywords,
        Err(e) => {
            warn!(food_id = %food.id, error = %e, "Keyword enrichment failed");
            return;
        }
    };

    if generated.is_empty() {
        return;
    }

    // Re-read so a concurrent patch is not clobbered
    let latest = match foods.find_by_id(&food.id).await {
        Ok(Some(latest)) => latest,
        Ok(None) => return,
        Err(e) => {
            warn!(food_id = %food.id, error = %e, "Keyword enrichment lookup failed");
            return;
        }
    };

    let mut updated = latest;
    updated.keywords = generated;
    if let Err(e) = foods.save(&updated).await {
        warn!(food_id = %updated.id, error = %e, "Failed to store keywords");
    }
}
