//! MongoDB implementations of the food repositories

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    bson::doc,
    error::{ErrorKind, WriteFailure},
    options::{IndexOptions, ReturnDocument},
    Collection, Database, IndexModel,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{FoodError, FoodResult};
use crate::models::Food;
use crate::repository::{FoodRepository, SequenceRepository};

/// MongoDB implementation of [`FoodRepository`] backed by the `foods` collection
pub struct MongoFoodRepository {
    collection: Collection<Food>,
}

impl MongoFoodRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.collection::<Food>("foods");
        Self { collection }
    }

    /// Create a MongoFoodRepository with a custom collection name
    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        let collection = db.collection::<Food>(collection_name);
        Self { collection }
    }

    /// Initialize indexes for optimal query performance
    pub async fn init_indexes(&self) -> FoodResult<()> {
        let indexes = vec![
            // Unique business code (mirrors _id, kept for explicit lookups)
            IndexModel::builder()
                .keys(doc! { "code": 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .name("idx_code_unique".to_string())
                        .build(),
                )
                .build(),
            // Per-user listings
            IndexModel::builder()
                .keys(doc! { "user_id": 1 })
                .options(
                    IndexOptions::builder()
                        .sparse(true)
                        .name("idx_user_id".to_string())
                        .build(),
                )
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        tracing::info!("Food indexes created successfully");
        Ok(())
    }

    /// Get the underlying collection for advanced operations
    pub fn collection(&self) -> &Collection<Food> {
        &self.collection
    }
}

/// Whether a MongoDB error is a duplicate-key violation (code 11000)
fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match &*err.kind {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == 11000,
        ErrorKind::Command(command_error) => command_error.code == 11000,
        _ => false,
    }
}

#[async_trait]
impl FoodRepository for MongoFoodRepository {
    #[instrument(skip(self, food), fields(food_id = %food.id))]
    async fn insert(&self, food: &Food) -> FoodResult<()> {
        match self.collection.insert_one(food).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(FoodError::DuplicateCode(food.code.clone())),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> FoodResult<Option<Food>> {
        let food = self.collection.find_one(doc! { "_id": id }).await?;
        Ok(food)
    }

    #[instrument(skip(self, food), fields(food_id = %food.id))]
    async fn save(&self, food: &Food) -> FoodResult<()> {
        let result = self
            .collection
            .replace_one(doc! { "_id": &food.id }, food)
            .await?;

        if result.matched_count == 0 {
            return Err(FoodError::NotFound(food.id.clone()));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_by_id_and_user(&self, id: &str, user_id: &str) -> FoodResult<bool> {
        let result = self
            .collection
            .delete_one(doc! { "_id": id, "user_id": user_id })
            .await?;

        Ok(result.deleted_count > 0)
    }

    #[instrument(skip(self))]
    async fn find_all_by_user(
        &self,
        user_id: &str,
        offset: u64,
        limit: u64,
    ) -> FoodResult<Vec<Food>> {
        let cursor = self
            .collection
            .find(doc! { "user_id": user_id })
            .sort(doc! { "_id": 1 })
            .skip(offset)
            .limit(limit as i64)
            .await?;
        let foods: Vec<Food> = cursor.try_collect().await?;
        Ok(foods)
    }
}

/// Counter document backing generated codes
#[derive(Debug, Serialize, Deserialize)]
struct Counter {
    #[serde(rename = "_id")]
    id: String,
    sequence: i64,
}

/// MongoDB implementation of [`SequenceRepository`] backed by the
/// `counters` collection. Each named sequence is a single document
/// incremented with an atomic `$inc` upsert.
pub struct MongoSequenceRepository {
    collection: Collection<Counter>,
}

impl MongoSequenceRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.collection::<Counter>("counters");
        Self { collection }
    }
}

#[async_trait]
impl SequenceRepository for MongoSequenceRepository {
    #[instrument(skip(self))]
    async fn next(&self, name: &str) -> FoodResult<i64> {
        let counter = self
            .collection
            .find_one_and_update(doc! { "_id": name }, doc! { "$inc": { "sequence": 1_i64 } })
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| {
                FoodError::Internal(format!("counter '{}' missing after upsert", name))
            })?;

        Ok(counter.sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_persists_the_sequence_field() {
        let counter = Counter {
            id: "food_code".into(),
            sequence: 7,
        };

        let doc = mongodb::bson::to_document(&counter).unwrap();
        assert_eq!(doc.get_str("_id").unwrap(), "food_code");
        assert_eq!(doc.get_i64("sequence").unwrap(), 7);
    }

    #[test]
    fn counter_reads_stored_documents() {
        let stored = doc! { "_id": "food_code", "sequence": 41_i64 };
        let counter: Counter = mongodb::bson::from_document(stored).unwrap();
        assert_eq!(counter.sequence, 41);
    }
}
