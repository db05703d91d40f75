//! Foods Domain
//!
//! Domain implementation for the food catalog: MongoDB persistence with
//! barcode business keys, Elasticsearch full-text search, Redis caching
//! and request deduplication, and asynchronous keyword enrichment.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────┐
//! │ CachedFoodService │  ← cache-aside, request deduplication
//! └─────────┬─────────┘
//!           │
//! ┌─────────▼─────────┐
//! │    FoodService    │  ← business logic, code resolution, validation
//! └─────────┬─────────┘
//!           │
//! ┌─────────▼─────────┐
//! │   Repositories    │  ← traits + MongoDB / Elasticsearch / Gemini impls
//! └─────────┬─────────┘
//!           │
//! ┌─────────▼─────────┐
//! │      Models       │  ← entities, DTOs, query builders
//! └───────────────────┘
//! ```

pub mod cache;
pub mod dedup;
pub mod enrichment;
pub mod error;
pub mod models;
pub mod mongodb;
pub mod query;
pub mod repository;
pub mod search;
pub mod service;

// Re-export commonly used types
pub use cache::{Cache, CachedFoodService, RedisCache};
pub use dedup::{ProcessedEntityType, RequestDeduplication};
pub use enrichment::{GeminiKeywordGenerator, KeywordGenerator};
pub use error::{FoodError, FoodResult};
pub use models::{CreateFood, Food, Nutriments, PatchFood, PatchNutriments};
pub use mongodb::{MongoFoodRepository, MongoSequenceRepository};
pub use repository::{FoodRepository, OutboxRecorder, SequenceRepository};
pub use search::{ElasticsearchIndex, SearchIndex};
pub use service::FoodService;
