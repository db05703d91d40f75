//! Outbox Domain
//!
//! Transactional-outbox pipeline for deferred blob cleanup. Food deletions
//! are recorded as `FOOD_DELETED` rows in PostgreSQL; a scheduled worker
//! drains them under a Redis lease and removes the product image folders
//! from blob storage. Events are only marked processed after their blobs
//! are gone, so cleanup is at-least-once.

pub mod dispatcher;
pub mod entity;
pub mod error;
pub mod lease;
pub mod postgres;
pub mod repository;

pub use dispatcher::OutboxDispatcher;
pub use error::{OutboxError, OutboxResult};
pub use lease::{Lease, LeaseConfig, LeaseToken, RedisLease};
pub use postgres::{init_schema, PgOutboxRepository};
pub use repository::{OutboxRepository, AGGREGATE_FOOD, EVENT_FOOD_DELETED};
