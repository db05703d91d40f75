//! Shared test utilities for domain testing
//!
//! Reusable testcontainers infrastructure for the integration tests:
//! - `TestMongo`: MongoDB container (feature: "mongodb")
//! - `TestDatabase`: PostgreSQL container (feature: "postgres")
//! - `TestRedis`: Redis container (feature: "redis")
//!
//! Containers are stopped and removed when the wrapper is dropped.

#[cfg(feature = "postgres")]
mod postgres;

#[cfg(feature = "redis")]
mod redis;

#[cfg(feature = "mongodb")]
mod mongodb;

#[cfg(feature = "postgres")]
pub use postgres::TestDatabase;

#[cfg(feature = "redis")]
pub use redis::TestRedis;

#[cfg(feature = "mongodb")]
pub use mongodb::TestMongo;
