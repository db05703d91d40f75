//! Blob storage abstraction over S3-compatible object stores.
//!
//! Product images live under `images/products/{food_id}/` and are removed
//! asynchronously once the owning food record is deleted.

pub mod s3;

use async_trait::async_trait;
use thiserror::Error;

pub use s3::S3BlobStore;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("S3 error: {0}")]
    S3(String),

    #[error("Configuration error: {0}")]
    Config(#[from] core_config::ConfigError),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Object store operations needed by the catalog.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait BlobStore: Send + Sync {
    /// Delete every object under the given key prefix.
    ///
    /// Deleting a prefix that matches no objects is a no-op, not an error.
    async fn delete_folder(&self, prefix: &str) -> StorageResult<()>;
}
