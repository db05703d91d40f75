use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutboxError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Blob storage error: {0}")]
    Blob(#[from] storage::StorageError),

    #[error("Lease error: {0}")]
    Lease(String),
}

pub type OutboxResult<T> = Result<T, OutboxError>;

impl From<redis::RedisError> for OutboxError {
    fn from(err: redis::RedisError) -> Self {
        OutboxError::Lease(err.to_string())
    }
}
