use thiserror::Error;

#[derive(Debug, Error)]
pub enum FoodError {
    #[error("Food not found: {0}")]
    NotFound(String),

    #[error("Food with code '{0}' already exists")]
    DuplicateCode(String),

    #[error("Conflicting food for code '{0}'")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type FoodResult<T> = Result<T, FoodError>;

impl From<mongodb::error::Error> for FoodError {
    fn from(err: mongodb::error::Error) -> Self {
        FoodError::Database(err.to_string())
    }
}

impl From<redis::RedisError> for FoodError {
    fn from(err: redis::RedisError) -> Self {
        FoodError::Cache(err.to_string())
    }
}

impl From<serde_json::Error> for FoodError {
    fn from(err: serde_json::Error) -> Self {
        FoodError::Serialization(err.to_string())
    }
}
