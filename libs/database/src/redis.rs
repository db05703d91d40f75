//! Redis connector
//!
//! Returns a [`ConnectionManager`] that handles reconnection transparently.

use redis::Client;
use redis::aio::ConnectionManager;
use tracing::info;

use crate::common::{RetryConfig, retry_with_backoff};

/// Connect to Redis and return a ConnectionManager
///
/// # Example
/// ```ignore
/// use database::redis::connect;
/// use redis::AsyncCommands;
///
/// let mut conn = connect("redis://127.0.0.1:6379").await?;
/// conn.set::<_, _, ()>("key", "value").await?;
/// ```
pub async fn connect(url: &str) -> redis::RedisResult<ConnectionManager> {
    info!("Attempting to connect to Redis at {}", url);

    let client = Client::open(url)?;
    let manager = ConnectionManager::new(client).await?;

    // Verify connection with PING
    let mut conn = manager.clone();
    let _: String = redis::cmd("PING").query_async(&mut conn).await?;

    info!("Successfully connected to Redis");
    Ok(manager)
}

/// Connect to Redis with automatic retry on failure
pub async fn connect_with_retry(
    url: &str,
    retry_config: Option<RetryConfig>,
) -> redis::RedisResult<ConnectionManager> {
    let config = retry_config.unwrap_or_default();
    retry_with_backoff(|| connect(url), config).await
}
