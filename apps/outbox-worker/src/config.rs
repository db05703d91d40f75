//! Configuration for the outbox worker

use core_config::{FromEnv, PostgresConfig, RedisConfig, S3Config, WorkerConfig};
use eyre::Result;

#[derive(Debug, Clone)]
pub struct Config {
    pub postgres: PostgresConfig,
    pub redis: RedisConfig,
    pub s3: S3Config,
    pub worker: WorkerConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            postgres: PostgresConfig::from_env()?,
            redis: RedisConfig::from_env()?,
            s3: S3Config::from_env()?,
            worker: WorkerConfig::from_env()?,
        })
    }
}
