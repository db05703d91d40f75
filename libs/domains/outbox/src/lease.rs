//! Redis-backed worker lease
//!
//! Ensures only one worker replica drains a given outbox batch at a time.
//! The lease key carries a random token so a worker can only release a
//! lease it still owns; an expired-and-reacquired lease is left alone.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tracing::instrument;

use crate::error::OutboxResult;

/// Token-guarded release. The ownership check and the DEL/PEXPIRE must be
/// one atomic step: a lease that hits max_hold between the two could be
/// reacquired by another replica, and a plain DEL would destroy that
/// replica's lease.
const RELEASE_SCRIPT: &str = r#"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    local hold = tonumber(ARGV[2])
    if hold > 0 then
        return redis.call('PEXPIRE', KEYS[1], hold)
    end
    return redis.call('DEL', KEYS[1])
end
return 0
"#;

/// Proof of lease ownership, consumed on release
#[derive(Debug)]
pub struct LeaseToken {
    key: String,
    token: String,
    acquired_at: Instant,
}

#[cfg(test)]
impl LeaseToken {
    pub(crate) fn stub() -> Self {
        Self {
            key: "lease:test".into(),
            token: "test".into(),
            acquired_at: Instant::now(),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Lease: Send + Sync {
    /// Try to acquire the named lease. `None` means another holder has it.
    async fn acquire(&self, name: &str) -> OutboxResult<Option<LeaseToken>>;

    /// Release a previously acquired lease.
    async fn release(&self, token: LeaseToken) -> OutboxResult<()>;
}

/// Lease hold bounds
#[derive(Debug, Clone)]
pub struct LeaseConfig {
    /// A released lease is kept at least this long, throttling how often
    /// competing replicas can win consecutive cycles.
    pub min_hold: Duration,
    /// Hard expiry in case the holder crashes without releasing.
    pub max_hold: Duration,
}

impl Default for LeaseConfig {
    fn default() -> Self {
        Self {
            min_hold: Duration::from_secs(1),
            max_hold: Duration::from_secs(30),
        }
    }
}

pub struct RedisLease {
    conn: ConnectionManager,
    config: LeaseConfig,
}

impl RedisLease {
    pub fn new(conn: ConnectionManager, config: LeaseConfig) -> Self {
        Self { conn, config }
    }

    fn new_token() -> String {
        use std::collections::hash_map::RandomState;
        use std::hash::BuildHasher;

        format!("{:016x}", RandomState::new().hash_one(Instant::now()))
    }
}

#[async_trait]
impl Lease for RedisLease {
    #[instrument(skip(self))]
    async fn acquire(&self, name: &str) -> OutboxResult<Option<LeaseToken>> {
        let key = format!("lease:{}", name);
        let token = Self::new_token();

        let mut conn = self.conn.clone();
        let acquired: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(&token)
            .arg("NX")
            .arg("PX")
            .arg(self.config.max_hold.as_millis() as u64)
            .query_async(&mut conn)
            .await?;

        Ok(acquired.map(|_| LeaseToken {
            key,
            token,
            acquired_at: Instant::now(),
        }))
    }

    #[instrument(skip(self, token))]
    async fn release(&self, token: LeaseToken) -> OutboxResult<()> {
        let mut conn = self.conn.clone();

        // Keep the key alive until min_hold has elapsed, delete otherwise
        let remaining = self
            .config
            .min_hold
            .saturating_sub(token.acquired_at.elapsed())
            .as_millis() as i64;

        let _: i64 = redis::Script::new(RELEASE_SCRIPT)
            .key(&token.key)
            .arg(&token.token)
            .arg(remaining)
            .invoke_async(&mut conn)
            .await?;

        Ok(())
    }
}
