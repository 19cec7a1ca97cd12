//! Redis-backed window store shared by every storefront instance.

use chrono::{DateTime, Duration, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::info;

use super::{RateLimitStore, WindowEntry};
use crate::error::DbResult;

const KEY_PREFIX: &str = "ratelimit:";

/// Window store in Redis. Entries are JSON values written with `SET EX`, so
/// Redis expires them and [`RateLimitStore::sweep`] has nothing to do.
#[derive(Clone)]
pub struct RedisRateLimitStore {
    conn: ConnectionManager,
}

impl std::fmt::Debug for RedisRateLimitStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisRateLimitStore").finish_non_exhaustive()
    }
}

impl RedisRateLimitStore {
    /// Connects to `redis_url` (e.g. `redis://127.0.0.1/`).
    pub async fn connect(redis_url: &str) -> DbResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_connection_manager().await?;
        info!("Connected to Redis rate-limit store");
        Ok(RedisRateLimitStore { conn })
    }

    fn key(key: &str) -> String {
        format!("{}{}", KEY_PREFIX, key)
    }
}

impl RateLimitStore for RedisRateLimitStore {
    async fn get(&self, key: &str) -> DbResult<Option<WindowEntry>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(Self::key(key)).await?;
        raw.map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(Into::into)
    }

    async fn set(&self, key: &str, entry: WindowEntry, ttl: Duration) -> DbResult<()> {
        let mut conn = self.conn.clone();
        let payload = serde_json::to_string(&entry)?;
        let seconds = ttl.num_seconds().max(1) as u64;
        conn.set_ex::<_, _, ()>(Self::key(key), payload, seconds).await?;
        Ok(())
    }

    async fn sweep(&self, _now: DateTime<Utc>) -> DbResult<usize> {
        Ok(0)
    }
}
