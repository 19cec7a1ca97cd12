//! # Rate Limiting
//!
//! Fixed-window request limiting over an injected window store.
//!
//! ## Store Abstraction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  RateLimiter<S: RateLimitStore>                                         │
//! │       │  get / set / sweep                                              │
//! │       ▼                                                                 │
//! │  ┌──────────────────────┐        ┌──────────────────────┐              │
//! │  │ MemoryRateLimitStore │        │ RedisRateLimitStore  │              │
//! │  │ one process          │        │ shared by instances  │              │
//! │  │ sweep drops expired  │        │ keys expire in Redis │              │
//! │  └──────────────────────┘        └──────────────────────┘              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Windows are keyed by caller-chosen strings (customer id, IP, ...). The
//! limiter never reads the clock; `now` is passed in.

mod memory;
mod redis_store;

use std::future::Future;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::DbResult;

pub use memory::MemoryRateLimitStore;
pub use redis_store::RedisRateLimitStore;

/// Counter for one key's current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowEntry {
    pub count: u32,
    pub window_start_ms: i64,
}

/// Backing storage for rate-limit windows.
pub trait RateLimitStore: Send + Sync {
    /// Returns the stored window for `key`, expired or not.
    fn get(&self, key: &str) -> impl Future<Output = DbResult<Option<WindowEntry>>> + Send;

    /// Stores a window. `ttl` counts from `entry.window_start_ms`.
    fn set(
        &self,
        key: &str,
        entry: WindowEntry,
        ttl: Duration,
    ) -> impl Future<Output = DbResult<()>> + Send;

    /// Drops windows that expired at or before `now`. Returns how many were
    /// removed.
    fn sweep(&self, now: DateTime<Utc>) -> impl Future<Output = DbResult<usize>> + Send;
}

/// Limit settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimitConfig {
    pub fn per_minute(max_requests: u32) -> Self {
        RateLimitConfig {
            max_requests,
            window: Duration::minutes(1),
        }
    }
}

/// Outcome of one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

/// Fixed-window limiter.
///
/// The read-then-write against the store is not atomic, so two instances can
/// both admit the last request of a window.
#[derive(Debug)]
pub struct RateLimiter<S> {
    store: S,
    config: RateLimitConfig,
}

impl<S: RateLimitStore> RateLimiter<S> {
    pub fn new(store: S, config: RateLimitConfig) -> Self {
        RateLimiter { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Counts one request for `key` and reports whether it is allowed.
    pub async fn check(&self, key: &str, now: DateTime<Utc>) -> DbResult<RateLimitDecision> {
        let window_ms = self.config.window.num_milliseconds();
        let now_ms = now.timestamp_millis();

        let entry = match self.store.get(key).await? {
            Some(entry) if now_ms < entry.window_start_ms + window_ms => entry,
            _ => WindowEntry {
                count: 0,
                window_start_ms: now_ms,
            },
        };

        let reset_at =
            DateTime::from_timestamp_millis(entry.window_start_ms + window_ms).unwrap_or(now);

        if entry.count >= self.config.max_requests {
            warn!(key = %key, reset_at = %reset_at, "Rate limit exceeded");
            return Ok(RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_at,
            });
        }

        let updated = WindowEntry {
            count: entry.count + 1,
            ..entry
        };
        self.store.set(key, updated, self.config.window).await?;

        debug!(key = %key, count = updated.count, "Request admitted");
        Ok(RateLimitDecision {
            allowed: true,
            remaining: self.config.max_requests - updated.count,
            reset_at,
        })
    }

    /// Removes expired windows from the store.
    pub async fn sweep(&self, now: DateTime<Utc>) -> DbResult<usize> {
        self.store.sweep(now).await
    }
}
