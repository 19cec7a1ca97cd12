//! In-process window store.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use super::{RateLimitStore, WindowEntry};
use crate::error::DbResult;

#[derive(Debug, Clone, Copy)]
struct Slot {
    entry: WindowEntry,
    expires_at_ms: i64,
}

/// Window store for a single process.
///
/// Each limiter owns its store; nothing here is global.
#[derive(Debug, Default)]
pub struct MemoryRateLimitStore {
    slots: Mutex<HashMap<String, Slot>>,
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.slots.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.slots.lock().await.is_empty()
    }
}

impl RateLimitStore for MemoryRateLimitStore {
    async fn get(&self, key: &str) -> DbResult<Option<WindowEntry>> {
        Ok(self.slots.lock().await.get(key).map(|slot| slot.entry))
    }

    async fn set(&self, key: &str, entry: WindowEntry, ttl: Duration) -> DbResult<()> {
        let slot = Slot {
            entry,
            expires_at_ms: entry.window_start_ms + ttl.num_milliseconds(),
        };
        self.slots.lock().await.insert(key.to_string(), slot);
        Ok(())
    }

    async fn sweep(&self, now: DateTime<Utc>) -> DbResult<usize> {
        let now_ms = now.timestamp_millis();
        let mut slots = self.slots.lock().await;
        let before = slots.len();
        slots.retain(|_, slot| slot.expires_at_ms > now_ms);
        Ok(before - slots.len())
    }
}
