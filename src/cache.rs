//! Short-lived read-through cache for reference data (phases, timelines).
//!
//! Entries are stored as JSON values so one cache can hold any serde type.
//! Expiry is measured with the injected [`Clock`].

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::clock::Clock;

pub mod ttl {
    use std::time::Duration;

    /// Frequently changing data.
    pub const SHORT: Duration = Duration::from_secs(2 * 60);
    pub const MEDIUM: Duration = Duration::from_secs(5 * 60);
    /// Rarely changing data such as phases and topics.
    pub const LONG: Duration = Duration::from_secs(15 * 60);
    pub const VERY_LONG: Duration = Duration::from_secs(60 * 60);
}

struct CacheEntry {
    data: serde_json::Value,
    stored_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub size: usize,
    pub keys: Vec<String>,
}

pub struct QueryCache {
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl QueryCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.write().unwrap_or_else(|p| p.into_inner())
    }

    /// Returns the cached value for `key` if it is younger than `ttl`,
    /// otherwise runs `fetch` and caches its result. Fetch errors are
    /// returned untouched and nothing is cached.
    pub fn get_or_fetch<T, E, F>(&self, key: &str, ttl: Duration, fetch: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(hit) = self.lookup::<T>(key, ttl) {
            tracing::debug!(key, "Query cache hit");
            return Ok(hit);
        }

        tracing::debug!(key, "Query cache miss");
        let data = fetch()?;
        match serde_json::to_value(&data) {
            Ok(value) => {
                self.write().insert(
                    key.to_string(),
                    CacheEntry {
                        data: value,
                        stored_at: self.clock.now(),
                    },
                );
            }
            Err(e) => tracing::warn!(key, error = %e, "Query cache could not store value"),
        }
        Ok(data)
    }

    fn lookup<T: DeserializeOwned>(&self, key: &str, ttl: Duration) -> Option<T> {
        let entries = self.read();
        let entry = entries.get(key)?;
        // 时钟回拨时 to_std 失败，按过期处理
        let age = (self.clock.now() - entry.stored_at).to_std().ok()?;
        if age >= ttl {
            return None;
        }
        serde_json::from_value(entry.data.clone()).ok()
    }

    pub fn invalidate(&self, key: &str) {
        if self.write().remove(key).is_some() {
            tracing::debug!(key, "Query cache invalidate");
        }
    }

    /// Drops every key containing `pattern`. Returns how many were dropped.
    pub fn invalidate_pattern(&self, pattern: &str) -> usize {
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|key, _| !key.contains(pattern));
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(pattern, removed, "Query cache invalidate pattern");
        }
        removed
    }

    pub fn clear(&self) {
        self.write().clear();
        tracing::debug!("Query cache cleared");
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.read();
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        CacheStats {
            size: entries.len(),
            keys,
        }
    }
}
