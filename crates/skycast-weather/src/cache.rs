//! Short-lived in-memory response cache.
//!
//! Entries are raw JSON payloads keyed by a string that encodes every
//! parameter affecting the response. An entry older than [`CACHE_TTL`] is
//! reported as absent but stays in the map until the next `put` for its key
//! overwrites it.
//!
//! A get-miss followed by a fetch and a put is not serialized per key, so two
//! concurrent lookups for the same key may both reach the network.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde_json::Value;

/// How long a cached payload stays fresh (10 minutes)
pub const CACHE_TTL: Duration = Duration::milliseconds(600_000);

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock() = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Value,
    fetched_at: DateTime<Utc>,
}

/// Keyed payload store with a fixed freshness window
pub struct CacheStore {
    entries: Mutex<HashMap<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("entries", &self.entries.lock().len())
            .finish()
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::system()
    }
}

impl CacheStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Cache driven by the system clock
    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    /// Fresh payload for `key`, if any
    pub fn get(&self, key: &str) -> Option<Value> {
        let now = self.clock.now();
        let entries = self.entries.lock();
        let entry = entries.get(key)?;

        if now - entry.fetched_at <= CACHE_TTL {
            Some(entry.payload.clone())
        } else {
            tracing::debug!("Cache entry for {} is stale", key);
            None
        }
    }

    /// Store `payload` under `key`, replacing any previous entry
    pub fn put(&self, key: impl Into<String>, payload: Value) {
        let entry = CacheEntry {
            payload,
            fetched_at: self.clock.now(),
        };
        self.entries.lock().insert(key.into(), entry);
    }

    /// Number of stored entries, stale ones included
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
