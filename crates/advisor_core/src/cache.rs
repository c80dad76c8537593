//! Time-bounded cache of analytics payloads.
//!
//! Entries are written to a [`KeyValueStore`] as `{"data": .., "timestamp": ..}`
//! under `<namespace><key>`. Expiry is checked lazily on read. Storage
//! failures are logged and treated as a miss; callers never see them.

use std::{
    marker::PhantomData,
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
    },
};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::store::{CacheError, KeyValueStore};

pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(start_millis),
        }
    }

    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }

    pub fn set(&self, millis: i64) {
        self.now.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    pub key: String,
    pub payload: T,
    pub stored_at_millis: i64,
}

#[derive(Serialize, Deserialize)]
struct PersistedEntry<T> {
    data: T,
    timestamp: i64,
}

pub struct ResultCache<T> {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    namespace: String,
    _payload: PhantomData<fn() -> T>,
}

impl<T> ResultCache<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            store,
            clock,
            namespace: namespace.into(),
            _payload: PhantomData,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}{key}", self.namespace)
    }

    pub fn store(&self, key: &str, payload: &T) {
        let entry = PersistedEntry {
            data: payload,
            timestamp: self.clock.now_millis(),
        };
        let result = serde_json::to_string(&entry)
            .map_err(|err| CacheError::Corrupt {
                key: key.to_string(),
                reason: err.to_string(),
            })
            .and_then(|raw| self.store.set_item(&self.storage_key(key), raw));
        if let Err(err) = result {
            warn!(key, error = %err, "cache: failed to store entry");
        }
    }

    /// The payload stored under `key` if it is at most `max_age_millis` old.
    /// Expired or unreadable entries are evicted.
    pub fn get(&self, key: &str, max_age_millis: i64) -> Option<T> {
        let entry = self.entry(key)?;
        let age = self
            .clock
            .now_millis()
            .checked_sub(entry.stored_at_millis)
            .filter(|age| *age >= 0);
        match age {
            Some(age) if age <= max_age_millis => Some(entry.payload),
            Some(age) => {
                debug!(key, age_ms = age, max_age_ms = max_age_millis, "cache: entry expired");
                self.invalidate(key);
                None
            }
            None => {
                warn!(
                    key,
                    stored_at = entry.stored_at_millis,
                    "cache: evicting entry with unusable timestamp"
                );
                self.invalidate(key);
                None
            }
        }
    }

    /// Reads an entry regardless of its age.
    pub fn entry(&self, key: &str) -> Option<CacheEntry<T>> {
        let storage_key = self.storage_key(key);
        let raw = match self.store.get_item(&storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!(key, error = %err, "cache: failed to read entry");
                return None;
            }
        };
        match serde_json::from_str::<PersistedEntry<T>>(&raw) {
            Ok(persisted) => Some(CacheEntry {
                key: key.to_string(),
                payload: persisted.data,
                stored_at_millis: persisted.timestamp,
            }),
            Err(err) => {
                let err = CacheError::Corrupt {
                    key: key.to_string(),
                    reason: err.to_string(),
                };
                warn!(key, error = %err, "cache: evicting unreadable entry");
                self.invalidate(key);
                None
            }
        }
    }

    pub fn invalidate(&self, key: &str) {
        if let Err(err) = self.store.remove_item(&self.storage_key(key)) {
            warn!(key, error = %err, "cache: failed to remove entry");
        }
    }

    /// Removes every entry whose key starts with `prefix`; an empty prefix
    /// clears the whole namespace.
    pub fn clear(&self, prefix: &str) {
        let full_prefix = self.storage_key(prefix);
        let keys = match self.store.keys() {
            Ok(keys) => keys,
            Err(err) => {
                warn!(prefix, error = %err, "cache: failed to list entries");
                return;
            }
        };
        let mut removed = 0usize;
        for key in keys.iter().filter(|key| key.starts_with(&full_prefix)) {
            match self.store.remove_item(key) {
                Ok(()) => removed += 1,
                Err(err) => warn!(key = %key, error = %err, "cache: failed to remove entry"),
            }
        }
        debug!(prefix, removed, "cache: cleared entries");
    }
}

#[cfg(test)]
#[path = "tests/cache_tests.rs"]
mod tests;
