//! String key/value stores backing [`crate::cache::ResultCache`].

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache storage unavailable: {0}")]
    Unavailable(String),
    #[error("cache storage quota of {quota_bytes} bytes exceeded")]
    QuotaExceeded { quota_bytes: usize },
    #[error("corrupt cache entry under '{key}': {reason}")]
    Corrupt { key: String, reason: String },
}

pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, CacheError>;
    fn set_item(&self, key: &str, value: String) -> Result<(), CacheError>;
    fn remove_item(&self, key: &str) -> Result<(), CacheError>;
    fn keys(&self) -> Result<Vec<String>, CacheError>;
}

fn lock<'a>(
    entries: &'a Mutex<BTreeMap<String, String>>,
) -> Result<MutexGuard<'a, BTreeMap<String, String>>, CacheError> {
    entries
        .lock()
        .map_err(|_| CacheError::Unavailable("store lock poisoned".to_string()))
}

fn stored_bytes(entries: &BTreeMap<String, String>) -> usize {
    entries.iter().map(|(k, v)| k.len() + v.len()).sum()
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects writes that would grow keys plus values past `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(lock(&self.entries)?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: String) -> Result<(), CacheError> {
        let mut entries = lock(&self.entries)?;
        if let Some(quota_bytes) = self.quota_bytes {
            let current = stored_bytes(&entries)
                - entries.get(key).map_or(0, |old| key.len() + old.len());
            if current + key.len() + value.len() > quota_bytes {
                return Err(CacheError::QuotaExceeded { quota_bytes });
            }
        }
        entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), CacheError> {
        lock(&self.entries)?.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        Ok(lock(&self.entries)?.keys().cloned().collect())
    }
}

/// One JSON object on disk, rewritten on every change.
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| {
                CacheError::Unavailable(format!(
                    "failed to create cache directory '{}': {err}",
                    parent.display()
                ))
            })?;
        }

        let entries = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "cache: discarding unreadable cache file"
                );
                BTreeMap::new()
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                return Err(CacheError::Unavailable(format!(
                    "failed to read '{}': {err}",
                    path.display()
                )))
            }
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), CacheError> {
        let raw = serde_json::to_vec_pretty(entries)
            .map_err(|err| CacheError::Unavailable(err.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, raw)
            .and_then(|()| fs::rename(&tmp, &self.path))
            .map_err(|err| {
                CacheError::Unavailable(format!("failed to write '{}': {err}", self.path.display()))
            })
    }
}

impl KeyValueStore for JsonFileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(lock(&self.entries)?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: String) -> Result<(), CacheError> {
        let mut entries = lock(&self.entries)?;
        let previous = entries.insert(key.to_string(), value);
        if let Err(err) = self.persist(&entries) {
            match previous {
                Some(previous) => entries.insert(key.to_string(), previous),
                None => entries.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = lock(&self.entries)?;
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        Ok(lock(&self.entries)?.keys().cloned().collect())
    }
}
