//! Saved user preferences.
//!
//! A small key-value file in the config directory. Each value is stored as
//! its own JSON-encoded string so a single bad entry cannot spoil the rest.
//! Writers broadcast the changed key; `reload` picks up edits made by another
//! process and broadcasts those too.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use skycast_core::{StorageError, Units};
use tokio::sync::broadcast;

pub const RECENT_SEARCHES_KEY: &str = "recent-searches";
pub const UNITS_KEY: &str = "temperature-unit";
pub const LAST_CITY_KEY: &str = "last-city";

/// Recent searches kept, most recent first
pub const MAX_RECENT_SEARCHES: usize = 5;

const CHANGE_CHANNEL_CAPACITY: usize = 16;

/// Notification that a key was written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceChange {
    pub key: String,
}

/// File-backed store of JSON-encoded values
pub struct PreferenceStore {
    path: PathBuf,
    values: RwLock<HashMap<String, String>>,
    changes: broadcast::Sender<PreferenceChange>,
}

impl std::fmt::Debug for PreferenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferenceStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl PreferenceStore {
    /// Open the store at `path`; a missing file is an empty store
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let values = read_file(&path)?;
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);

        tracing::debug!("Opened preferences at {:?} ({} keys)", path, values.len());
        Ok(Self {
            path,
            values: RwLock::new(values),
            changes,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decoded value for `key`, or `default` when missing or undecodable
    pub fn read<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let values = self.values.read();
        let Some(raw) = values.get(key) else {
            return default;
        };

        match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Error reading preference \"{}\": {}", key, e);
                default
            }
        }
    }

    /// Encode and persist `value` under `key`, then notify subscribers
    pub fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(value).map_err(|e| StorageError::EncodeFailed {
            key: key.to_string(),
            message: e.to_string(),
        })?;

        {
            let mut values = self.values.write();
            values.insert(key.to_string(), encoded);
            self.persist(&values)?;
        }

        self.notify(key);
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PreferenceChange> {
        self.changes.subscribe()
    }

    /// Re-read the file and notify about every key whose value changed.
    /// Returns the changed keys.
    pub fn reload(&self) -> Result<Vec<String>, StorageError> {
        let fresh = read_file(&self.path)?;

        let changed: Vec<String> = {
            let mut values = self.values.write();
            let mut changed: Vec<String> = fresh
                .iter()
                .filter(|(k, v)| values.get(*k) != Some(*v))
                .map(|(k, _)| k.clone())
                .chain(values.keys().filter(|k| !fresh.contains_key(*k)).cloned())
                .collect();
            changed.sort();
            *values = fresh;
            changed
        };

        for key in &changed {
            self.notify(key);
        }
        Ok(changed)
    }

    fn notify(&self, key: &str) {
        // No subscribers is fine
        let _ = self.changes.send(PreferenceChange {
            key: key.to_string(),
        });
    }

    fn persist(&self, values: &HashMap<String, String>) -> Result<(), StorageError> {
        let write_failed = |e: std::io::Error| StorageError::WriteFailed {
            path: self.path.display().to_string(),
            message: e.to_string(),
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(write_failed)?;
        }

        let json = serde_json::to_string_pretty(values).map_err(|e| StorageError::WriteFailed {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(write_failed)?;
        std::fs::rename(&tmp, &self.path).map_err(write_failed)?;
        Ok(())
    }
}

fn read_file(path: &Path) -> Result<HashMap<String, String>, StorageError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(e) => {
            return Err(StorageError::ReadFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            })
        }
    };

    match serde_json::from_str(&contents) {
        Ok(values) => Ok(values),
        Err(e) => {
            tracing::warn!("Ignoring unreadable preferences file {:?}: {}", path, e);
            Ok(HashMap::new())
        }
    }
}

/// Typed access to the three saved slots
#[derive(Debug, Clone)]
pub struct Preferences {
    store: Arc<PreferenceStore>,
    default_units: Units,
}

impl Preferences {
    pub fn new(store: Arc<PreferenceStore>, default_units: Units) -> Self {
        Self {
            store,
            default_units,
        }
    }

    pub fn store(&self) -> &Arc<PreferenceStore> {
        &self.store
    }

    pub fn recent_searches(&self) -> Vec<String> {
        self.store.read(RECENT_SEARCHES_KEY, Vec::new())
    }

    /// Move `city` to the front of the recent list, dropping the oldest
    /// entries beyond [`MAX_RECENT_SEARCHES`]
    pub fn record_search(&self, city: &str) -> Result<Vec<String>, StorageError> {
        let mut recent = self.recent_searches();
        recent.retain(|c| c != city);
        recent.insert(0, city.to_string());
        recent.truncate(MAX_RECENT_SEARCHES);

        self.store.write(RECENT_SEARCHES_KEY, &recent)?;
        Ok(recent)
    }

    pub fn units(&self) -> Units {
        self.store.read(UNITS_KEY, self.default_units)
    }

    pub fn set_units(&self, units: Units) -> Result<(), StorageError> {
        self.store.write(UNITS_KEY, &units)
    }

    pub fn last_city(&self) -> Option<String> {
        let city: String = self.store.read(LAST_CITY_KEY, String::new());
        (!city.is_empty()).then_some(city)
    }

    pub fn set_last_city(&self, city: &str) -> Result<(), StorageError> {
        self.store.write(LAST_CITY_KEY, &city)
    }
}
