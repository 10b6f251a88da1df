//! Remembered access keys, persisted as `{"keys": {device_id: hex}}`.
//!
//! Loaded and saved explicitly by the caller. Concurrent writers are not
//! coordinated: the last `persist` wins.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::store::AccessKey;

#[derive(Debug, thiserror::Error)]
pub enum KeyCacheError {
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Default, Serialize, Deserialize)]
struct Settings {
    #[serde(default)]
    keys: BTreeMap<String, String>,
}

pub struct KeyCache {
    path: PathBuf,
    settings: Settings,
}

impl KeyCache {
    /// Load the cache at `path`; a missing file is an empty cache.
    pub fn load(path: &Path) -> Result<Self, KeyCacheError> {
        let settings = match std::fs::read(path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| KeyCacheError::Parse {
                path: path.to_path_buf(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Settings::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path: path.to_path_buf(), settings })
    }

    /// Entries that are not valid hex are treated as absent.
    pub fn get(&self, device_id: &str) -> Option<AccessKey> {
        let hex = self.settings.keys.get(device_id)?;
        match AccessKey::from_hex(hex) {
            Ok(key) => Some(key),
            Err(e) => {
                tracing::warn!(%device_id, error = %e, "Ignoring malformed remembered key");
                None
            }
        }
    }

    pub fn contains(&self, device_id: &str) -> bool {
        self.settings.keys.contains_key(device_id)
    }

    pub fn set(&mut self, device_id: &str, key: &AccessKey) {
        self.settings.keys.insert(device_id.to_string(), key.to_hex());
    }

    /// Returns true if an entry was removed.
    pub fn remove(&mut self, device_id: &str) -> bool {
        self.settings.keys.remove(device_id).is_some()
    }

    pub fn clear(&mut self) {
        self.settings.keys.clear();
    }

    pub fn len(&self) -> usize {
        self.settings.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.settings.keys.is_empty()
    }

    pub fn persist(&self) -> Result<(), KeyCacheError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_vec_pretty(&self.settings).map_err(|source| KeyCacheError::Parse {
            path: self.path.clone(),
            source,
        })?;
        std::fs::write(&self.path, json)?;
        tracing::debug!(path = %self.path.display(), entries = self.len(), "Key cache written");
        Ok(())
    }
}
