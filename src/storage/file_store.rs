//! JSON-file preference store
//!
//! The whole map is kept in memory and written through on every change.
//! Concurrent writers from other processes are not coordinated: the last
//! write wins.

use crate::storage::KeyValueStore;
use crate::utils::error::{Result, ResultExt};
use log::{info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Preferences {
    values: BTreeMap<String, String>,
}

/// Preference store persisted as a JSON document
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    preferences: Mutex<Preferences>,
}

impl FileStore {
    /// Open a store at `path`
    ///
    /// A missing file starts an empty store. A corrupt file is logged and
    /// replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let preferences = match std::fs::read_to_string(&path) {
            Ok(data) => match serde_json::from_str::<Preferences>(&data) {
                Ok(preferences) => {
                    info!("Loaded {} preference(s) from {:?}", preferences.values.len(), path);
                    preferences
                }
                Err(e) => {
                    warn!("Discarding unreadable preferences file {:?}: {}", path, e);
                    Preferences::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Preferences::default(),
            Err(e) => {
                warn!("Failed to read preferences file {:?}: {}", path, e);
                return Err(e.into());
            }
        };

        Ok(Self {
            path,
            preferences: Mutex::new(preferences),
        })
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save_to_disk(&self, preferences: &Preferences) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).storage_err("Failed to create preferences directory")?;
        }
        let data = serde_json::to_string_pretty(preferences).storage_err("Failed to serialize preferences")?;
        std::fs::write(&self.path, data).storage_err("Failed to write preferences file")
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.preferences.lock().values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut preferences = self.preferences.lock();
        preferences.values.insert(key.to_string(), value.to_string());
        self.save_to_disk(&preferences)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut preferences = self.preferences.lock();
        if preferences.values.remove(key).is_some() {
            self.save_to_disk(&preferences)?;
        }
        Ok(())
    }
}
