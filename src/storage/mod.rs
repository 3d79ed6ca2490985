//! Durable client-side preference storage
//!
//! Storage is an injected capability: the playback core only sees the
//! [`KeyValueStore`] trait. [`MemoryStore`] backs tests and ephemeral
//! sessions, [`FileStore`] keeps preferences across runs.
//!
//! Preference access through [`VolumePreference`] is best-effort. A failing
//! store is logged and otherwise ignored.

mod file_store;

pub use file_store::FileStore;

use crate::utils::error::Result;
use log::{debug, warn};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Key-value store for user preferences
pub trait KeyValueStore: Send + Sync {
    /// Read a value
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a value. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.write().remove(key);
        Ok(())
    }
}

/// Remembered output volume
///
/// Stored as a decimal string in `[0, 1]` under a fixed key.
#[derive(Clone)]
pub struct VolumePreference {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl VolumePreference {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Read the remembered volume
    ///
    /// Returns `None` when nothing is stored, the value does not parse, it is
    /// outside `[0, 1]`, or the store fails.
    pub fn load(&self) -> Option<f64> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read volume preference: {}", e);
                return None;
            }
        };

        match raw.trim().parse::<f64>() {
            Ok(volume) if (0.0..=1.0).contains(&volume) => Some(volume),
            _ => {
                debug!("Ignoring stored volume {:?}", raw);
                None
            }
        }
    }

    /// Remember a volume. Failures are logged and dropped.
    pub fn save(&self, volume: f64) {
        if let Err(e) = self.store.set(&self.key, &volume.to_string()) {
            warn!("Failed to persist volume preference: {}", e);
        }
    }

    /// Forget the remembered volume
    pub fn clear(&self) {
        if let Err(e) = self.store.remove(&self.key) {
            warn!("Failed to clear volume preference: {}", e);
        }
    }
}

impl std::fmt::Debug for VolumePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VolumePreference").field("key", &self.key).finish()
    }
}
