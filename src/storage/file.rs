//! JSON file preference backend
//!
//! Keeps every preference in memory and mirrors the whole set to a single JSON
//! file on each write.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;

use crate::storage::{MemoryBackend, PrefValue, PreferenceBackend, StorageError};

/// Preference backend persisted as a JSON object on disk
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    cache: MemoryBackend,
    /// Held while a snapshot is taken and written, so writes land in order
    write_lock: Mutex<()>,
}

impl FileBackend {
    /// Open the preferences file at `path`
    ///
    /// A missing file is an empty store. A file that exists but cannot be read
    /// or parsed is an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();

        let values = if path.exists() {
            let json = fs::read_to_string(&path)?;
            let values: BTreeMap<String, PrefValue> = serde_json::from_str(&json)?;
            tracing::debug!("Loaded {} preferences from {}", values.len(), path.display());
            values
        } else {
            tracing::info!("Preferences file {} not found, starting empty", path.display());
            BTreeMap::new()
        };

        Ok(Self {
            path,
            cache: MemoryBackend::from_map(values),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the current preferences to disk
    pub fn commit(&self) -> Result<(), StorageError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // Snapshot under the lock so a later write never sees an older file win
        let json = serde_json::to_string_pretty(&self.cache.to_map())?;

        // Replace the file in one step so readers never see a partial write
        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        tracing::debug!("Saved preferences to {}", self.path.display());
        Ok(())
    }

    fn persist(&self) {
        if let Err(e) = self.commit() {
            tracing::error!(
                "Failed to write preferences to {}: {}",
                self.path.display(),
                e
            );
        }
    }
}

impl PreferenceBackend for FileBackend {
    fn get(&self, key: &str) -> Option<PrefValue> {
        self.cache.get(key)
    }

    fn apply(&self, key: &str, value: PrefValue) {
        self.cache.apply(key, value);
        self.persist();
    }

    fn remove(&self, key: &str) {
        if self.cache.contains(key) {
            self.cache.remove(key);
            self.persist();
        }
    }

    fn contains(&self, key: &str) -> bool {
        self.cache.contains(key)
    }
}
