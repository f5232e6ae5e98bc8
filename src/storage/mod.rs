//! Persistent storage
//!
//! This module handles preference persistence: the key-value backends and the
//! typed preferences store built on top of them.

pub mod file;
pub mod keys;
pub mod memory;
pub mod migration;
pub mod preferences;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub use file::FileBackend;
pub use memory::MemoryBackend;
pub use preferences::{PreferencesError, PreferencesSnapshot, PreferencesStore};

/// Errors raised by storage backends
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Could not determine a data directory for this platform")]
    NoDataDir,
}

/// Platform data directory for this application
pub fn get_data_dir() -> Result<PathBuf, StorageError> {
    ProjectDirs::from("com", "parishod", "replyprefs")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or(StorageError::NoDataDir)
}

/// A single stored preference value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefValue {
    Bool(bool),
    Long(i64),
    Str(String),
}

impl PrefValue {
    /// Name of the stored type, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            PrefValue::Bool(_) => "bool",
            PrefValue::Long(_) => "long",
            PrefValue::Str(_) => "string",
        }
    }
}

/// A persistent key-value store for preferences.
///
/// Individual operations must be thread-safe. Writes follow "apply" semantics:
/// they are visible to subsequent reads immediately, and persistence failures
/// are handled by the backend rather than reported to the caller.
pub trait PreferenceBackend: Send + Sync {
    /// Read the raw value stored under `key`
    fn get(&self, key: &str) -> Option<PrefValue>;

    /// Store `value` under `key`
    fn apply(&self, key: &str, value: PrefValue);

    /// Delete `key` if present
    fn remove(&self, key: &str);

    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Boolean under `key`, or `default` when absent or of another type
    fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some(PrefValue::Bool(b)) => b,
            Some(other) => mismatch(key, "bool", &other, default),
            None => default,
        }
    }

    /// Integer under `key`, or `default` when absent or of another type
    fn get_long(&self, key: &str, default: i64) -> i64 {
        match self.get(key) {
            Some(PrefValue::Long(n)) => n,
            Some(other) => mismatch(key, "long", &other, default),
            None => default,
        }
    }

    /// String under `key`; `None` when absent or of another type
    fn get_string(&self, key: &str) -> Option<String> {
        match self.get(key) {
            Some(PrefValue::Str(s)) => Some(s),
            Some(other) => mismatch(key, "string", &other, None),
            None => None,
        }
    }

    fn put_bool(&self, key: &str, value: bool) {
        self.apply(key, PrefValue::Bool(value));
    }

    fn put_long(&self, key: &str, value: i64) {
        self.apply(key, PrefValue::Long(value));
    }

    fn put_string(&self, key: &str, value: String) {
        self.apply(key, PrefValue::Str(value));
    }
}

fn mismatch<T>(key: &str, expected: &str, found: &PrefValue, default: T) -> T {
    tracing::warn!(
        "Preference '{}' holds a {} where a {} was expected, using default",
        key,
        found.kind(),
        expected
    );
    default
}
