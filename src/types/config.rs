//! Configuration types
//!
//! Where preferences live and how a fresh install is seeded.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "REPLYPREFS_DATA_DIR";

/// Preferences store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferencesConfig {
    /// Directory holding the preferences file (platform data dir when unset)
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Name of the preferences file inside the data directory
    #[serde(default = "default_file_name")]
    pub file_name: String,
    /// Enable every supported app on a new install
    #[serde(default = "default_prepopulate")]
    pub prepopulate_supported_apps: bool,
}

fn default_file_name() -> String {
    "preferences.json".to_string()
}

fn default_prepopulate() -> bool {
    cfg!(feature = "prepopulate-supported-apps")
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            file_name: default_file_name(),
            prepopulate_supported_apps: default_prepopulate(),
        }
    }
}

impl PreferencesConfig {
    /// Default configuration with the data directory taken from the environment, if set
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|d| !d.is_empty()) {
            config.data_dir = Some(PathBuf::from(dir));
        }
        config
    }

    /// Configuration rooted at an explicit directory
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(dir.into()),
            ..Self::default()
        }
    }
}
