//! Application context
//!
//! Resolves where preferences are stored. Consumers hand a context to the
//! preferences store, which keeps only the application-scoped part of it.

use std::path::{Path, PathBuf};

use crate::storage::{get_data_dir, StorageError};
use crate::types::PreferencesConfig;

/// Anything that can provide the application-scoped context
pub trait Context {
    fn application_context(&self) -> AppContext;
}

/// Application-scoped context: resolved configuration and data directory
#[derive(Debug, Clone, PartialEq)]
pub struct AppContext {
    config: PreferencesConfig,
    data_dir: PathBuf,
}

impl AppContext {
    /// Resolve `config`, falling back to the platform data directory
    pub fn new(config: PreferencesConfig) -> Result<Self, StorageError> {
        let data_dir = match &config.data_dir {
            Some(dir) => dir.clone(),
            None => get_data_dir()?,
        };
        Ok(Self { config, data_dir })
    }

    pub fn config(&self) -> &PreferencesConfig {
        &self.config
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Full path of the preferences file
    pub fn preferences_path(&self) -> PathBuf {
        self.data_dir.join(&self.config.file_name)
    }

    pub fn prepopulate_supported_apps(&self) -> bool {
        self.config.prepopulate_supported_apps
    }
}

impl Context for AppContext {
    fn application_context(&self) -> AppContext {
        self.clone()
    }
}
