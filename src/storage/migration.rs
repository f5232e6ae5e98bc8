//! Startup migration of stored preferences
//!
//! Runs once when a preferences store is built. Stores written before the
//! schema version existed are classified as a new install (no service or app
//! selection keys yet) or an upgrade, and the app selection is filled in
//! accordingly.
//!
//! Without supported-app prepopulation the default app is written here rather
//! than on first read, so a store first opened with prepopulation off is never
//! treated as a new install again, even if prepopulation is turned on later.

use std::collections::BTreeSet;

use crate::storage::keys::{KEY_SCHEMA_VERSION, KEY_SELECTED_APPS_ARR, KEY_SERVICE_ENABLED};
use crate::storage::preferences::encode_packages;
use crate::storage::{PreferenceBackend, PreferencesError};
use crate::types::app::{default_app, supported_apps};

/// Layout version written by this release
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// What the startup migration found and did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Nothing stored yet
    NewInstall,
    /// Stored by an older release
    Upgraded { from: i64 },
    /// Already at the current version
    UpToDate,
    /// Written by a newer release; left untouched
    Newer { found: i64 },
}

/// Bring the stored layout up to [`CURRENT_SCHEMA_VERSION`]
pub fn migrate(
    backend: &dyn PreferenceBackend,
    prepopulate_supported_apps: bool,
) -> Result<MigrationOutcome, PreferencesError> {
    let version = if backend.contains(KEY_SCHEMA_VERSION) {
        backend.get_long(KEY_SCHEMA_VERSION, 0)
    } else {
        0
    };

    if version == CURRENT_SCHEMA_VERSION {
        return Ok(MigrationOutcome::UpToDate);
    }
    if version > CURRENT_SCHEMA_VERSION {
        tracing::warn!(
            "Preferences schema version {} is newer than {}, leaving as is",
            version,
            CURRENT_SCHEMA_VERSION
        );
        return Ok(MigrationOutcome::Newer { found: version });
    }

    let new_install =
        !backend.contains(KEY_SERVICE_ENABLED) && !backend.contains(KEY_SELECTED_APPS_ARR);

    if !backend.contains(KEY_SELECTED_APPS_ARR) {
        let apps = if new_install && prepopulate_supported_apps {
            supported_apps()
        } else {
            vec![default_app()]
        };
        let packages: BTreeSet<String> = apps.into_iter().map(|a| a.package_name).collect();
        backend.put_string(KEY_SELECTED_APPS_ARR, encode_packages(&packages)?);
        tracing::info!("Enabled apps initialized to {:?}", packages);
    }

    backend.put_long(KEY_SCHEMA_VERSION, CURRENT_SCHEMA_VERSION);

    let outcome = if new_install {
        MigrationOutcome::NewInstall
    } else {
        MigrationOutcome::Upgraded { from: version }
    };
    tracing::info!(
        "Preferences migrated to schema version {} ({:?})",
        CURRENT_SCHEMA_VERSION,
        outcome
    );
    Ok(outcome)
}
