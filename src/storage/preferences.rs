//! Auto-reply preferences store
//!
//! Typed access to the auto-reply settings: service and group-reply switches,
//! the throttle delay between replies, and the set of apps replies are enabled
//! for. The app set is stored as a JSON array of package identifiers.
//!
//! Read-modify-write sequences ([`PreferencesStore::save_enabled_apps`] and the
//! fallback write in [`PreferencesStore::enabled_apps`]) are not atomic. Two
//! concurrent writers can lose an update.

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

use crate::context::{AppContext, Context};
use crate::storage::keys::{
    KEY_AUTO_REPLY_THROTTLE_TIME_MS, KEY_GROUP_REPLY_ENABLED, KEY_SELECTED_APPS_ARR,
    KEY_SERVICE_ENABLED,
};
use crate::storage::migration::{migrate, MigrationOutcome};
use crate::storage::{FileBackend, PrefValue, PreferenceBackend, StorageError};
use crate::types::app::{default_app, App};

static INSTANCE: OnceCell<PreferencesStore> = OnceCell::new();

/// Errors raised by the preferences store
#[derive(Debug, Error)]
pub enum PreferencesError {
    /// The stored app selection is not a JSON array of strings
    #[error("Stored enabled apps are malformed: {0}")]
    MalformedEnabledApps(#[source] serde_json::Error),
    /// The stored app selection is not a string at all
    #[error("Stored enabled apps hold a {0} instead of a JSON string")]
    EnabledAppsWrongType(&'static str),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// All preferences read at once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferencesSnapshot {
    pub service_enabled: bool,
    pub group_reply_enabled: bool,
    pub auto_reply_delay_ms: i64,
    pub enabled_apps: BTreeSet<String>,
}

/// Typed preferences over a [`PreferenceBackend`]
pub struct PreferencesStore {
    backend: Arc<dyn PreferenceBackend>,
    context: AppContext,
    migration: MigrationOutcome,
}

impl std::fmt::Debug for PreferencesStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferencesStore")
            .field("context", &self.context)
            .field("migration", &self.migration)
            .finish()
    }
}

impl PreferencesStore {
    /// Build a store over `backend`, migrating stored data first
    pub fn new(
        backend: Arc<dyn PreferenceBackend>,
        context: AppContext,
    ) -> Result<Self, PreferencesError> {
        let migration = migrate(backend.as_ref(), context.prepopulate_supported_apps())?;
        Ok(Self {
            backend,
            context,
            migration,
        })
    }

    /// Open the preferences file described by `context`
    pub fn open(context: AppContext) -> Result<Self, PreferencesError> {
        let backend = FileBackend::open(context.preferences_path())?;
        Self::new(Arc::new(backend), context)
    }

    /// Process-wide store, opened on first call
    ///
    /// Only the application-scoped part of `context` is kept. Once a store
    /// exists, later calls return it and ignore `context`. If opening fails the
    /// error is returned and the next call tries again.
    pub fn instance(context: &impl Context) -> Result<&'static PreferencesStore, PreferencesError> {
        INSTANCE.get_or_try_init(|| Self::open(context.application_context()))
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    /// What the startup migration did for this store
    pub fn migration(&self) -> MigrationOutcome {
        self.migration
    }

    pub fn is_service_enabled(&self) -> bool {
        self.backend.get_bool(KEY_SERVICE_ENABLED, false)
    }

    pub fn set_service_pref(&self, enabled: bool) {
        self.backend.put_bool(KEY_SERVICE_ENABLED, enabled);
    }

    pub fn is_group_reply_enabled(&self) -> bool {
        self.backend.get_bool(KEY_GROUP_REPLY_ENABLED, false)
    }

    pub fn set_group_reply_pref(&self, enabled: bool) {
        self.backend.put_bool(KEY_GROUP_REPLY_ENABLED, enabled);
    }

    /// Minimum time between automatic replies, in milliseconds
    pub fn auto_reply_delay(&self) -> i64 {
        self.backend.get_long(KEY_AUTO_REPLY_THROTTLE_TIME_MS, 0)
    }

    pub fn set_auto_reply_delay(&self, delay_ms: i64) {
        self.backend.put_long(KEY_AUTO_REPLY_THROTTLE_TIME_MS, delay_ms);
    }

    /// Package identifiers of the apps auto-reply is enabled for
    ///
    /// When nothing is stored (a release that predates app selection) only
    /// WhatsApp is enabled, and that choice is persisted.
    ///
    /// # Errors
    ///
    /// Returns [`PreferencesError::MalformedEnabledApps`] if the stored value
    /// is not a JSON array of strings, or
    /// [`PreferencesError::EnabledAppsWrongType`] if it is not a string. The
    /// stored value is left untouched.
    pub fn enabled_apps(&self) -> Result<BTreeSet<String>, PreferencesError> {
        let json = match self.backend.get(KEY_SELECTED_APPS_ARR) {
            Some(PrefValue::Str(json)) => json,
            Some(other) => return Err(PreferencesError::EnabledAppsWrongType(other.kind())),
            None => {
                tracing::info!("No enabled apps stored, enabling the default app");
                self.set_apps_as_enabled(&[default_app()])?
            }
        };

        decode_packages(&json)
    }

    pub fn is_app_enabled(&self, app: &App) -> Result<bool, PreferencesError> {
        Ok(self.enabled_apps()?.contains(&app.package_name))
    }

    /// Replace the enabled apps with `apps`, returning the stored JSON
    pub fn set_apps_as_enabled<'a>(
        &self,
        apps: impl IntoIterator<Item = &'a App>,
    ) -> Result<String, PreferencesError> {
        let packages: BTreeSet<String> = apps
            .into_iter()
            .map(|app| app.package_name.clone())
            .collect();
        self.store_packages(&packages)
    }

    /// Enable or disable a single app, returning the stored JSON
    pub fn save_enabled_apps(&self, app: &App, is_selected: bool) -> Result<String, PreferencesError> {
        let mut packages = self.enabled_apps()?;
        if is_selected {
            packages.insert(app.package_name.clone());
        } else {
            packages.remove(&app.package_name);
        }
        self.store_packages(&packages)
    }

    pub fn snapshot(&self) -> Result<PreferencesSnapshot, PreferencesError> {
        Ok(PreferencesSnapshot {
            service_enabled: self.is_service_enabled(),
            group_reply_enabled: self.is_group_reply_enabled(),
            auto_reply_delay_ms: self.auto_reply_delay(),
            enabled_apps: self.enabled_apps()?,
        })
    }

    fn store_packages(&self, packages: &BTreeSet<String>) -> Result<String, PreferencesError> {
        let json = encode_packages(packages)?;
        self.backend.put_string(KEY_SELECTED_APPS_ARR, json.clone());
        Ok(json)
    }
}

/// Encode package identifiers as a sorted JSON array
pub(crate) fn encode_packages(packages: &BTreeSet<String>) -> Result<String, PreferencesError> {
    serde_json::to_string(packages).map_err(|e| StorageError::from(e).into())
}

fn decode_packages(json: &str) -> Result<BTreeSet<String>, PreferencesError> {
    serde_json::from_str(json).map_err(PreferencesError::MalformedEnabledApps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::keys::KEY_SCHEMA_VERSION;
    use crate::storage::MemoryBackend;
    use crate::types::app::{MESSENGER_PACKAGE, WHATSAPP_PACKAGE};
    use crate::types::PreferencesConfig;

    fn context(prepopulate: bool) -> AppContext {
        let mut config = PreferencesConfig::in_dir("/nonexistent/replyprefs");
        config.prepopulate_supported_apps = prepopulate;
        AppContext::new(config).unwrap()
    }

    fn memory_store() -> (Arc<MemoryBackend>, PreferencesStore) {
        let backend = Arc::new(MemoryBackend::new());
        let store = PreferencesStore::new(backend.clone(), context(false)).unwrap();
        (backend, store)
    }

    fn set(packages: &[&str]) -> BTreeSet<String> {
        packages.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_defaults() {
        let (_, store) = memory_store();
        assert!(!store.is_service_enabled());
        assert!(!store.is_group_reply_enabled());
        assert_eq!(store.auto_reply_delay(), 0);
    }

    #[test]
    fn test_switches_roundtrip() {
        let (_, store) = memory_store();
        for value in [true, false] {
            store.set_service_pref(value);
            assert_eq!(store.is_service_enabled(), value);
            store.set_group_reply_pref(value);
            assert_eq!(store.is_group_reply_enabled(), value);
        }
    }

    #[test]
    fn test_delay_roundtrip() {
        let (_, store) = memory_store();
        for delay in [0, 1, 60_000, i64::MAX] {
            store.set_auto_reply_delay(delay);
            assert_eq!(store.auto_reply_delay(), delay);
        }
    }

    #[test]
    fn test_empty_store_enables_whatsapp() {
        let backend = Arc::new(MemoryBackend::new());
        // Skip the startup migration to exercise the read-time fallback
        backend.put_long(KEY_SCHEMA_VERSION, 1);
        let store = PreferencesStore::new(backend.clone(), context(false)).unwrap();
        assert!(!backend.contains(KEY_SELECTED_APPS_ARR));

        assert_eq!(store.enabled_apps().unwrap(), set(&[WHATSAPP_PACKAGE]));
        assert_eq!(
            backend.get_string(KEY_SELECTED_APPS_ARR).as_deref(),
            Some(r#"["com.whatsapp"]"#)
        );
    }

    #[test]
    fn test_fresh_store_enables_whatsapp() {
        let (backend, store) = memory_store();
        assert_eq!(store.migration(), MigrationOutcome::NewInstall);
        assert_eq!(store.enabled_apps().unwrap(), set(&[WHATSAPP_PACKAGE]));
        assert_eq!(
            backend.get_string(KEY_SELECTED_APPS_ARR).as_deref(),
            Some(r#"["com.whatsapp"]"#)
        );
    }

    #[test]
    fn test_fresh_store_with_prepopulate_enables_all_supported() {
        let backend = Arc::new(MemoryBackend::new());
        let store = PreferencesStore::new(backend, context(true)).unwrap();
        assert_eq!(
            store.enabled_apps().unwrap(),
            set(&[WHATSAPP_PACKAGE, MESSENGER_PACKAGE])
        );
    }

    #[test]
    fn test_set_apps_as_enabled_replaces() {
        let (_, store) = memory_store();
        let apps = [App::new("A", "pkg.a"), App::new("B", "pkg.b")];

        store.set_apps_as_enabled(&apps).unwrap();

        assert_eq!(store.enabled_apps().unwrap(), set(&["pkg.a", "pkg.b"]));
    }

    #[test]
    fn test_set_apps_as_enabled_dedups_and_is_stable() {
        let (_, store) = memory_store();
        let apps = [
            App::new("B", "pkg.b"),
            App::new("A", "pkg.a"),
            App::new("A again", "pkg.a"),
        ];

        let first = store.set_apps_as_enabled(&apps).unwrap();
        let second = store.set_apps_as_enabled(&apps).unwrap();

        assert_eq!(first, second);
        assert_eq!(first, r#"["pkg.a","pkg.b"]"#);
    }

    #[test]
    fn test_save_enabled_apps_toggles() {
        let (_, store) = memory_store();
        let app = App::new("A", "pkg.a");
        store.set_apps_as_enabled(&Vec::<App>::new()).unwrap();
        assert!(store.enabled_apps().unwrap().is_empty());

        store.save_enabled_apps(&app, true).unwrap();
        assert!(store.is_app_enabled(&app).unwrap());

        let json = store.save_enabled_apps(&app, false).unwrap();
        assert_eq!(json, "[]");
        assert!(!store.is_app_enabled(&app).unwrap());
    }

    #[test]
    fn test_save_enabled_apps_keeps_others() {
        let (_, store) = memory_store();
        store.save_enabled_apps(&App::new("A", "pkg.a"), true).unwrap();
        assert_eq!(
            store.enabled_apps().unwrap(),
            set(&[WHATSAPP_PACKAGE, "pkg.a"])
        );
    }

    #[test]
    fn test_is_app_enabled_exact_match() {
        let (_, store) = memory_store();
        store.set_apps_as_enabled(&[App::new("A", "pkg.a")]).unwrap();
        assert!(store.is_app_enabled(&App::new("Other name", "pkg.a")).unwrap());
        assert!(!store.is_app_enabled(&App::new("A", "pkg.a.lite")).unwrap());
        assert!(!store.is_app_enabled(&App::new("A", "PKG.A")).unwrap());
    }

    #[test]
    fn test_malformed_enabled_apps_is_an_error() {
        let (backend, store) = memory_store();
        backend.put_string(KEY_SELECTED_APPS_ARR, "{\"not\": \"a list\"}".to_string());

        assert!(matches!(
            store.enabled_apps(),
            Err(PreferencesError::MalformedEnabledApps(_))
        ));
        assert!(store.is_app_enabled(&App::new("A", "pkg.a")).is_err());
        assert!(store.save_enabled_apps(&App::new("A", "pkg.a"), true).is_err());
        // Nothing was reset
        assert_eq!(
            backend.get_string(KEY_SELECTED_APPS_ARR).as_deref(),
            Some("{\"not\": \"a list\"}")
        );
    }

    #[test]
    fn test_wrong_typed_enabled_apps_is_an_error() {
        let backend = Arc::new(MemoryBackend::new());
        backend.put_bool(KEY_SELECTED_APPS_ARR, true);
        let store = PreferencesStore::new(backend.clone(), context(false)).unwrap();

        assert!(matches!(
            store.enabled_apps(),
            Err(PreferencesError::EnabledAppsWrongType("bool"))
        ));
        assert!(store.is_app_enabled(&App::new("A", "pkg.a")).is_err());
        assert!(store.save_enabled_apps(&App::new("A", "pkg.a"), false).is_err());
        assert_eq!(backend.get(KEY_SELECTED_APPS_ARR), Some(PrefValue::Bool(true)));
    }

    #[test]
    fn test_concurrent_switch_writes() {
        let dir = tempfile::tempdir().unwrap();
        let context = AppContext::new(PreferencesConfig::in_dir(dir.path())).unwrap();
        let store = Arc::new(PreferencesStore::open(context.clone()).unwrap());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || match i {
                    0 => store.set_service_pref(true),
                    1 => store.set_group_reply_pref(true),
                    2 => store.set_auto_reply_delay(4200),
                    _ => {
                        store.set_apps_as_enabled(&[App::new("A", "pkg.a")]).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        drop(store);

        let reopened = PreferencesStore::open(context).unwrap();
        assert!(reopened.is_service_enabled());
        assert!(reopened.is_group_reply_enabled());
        assert_eq!(reopened.auto_reply_delay(), 4200);
        assert_eq!(reopened.enabled_apps().unwrap(), set(&["pkg.a"]));
    }

    #[test]
    fn test_snapshot() {
        let (_, store) = memory_store();
        store.set_service_pref(true);
        store.set_auto_reply_delay(1500);

        let snapshot = store.snapshot().unwrap();

        assert_eq!(
            snapshot,
            PreferencesSnapshot {
                service_enabled: true,
                group_reply_enabled: false,
                auto_reply_delay_ms: 1500,
                enabled_apps: set(&[WHATSAPP_PACKAGE]),
            }
        );
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let context = AppContext::new(PreferencesConfig::in_dir(dir.path())).unwrap();

        let store = PreferencesStore::open(context.clone()).unwrap();
        store.set_group_reply_pref(true);
        store.set_apps_as_enabled(&[App::new("A", "pkg.a")]).unwrap();
        drop(store);

        let reopened = PreferencesStore::open(context).unwrap();
        assert_eq!(reopened.migration(), MigrationOutcome::UpToDate);
        assert!(reopened.is_group_reply_enabled());
        assert_eq!(reopened.enabled_apps().unwrap(), set(&["pkg.a"]));
    }

    #[test]
    fn test_instance_ignores_later_context() {
        let first_dir = tempfile::tempdir().unwrap();
        let second_dir = tempfile::tempdir().unwrap();
        let first = AppContext::new(PreferencesConfig::in_dir(first_dir.path())).unwrap();
        let second = AppContext::new(PreferencesConfig::in_dir(second_dir.path())).unwrap();

        let a = PreferencesStore::instance(&first).unwrap();
        let b = PreferencesStore::instance(&second).unwrap();

        assert!(std::ptr::eq(a, b));
        assert_eq!(b.context().data_dir(), first_dir.path());
    }
}
