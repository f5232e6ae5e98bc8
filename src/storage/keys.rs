//! Preference key names
//!
//! The stored names match the ones written by earlier releases, so existing
//! preference files keep working.

pub const KEY_SERVICE_ENABLED: &str = "pref_service_enabled";
pub const KEY_GROUP_REPLY_ENABLED: &str = "pref_group_reply_enabled";
pub const KEY_AUTO_REPLY_THROTTLE_TIME_MS: &str = "pref_auto_reply_throttle_time_ms";
/// JSON array of enabled package identifiers
pub const KEY_SELECTED_APPS_ARR: &str = "pref_selected_apps_arr";
/// Version of the stored layout, written by the startup migration
pub const KEY_SCHEMA_VERSION: &str = "pref_schema_version";
