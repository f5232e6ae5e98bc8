//! Messaging app types
//!
//! Defines the apps the auto-reply feature can target.

use serde::{Deserialize, Serialize};

/// A messaging app the auto-reply feature can be enabled for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct App {
    /// Display name shown to the user
    pub name: String,
    /// Package identifier, the only part that gets persisted
    pub package_name: String,
}

impl App {
    pub fn new(name: impl Into<String>, package_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            package_name: package_name.into(),
        }
    }
}

/// Package identifier of WhatsApp
pub const WHATSAPP_PACKAGE: &str = "com.whatsapp";

/// Package identifier of Facebook Messenger
pub const MESSENGER_PACKAGE: &str = "com.facebook.orca";

/// Every app the feature knows how to reply on, as (name, package) pairs
pub const SUPPORTED_APPS: &[(&str, &str)] = &[
    ("WhatsApp", WHATSAPP_PACKAGE),
    ("Facebook Messenger", MESSENGER_PACKAGE),
];

/// All supported apps as owned values
pub fn supported_apps() -> Vec<App> {
    SUPPORTED_APPS
        .iter()
        .map(|(name, package)| App::new(*name, *package))
        .collect()
}

/// The app enabled for users upgrading from a version without app selection
pub fn default_app() -> App {
    App::new("WhatsApp", WHATSAPP_PACKAGE)
}

/// Look up a supported app by its package identifier
pub fn find_supported(package_name: &str) -> Option<App> {
    SUPPORTED_APPS
        .iter()
        .find(|(_, package)| *package == package_name)
        .map(|(name, package)| App::new(*name, *package))
}
