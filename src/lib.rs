//! ReplyPrefs Library
//!
//! Persistent preferences for the auto-reply feature: the service and
//! group-reply switches, the throttle delay, and the apps replies are enabled for.

pub mod context;
pub mod storage;
pub mod types;

pub use context::{AppContext, Context};
pub use storage::{PreferencesError, PreferencesSnapshot, PreferencesStore};
pub use types::{App, PreferencesConfig};
