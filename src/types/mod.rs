//! Shared type definitions
//!
//! This module contains the data types shared across the crate.

pub mod app;
pub mod config;

pub use app::App;
pub use config::PreferencesConfig;
