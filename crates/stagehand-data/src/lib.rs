//! Authoring data for Stagehand: collection manifests, controller
//! configuration and file-backed preferences.
//!
//! Manifests may be written in RON, TOML or JSON; the format is picked from
//! the file extension.

pub mod loader;
pub mod prefs;
pub mod schema;

pub use loader::{DataLoadError, build_library, load_controller_config, load_library};
pub use prefs::JsonPreferenceStore;
