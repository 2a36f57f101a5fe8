//! Serde structs for collection manifests.
//!
//! A manifest declares transitions, scenes and collections by name.
//! Collections refer to scenes and transitions by those names; the loader
//! resolves the references into core types.

use serde::Deserialize;
use stagehand_core::transition::FadeSettings;

/// Top-level manifest file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ManifestData {
    pub transitions: Vec<TransitionDef>,
    pub scenes: Vec<SceneDef>,
    pub collections: Vec<CollectionDef>,
}

// ===========================================================================
// Scenes
// ===========================================================================

/// A scene definition. Exactly one of `path` or `index` identifies the scene
/// to the resource loader.
#[derive(Debug, Clone, Deserialize)]
pub struct SceneDef {
    pub name: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub index: Option<u32>,
    #[serde(default)]
    pub activate_on_load: bool,
    #[serde(default)]
    pub persist: bool,
}

// ===========================================================================
// Transitions
// ===========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionStyle {
    #[default]
    Instant,
    Fade,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransitionDef {
    pub name: String,
    #[serde(default)]
    pub style: TransitionStyle,
    /// Only read for the fade style.
    #[serde(default)]
    pub fade: FadeSettings,
}

// ===========================================================================
// Collections
// ===========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionDef {
    /// Stable UUID. Derived from the name when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub transition: Option<String>,
    /// Scene names in load order. An empty string is an unset entry.
    #[serde(default)]
    pub scenes: Vec<String>,
}
