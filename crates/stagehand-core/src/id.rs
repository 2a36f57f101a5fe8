use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use uuid::Uuid;

new_key_type! {
    /// Identifies a listener registered on an [`EventHandler`](crate::handler::EventHandler).
    pub struct ListenerId;
}

/// Stable unique identifier of a collection. Survives restarts, so it is the
/// value persisted for resume-after-restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CollectionId(pub Uuid);

impl CollectionId {
    /// A fresh random id.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// A deterministic id derived from a collection name. Two calls with the
    /// same name always produce the same id.
    pub fn from_name(name: &str) -> Self {
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()))
    }

    /// Parse the hyphenated string form.
    pub fn parse_str(input: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(input).map(Self)
    }
}

impl std::fmt::Display for CollectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Opaque key identifying a scene to the external [`SceneLoader`](crate::loader::SceneLoader).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SceneKey {
    /// Asset path of the scene.
    Path(String),
    /// Build index of the scene.
    Index(u32),
}

impl std::fmt::Display for SceneKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneKey::Path(path) => write!(f, "{path}"),
            SceneKey::Index(index) => write!(f, "#{index}"),
        }
    }
}

impl From<&str> for SceneKey {
    fn from(path: &str) -> Self {
        SceneKey::Path(path.to_string())
    }
}

impl From<u32> for SceneKey {
    fn from(index: u32) -> Self {
        SceneKey::Index(index)
    }
}
