//! Error types shared across the crate.
//!
//! Rejections ([`ControllerError`]) happen synchronously before any state is
//! touched. Pipeline failures ([`SwapError`]) abort the remaining swap steps
//! but never leave the controller wedged.

use crate::id::{CollectionId, SceneKey};

/// Errors reported by a [`SceneLoader`](crate::loader::SceneLoader).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoaderError {
    /// The key does not resolve to a known scene.
    #[error("scene '{key}' cannot be resolved")]
    InvalidKey { key: SceneKey },

    /// The loader started the operation but it failed.
    #[error("{operation} of scene '{key}' failed: {detail}")]
    Failed {
        key: SceneKey,
        operation: &'static str,
        detail: String,
    },
}

/// Errors that abort a running swap pipeline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SwapError {
    /// The external loader failed while loading or unloading a scene.
    #[error("scene '{scene}': {source}")]
    Loader { scene: String, source: LoaderError },

    /// The swap did not finish within the configured timeout.
    #[error("swap to collection '{collection}' timed out after {seconds}s")]
    TimedOut { collection: String, seconds: f32 },
}

/// Synchronous rejections of controller requests. No pipeline is started and
/// no state is changed when one of these is returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ControllerError {
    /// The requested collection has no valid scenes.
    #[error("collection '{name}' does not contain any scenes")]
    EmptyCollection { name: String },

    /// Another swap is already running.
    #[error("cannot load '{requested}', collection '{loading}' is currently being loaded")]
    SwapInFlight { requested: String, loading: String },

    /// Reload was requested but nothing is loaded.
    #[error("no collection is loaded")]
    NothingLoaded,

    /// Start was requested with neither a persisted selection nor an initial collection.
    #[error("no initial collection is set")]
    NoInitialCollection,

    /// The collection id is not present in the library.
    #[error("collection {id} not found in library")]
    UnknownCollection { id: CollectionId },

    /// The executor refused the pipeline task.
    #[error("failed to spawn swap task: {detail}")]
    Spawn { detail: String },
}

/// Errors raised by persistence collaborators.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Persisted state could not be encoded or decoded.
    #[error("serialization error: {detail}")]
    Serialization { detail: String },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
