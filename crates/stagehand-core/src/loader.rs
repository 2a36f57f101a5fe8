//! Contract of the external resource loader.
//!
//! The loader is the host's primitive for bringing a single scene in and out
//! of memory. It is the only suspension point besides the clock: loads report
//! progress as a stream, unloads complete as a future.

use futures::future::LocalBoxFuture;
use futures::stream::LocalBoxStream;

use crate::error::LoaderError;
use crate::id::SceneKey;

/// Raw progress reported by a load, ending when the load completes. An `Err`
/// item fails the load.
pub type ProgressStream = LocalBoxStream<'static, Result<f32, LoaderError>>;

/// External loader of individual scenes.
pub trait SceneLoader {
    /// Whether the key resolves to a scene at all.
    fn is_valid(&self, key: &SceneKey) -> bool;

    /// Whether the scene is currently loaded.
    fn is_loaded(&self, key: &SceneKey) -> bool;

    /// Begin loading a scene.
    fn load(&self, key: &SceneKey) -> Result<ProgressStream, LoaderError>;

    /// Unload a scene.
    fn unload(&self, key: &SceneKey) -> LocalBoxFuture<'static, Result<(), LoaderError>>;

    /// Make a loaded scene the active one.
    fn activate(&self, key: &SceneKey) -> Result<(), LoaderError>;

    /// Raw progress value that means "done". Loaders whose native progress
    /// stops short of 1 override this.
    fn progress_ceiling(&self) -> f32 {
        1.0
    }
}
