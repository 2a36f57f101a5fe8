//! Lifecycle and progress events raised by scenes, collections and
//! transitions.
//!
//! Every event type has a `*Kind` discriminant used for filtering. The
//! collection kinds are grouped into [`CollectionEventKind::LIFECYCLE`] and
//! [`CollectionEventKind::TRANSITION`], which is how the swap pipeline
//! bridges only part of a collection's events at a time.

use std::rc::Rc;

use crate::collection::Collection;
use crate::handler::HandlerEvent;
use crate::scene::Scene;

// ---------------------------------------------------------------------------
// Scene events
// ---------------------------------------------------------------------------

/// An event raised by a single [`Scene`].
#[derive(Debug, Clone)]
pub enum SceneEvent {
    LoadEntered { scene: Rc<Scene> },
    LoadExited { scene: Rc<Scene> },
    /// Load progress of the scene, in `[0, 1]`.
    LoadProgress { scene: Rc<Scene>, progress: f32 },
    UnloadEntered { scene: Rc<Scene> },
    UnloadExited { scene: Rc<Scene> },
    ActivateEntered { scene: Rc<Scene> },
    ActivateExited { scene: Rc<Scene> },
}

/// Discriminant tag for [`SceneEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneEventKind {
    LoadEntered,
    LoadExited,
    LoadProgress,
    UnloadEntered,
    UnloadExited,
    ActivateEntered,
    ActivateExited,
}

impl SceneEventKind {
    pub const ALL: [SceneEventKind; 7] = [
        SceneEventKind::LoadEntered,
        SceneEventKind::LoadExited,
        SceneEventKind::LoadProgress,
        SceneEventKind::UnloadEntered,
        SceneEventKind::UnloadExited,
        SceneEventKind::ActivateEntered,
        SceneEventKind::ActivateExited,
    ];
}

impl SceneEvent {
    /// The scene that raised this event.
    pub fn scene(&self) -> &Rc<Scene> {
        match self {
            SceneEvent::LoadEntered { scene }
            | SceneEvent::LoadExited { scene }
            | SceneEvent::LoadProgress { scene, .. }
            | SceneEvent::UnloadEntered { scene }
            | SceneEvent::UnloadExited { scene }
            | SceneEvent::ActivateEntered { scene }
            | SceneEvent::ActivateExited { scene } => scene,
        }
    }
}

impl HandlerEvent for SceneEvent {
    type Kind = SceneEventKind;

    fn kind(&self) -> SceneEventKind {
        match self {
            SceneEvent::LoadEntered { .. } => SceneEventKind::LoadEntered,
            SceneEvent::LoadExited { .. } => SceneEventKind::LoadExited,
            SceneEvent::LoadProgress { .. } => SceneEventKind::LoadProgress,
            SceneEvent::UnloadEntered { .. } => SceneEventKind::UnloadEntered,
            SceneEvent::UnloadExited { .. } => SceneEventKind::UnloadExited,
            SceneEvent::ActivateEntered { .. } => SceneEventKind::ActivateEntered,
            SceneEvent::ActivateExited { .. } => SceneEventKind::ActivateExited,
        }
    }
}

impl std::fmt::Display for SceneEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = self.scene().name();
        match self {
            SceneEvent::LoadEntered { .. } => write!(f, "Scene Load Entered: {name}"),
            SceneEvent::LoadExited { .. } => write!(f, "Scene Load Exited: {name}"),
            SceneEvent::LoadProgress { progress, .. } => {
                write!(f, "Scene Load Progress: {name} ({:.0}%)", progress * 100.0)
            }
            SceneEvent::UnloadEntered { .. } => write!(f, "Scene Unload Entered: {name}"),
            SceneEvent::UnloadExited { .. } => write!(f, "Scene Unload Exited: {name}"),
            SceneEvent::ActivateEntered { .. } => write!(f, "Scene Activate Entered: {name}"),
            SceneEvent::ActivateExited { .. } => write!(f, "Scene Activate Exited: {name}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Collection events
// ---------------------------------------------------------------------------

/// An event raised by a [`Collection`].
#[derive(Debug, Clone)]
pub enum CollectionEvent {
    LoadEntered {
        collection: Rc<Collection>,
    },
    LoadExited {
        collection: Rc<Collection>,
    },
    /// Aggregated progress: `collection_progress` covers the whole
    /// collection, `scene_progress` the scene currently loading.
    LoadProgress {
        collection: Rc<Collection>,
        scene: Rc<Scene>,
        collection_progress: f32,
        scene_progress: f32,
    },
    UnloadEntered {
        collection: Rc<Collection>,
    },
    UnloadExited {
        collection: Rc<Collection>,
    },
    ShowTransitionEntered {
        collection: Rc<Collection>,
    },
    ShowTransitionExited {
        collection: Rc<Collection>,
    },
    HideTransitionEntered {
        collection: Rc<Collection>,
    },
    HideTransitionExited {
        collection: Rc<Collection>,
    },
}

/// Discriminant tag for [`CollectionEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionEventKind {
    LoadEntered,
    LoadExited,
    LoadProgress,
    UnloadEntered,
    UnloadExited,
    ShowTransitionEntered,
    ShowTransitionExited,
    HideTransitionEntered,
    HideTransitionExited,
}

impl CollectionEventKind {
    /// Load/unload brackets and progress.
    pub const LIFECYCLE: [CollectionEventKind; 5] = [
        CollectionEventKind::LoadEntered,
        CollectionEventKind::LoadExited,
        CollectionEventKind::LoadProgress,
        CollectionEventKind::UnloadEntered,
        CollectionEventKind::UnloadExited,
    ];

    /// Show/hide transition brackets.
    pub const TRANSITION: [CollectionEventKind; 4] = [
        CollectionEventKind::ShowTransitionEntered,
        CollectionEventKind::ShowTransitionExited,
        CollectionEventKind::HideTransitionEntered,
        CollectionEventKind::HideTransitionExited,
    ];

    pub fn is_transition(self) -> bool {
        Self::TRANSITION.contains(&self)
    }
}

impl CollectionEvent {
    /// The collection that raised this event.
    pub fn collection(&self) -> &Rc<Collection> {
        match self {
            CollectionEvent::LoadEntered { collection }
            | CollectionEvent::LoadExited { collection }
            | CollectionEvent::LoadProgress { collection, .. }
            | CollectionEvent::UnloadEntered { collection }
            | CollectionEvent::UnloadExited { collection }
            | CollectionEvent::ShowTransitionEntered { collection }
            | CollectionEvent::ShowTransitionExited { collection }
            | CollectionEvent::HideTransitionEntered { collection }
            | CollectionEvent::HideTransitionExited { collection } => collection,
        }
    }
}

impl HandlerEvent for CollectionEvent {
    type Kind = CollectionEventKind;

    fn kind(&self) -> CollectionEventKind {
        match self {
            CollectionEvent::LoadEntered { .. } => CollectionEventKind::LoadEntered,
            CollectionEvent::LoadExited { .. } => CollectionEventKind::LoadExited,
            CollectionEvent::LoadProgress { .. } => CollectionEventKind::LoadProgress,
            CollectionEvent::UnloadEntered { .. } => CollectionEventKind::UnloadEntered,
            CollectionEvent::UnloadExited { .. } => CollectionEventKind::UnloadExited,
            CollectionEvent::ShowTransitionEntered { .. } => {
                CollectionEventKind::ShowTransitionEntered
            }
            CollectionEvent::ShowTransitionExited { .. } => {
                CollectionEventKind::ShowTransitionExited
            }
            CollectionEvent::HideTransitionEntered { .. } => {
                CollectionEventKind::HideTransitionEntered
            }
            CollectionEvent::HideTransitionExited { .. } => {
                CollectionEventKind::HideTransitionExited
            }
        }
    }
}

impl std::fmt::Display for CollectionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = self.collection().name();
        match self {
            CollectionEvent::LoadEntered { .. } => write!(f, "Collection Load Entered: {name}"),
            CollectionEvent::LoadExited { .. } => write!(f, "Collection Load Exited: {name}"),
            CollectionEvent::LoadProgress {
                scene,
                collection_progress,
                scene_progress,
                ..
            } => write!(
                f,
                "Collection Load Progress: {name} ({:.0}%), scene {} ({:.0}%)",
                collection_progress * 100.0,
                scene.name(),
                scene_progress * 100.0
            ),
            CollectionEvent::UnloadEntered { .. } => write!(f, "Collection Unload Entered: {name}"),
            CollectionEvent::UnloadExited { .. } => write!(f, "Collection Unload Exited: {name}"),
            CollectionEvent::ShowTransitionEntered { .. } => {
                write!(f, "Collection Show Transition Entered: {name}")
            }
            CollectionEvent::ShowTransitionExited { .. } => {
                write!(f, "Collection Show Transition Exited: {name}")
            }
            CollectionEvent::HideTransitionEntered { .. } => {
                write!(f, "Collection Hide Transition Entered: {name}")
            }
            CollectionEvent::HideTransitionExited { .. } => {
                write!(f, "Collection Hide Transition Exited: {name}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Transition events
// ---------------------------------------------------------------------------

/// Phase brackets raised by a [`Transition`](crate::transition::Transition) itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionEvent {
    ShowEntered,
    ShowExited,
    HideEntered,
    HideExited,
}

impl HandlerEvent for TransitionEvent {
    type Kind = TransitionEvent;

    fn kind(&self) -> TransitionEvent {
        *self
    }
}

// ===========================================================================
// Tests
// ===========================================================================
