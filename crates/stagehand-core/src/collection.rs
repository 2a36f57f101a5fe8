//! Ordered groups of scenes loaded and unloaded as one unit.
//!
//! A collection's scene list may contain unset entries; every operation works
//! on the *valid* scenes, the set entries in authored order. The list is
//! snapshotted at the start of a load or unload, so edits made while one is
//! running take effect on the next run.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::bridge::{EventChannels, forward};
use crate::error::SwapError;
use crate::event::{CollectionEvent, SceneEvent, SceneEventKind};
use crate::handler::{Subscription, SubscriptionSet};
use crate::id::CollectionId;
use crate::loader::SceneLoader;
use crate::progress::collection_progress;
use crate::scene::Scene;
use crate::schedule::Clock;
use crate::transition::Transition;

/// Authoring health of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStatus {
    /// No valid scenes; the collection cannot be loaded.
    MissingScenes,
    /// At least one scene key does not resolve for the loader.
    InvalidScenes,
    Ready,
}

pub struct Collection {
    id: CollectionId,
    name: String,
    scenes: RefCell<Vec<Option<Rc<Scene>>>>,
    transition: RefCell<Option<Rc<Transition>>>,
    channels: EventChannels,
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let scenes: Vec<Option<String>> = self
            .scenes
            .borrow()
            .iter()
            .map(|entry| entry.as_ref().map(|scene| scene.name().to_string()))
            .collect();
        f.debug_struct("Collection")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("scenes", &scenes)
            .field(
                "transition",
                &self.transition.borrow().as_ref().map(|t| t.name().to_string()),
            )
            .finish()
    }
}

impl Collection {
    /// An empty collection whose id is derived from its name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: CollectionId::from_name(&name),
            channels: EventChannels::new(&format!("collection {name}")),
            name,
            scenes: RefCell::new(Vec::new()),
            transition: RefCell::new(None),
        }
    }

    pub fn with_id(mut self, id: CollectionId) -> Self {
        self.id = id;
        self
    }

    pub fn with_scene(self, scene: Rc<Scene>) -> Self {
        self.scenes.borrow_mut().push(Some(scene));
        self
    }

    /// Append an unset entry, as left behind by an unfinished edit.
    pub fn with_empty_slot(self) -> Self {
        self.scenes.borrow_mut().push(None);
        self
    }

    pub fn with_transition(self, transition: Rc<Transition>) -> Self {
        *self.transition.borrow_mut() = Some(transition);
        self
    }

    pub fn id(&self) -> CollectionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Collection and echoed scene events raised by this collection.
    pub fn events(&self) -> &EventChannels {
        &self.channels
    }

    pub fn transition(&self) -> Option<Rc<Transition>> {
        self.transition.borrow().clone()
    }

    pub fn set_transition(&self, transition: Option<Rc<Transition>>) {
        *self.transition.borrow_mut() = transition;
    }

    /// Raw entries, including unset ones.
    pub fn entries(&self) -> Vec<Option<Rc<Scene>>> {
        self.scenes.borrow().clone()
    }

    pub fn push_scene(&self, scene: Option<Rc<Scene>>) {
        self.scenes.borrow_mut().push(scene);
    }

    /// Remove the entry at `index`, returning it.
    pub fn remove_entry(&self, index: usize) -> Option<Option<Rc<Scene>>> {
        let mut scenes = self.scenes.borrow_mut();
        (index < scenes.len()).then(|| scenes.remove(index))
    }

    /// Set entries in authored order.
    pub fn valid_scenes(&self) -> Vec<Rc<Scene>> {
        self.scenes.borrow().iter().flatten().cloned().collect()
    }

    /// Number of valid scenes. This is the count used for progress.
    pub fn scene_count(&self) -> usize {
        self.scenes.borrow().iter().flatten().count()
    }

    pub fn status(&self, loader: &dyn SceneLoader) -> CollectionStatus {
        let scenes = self.valid_scenes();
        if scenes.is_empty() {
            CollectionStatus::MissingScenes
        } else if scenes.iter().any(|scene| !scene.is_valid(loader)) {
            CollectionStatus::InvalidScenes
        } else {
            CollectionStatus::Ready
        }
    }

    /// Whether every valid scene is currently loaded.
    pub fn is_open(&self, loader: &dyn SceneLoader) -> bool {
        let scenes = self.valid_scenes();
        !scenes.is_empty() && scenes.iter().all(|scene| scene.is_loaded(loader))
    }

    // -----------------------------------------------------------------------
    // Load / unload
    // -----------------------------------------------------------------------

    /// Load every valid scene in order, activating those flagged for it.
    ///
    /// Raises collection progress for each scene progress step. Scene events
    /// are echoed on this collection's scene channel while each scene loads.
    pub async fn load(self: &Rc<Self>, loader: &dyn SceneLoader) -> Result<(), SwapError> {
        self.raise(CollectionEvent::LoadEntered {
            collection: Rc::clone(self),
        });

        let scenes = self.valid_scenes();
        let count = scenes.len();
        for (index, scene) in scenes.into_iter().enumerate() {
            let mut wiring = SubscriptionSet::new();
            wiring.push(forward(scene.events(), self.channels.scenes(), None));
            wiring.push(self.progress_forwarder(&scene, index, count));

            scene.load(loader).await?;
            if scene.activate_on_load() {
                scene.activate(loader);
            }
        }

        self.raise(CollectionEvent::LoadExited {
            collection: Rc::clone(self),
        });
        Ok(())
    }

    /// Unload every valid scene in order, skipping persistent ones. No
    /// aggregate progress is reported.
    pub async fn unload(self: &Rc<Self>, loader: &dyn SceneLoader) -> Result<(), SwapError> {
        self.raise(CollectionEvent::UnloadEntered {
            collection: Rc::clone(self),
        });

        for scene in self.valid_scenes() {
            if scene.persist() {
                log::debug!("Scene \"{}\" persists, not unloading", scene.name());
                continue;
            }
            let _echo = forward(scene.events(), self.channels.scenes(), None);
            scene.unload(loader).await?;
        }

        self.raise(CollectionEvent::UnloadExited {
            collection: Rc::clone(self),
        });
        Ok(())
    }

    fn progress_forwarder(self: &Rc<Self>, scene: &Rc<Scene>, index: usize, count: usize) -> Subscription {
        let owner: Weak<Collection> = Rc::downgrade(self);
        scene
            .events()
            .subscribe_kind(SceneEventKind::LoadProgress, move |event| {
                let (SceneEvent::LoadProgress { scene, progress }, Some(collection)) =
                    (event, owner.upgrade())
                else {
                    return;
                };
                collection.raise(CollectionEvent::LoadProgress {
                    collection_progress: collection_progress(index, count, *progress),
                    collection: Rc::clone(&collection),
                    scene: Rc::clone(scene),
                    scene_progress: *progress,
                });
            })
    }

    // -----------------------------------------------------------------------
    // Transition phases
    // -----------------------------------------------------------------------

    pub async fn show_transition(self: &Rc<Self>, clock: &Clock) {
        let Some(transition) = self.transition() else {
            return;
        };
        self.raise(CollectionEvent::ShowTransitionEntered {
            collection: Rc::clone(self),
        });
        transition.show(clock).await;
        self.raise(CollectionEvent::ShowTransitionExited {
            collection: Rc::clone(self),
        });
    }

    pub async fn delay_transition(&self, clock: &Clock) {
        if let Some(transition) = self.transition() {
            transition.delay(clock).await;
        }
    }

    pub async fn hide_transition(self: &Rc<Self>, clock: &Clock) {
        let Some(transition) = self.transition() else {
            return;
        };
        self.raise(CollectionEvent::HideTransitionEntered {
            collection: Rc::clone(self),
        });
        transition.hide(clock).await;
        self.raise(CollectionEvent::HideTransitionExited {
            collection: Rc::clone(self),
        });
    }

    fn raise(&self, event: CollectionEvent) {
        self.channels.collections().raise(&event);
    }
}
