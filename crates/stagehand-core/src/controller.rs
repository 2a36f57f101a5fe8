//! Root orchestrator: owns "what is loaded" and runs swaps one at a time.
//!
//! A swap runs as a single task on the [`Scheduler`]:
//!
//! 1. show the target's transition
//! 2. unload the currently loaded collection, if any
//! 3. load the target
//! 4. delay, then hide the target's transition
//!
//! The target's transition events are bridged to the controller's global
//! channels for the whole swap; the lifecycle events of the outgoing and the
//! target collection only while they unload or load. Every bridge is an RAII
//! token, so it is released even when a step fails or the swap times out.
//!
//! The single-flight check and the write of the loading slot happen in one
//! step, before the task is spawned. The slot is cleared by a guard owned by
//! the task, so a failing swap never leaves the controller busy.

use std::cell::RefCell;
use std::rc::Rc;

use futures::executor::LocalSpawner;
use futures::future::{Either, RemoteHandle, select};
use futures::task::LocalSpawnExt;

use crate::bridge::{BridgeScope, EventChannels, bridge};
use crate::collection::Collection;
use crate::config::ControllerConfig;
use crate::error::{ControllerError, SwapError};
use crate::event::CollectionEvent;
use crate::handler::Subscription;
use crate::id::CollectionId;
use crate::journal::{EventJournal, SharedJournal, record_into};
use crate::library::CollectionLibrary;
use crate::loader::SceneLoader;
use crate::schedule::{Clock, Scheduler};
use crate::store::SelectionStore;

/// Resolves to the outcome of a swap. Dropping it cancels the swap; use
/// [`RemoteHandle::forget`] to let it run detached.
pub type SwapHandle = RemoteHandle<Result<(), SwapError>>;

#[derive(Default)]
struct ControllerState {
    loading: Option<Rc<Collection>>,
    loaded: Option<Rc<Collection>>,
}

struct ControllerShared {
    loader: Rc<dyn SceneLoader>,
    clock: Clock,
    spawner: LocalSpawner,
    config: ControllerConfig,
    events: EventChannels,
    state: RefCell<ControllerState>,
    selection: Option<Rc<dyn SelectionStore>>,
    library: CollectionLibrary,
    journal: SharedJournal<CollectionEvent>,
    _recording: Subscription,
}

/// Handle to a controller. Clones share the same state.
#[derive(Clone)]
pub struct Controller {
    shared: Rc<ControllerShared>,
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("Controller")
            .field("loading", &state.loading.as_ref().map(|c| c.name().to_string()))
            .field("loaded", &state.loaded.as_ref().map(|c| c.name().to_string()))
            .field("config", &self.shared.config)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

pub struct ControllerBuilder {
    loader: Rc<dyn SceneLoader>,
    clock: Clock,
    spawner: LocalSpawner,
    config: ControllerConfig,
    selection: Option<Rc<dyn SelectionStore>>,
    library: CollectionLibrary,
}

impl ControllerBuilder {
    pub fn config(mut self, config: ControllerConfig) -> Self {
        self.config = config;
        self
    }

    /// Remember committed collections in `store`, and resume from it on
    /// [`Controller::start`].
    pub fn selection_store(mut self, store: Rc<dyn SelectionStore>) -> Self {
        self.selection = Some(store);
        self
    }

    /// Collections that can be resumed or loaded by id.
    pub fn library(mut self, library: CollectionLibrary) -> Self {
        self.library = library;
        self
    }

    pub fn build(self) -> Controller {
        let events = EventChannels::new("controller");
        let journal: SharedJournal<CollectionEvent> =
            Rc::new(RefCell::new(EventJournal::new(self.config.journal_capacity)));
        let recording = record_into(events.collections(), &journal);

        Controller {
            shared: Rc::new(ControllerShared {
                loader: self.loader,
                clock: self.clock,
                spawner: self.spawner,
                config: self.config,
                events,
                state: RefCell::new(ControllerState::default()),
                selection: self.selection,
                library: self.library,
                journal,
                _recording: recording,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

impl Controller {
    pub fn builder(loader: Rc<dyn SceneLoader>, scheduler: &Scheduler) -> ControllerBuilder {
        ControllerBuilder {
            loader,
            clock: scheduler.clock().clone(),
            spawner: scheduler.spawner(),
            config: ControllerConfig::default(),
            selection: None,
            library: CollectionLibrary::new(),
        }
    }

    /// A controller with default configuration and no persistence.
    pub fn new(loader: Rc<dyn SceneLoader>, scheduler: &Scheduler) -> Self {
        Self::builder(loader, scheduler).build()
    }

    /// Global channels: every collection and scene event of every swap is
    /// re-raised here.
    pub fn events(&self) -> &EventChannels {
        &self.shared.events
    }

    /// Recent global collection events.
    pub fn journal(&self) -> SharedJournal<CollectionEvent> {
        Rc::clone(&self.shared.journal)
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.shared.config
    }

    pub fn library(&self) -> &CollectionLibrary {
        &self.shared.library
    }

    pub fn loader(&self) -> &Rc<dyn SceneLoader> {
        &self.shared.loader
    }

    /// The collection currently being swapped in.
    pub fn try_get_loading(&self) -> Option<Rc<Collection>> {
        self.shared.state.borrow().loading.clone()
    }

    /// The collection committed by the last successful swap.
    pub fn try_get_loaded(&self) -> Option<Rc<Collection>> {
        self.shared.state.borrow().loaded.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.shared.state.borrow().loading.is_some()
    }

    /// Start swapping to `target` and return a handle to the outcome.
    ///
    /// Rejected without touching any state if `target` has no valid scenes or
    /// another swap is in flight.
    pub fn swap(&self, target: &Rc<Collection>) -> Result<SwapHandle, ControllerError> {
        if target.scene_count() == 0 {
            log::warn!(
                "Collection \"{}\" does not contain any scenes, load will be ignored",
                target.name()
            );
            return Err(ControllerError::EmptyCollection {
                name: target.name().to_string(),
            });
        }

        {
            let mut state = self.shared.state.borrow_mut();
            if let Some(loading) = &state.loading {
                log::warn!(
                    "Can't load two collections at the same time, collection \"{}\" is currently being loaded",
                    loading.name()
                );
                return Err(ControllerError::SwapInFlight {
                    requested: target.name().to_string(),
                    loading: loading.name().to_string(),
                });
            }
            state.loading = Some(Rc::clone(target));
        }

        let in_flight = InFlight {
            shared: Rc::clone(&self.shared),
        };
        let shared = Rc::clone(&self.shared);
        let target = Rc::clone(target);
        let task = async move {
            let _in_flight = in_flight;
            shared.run_swap(target).await
        };

        self.shared.spawner.spawn_local_with_handle(task).map_err(|err| {
            log::error!("Could not start swap: {err}");
            ControllerError::Spawn {
                detail: err.to_string(),
            }
        })
    }

    /// Fire-and-forget form of [`Self::swap`]. Completion is observable
    /// through the global events and [`Self::try_get_loaded`].
    pub fn load_collection(&self, target: &Rc<Collection>) -> Result<(), ControllerError> {
        self.swap(target).map(RemoteHandle::forget)
    }

    /// Load a collection from the library.
    pub fn load_by_id(&self, id: CollectionId) -> Result<(), ControllerError> {
        let Some(target) = self.shared.library.get(id).cloned() else {
            log::warn!("Collection {id} is not in the library, load will be ignored");
            return Err(ControllerError::UnknownCollection { id });
        };
        self.load_collection(&target)
    }

    /// Swap to the currently loaded collection again.
    pub fn reload(&self) -> Result<(), ControllerError> {
        let loaded = self.try_get_loaded();
        let Some(loaded) = loaded else {
            log::warn!("No collection is loaded, reload will be ignored");
            return Err(ControllerError::NothingLoaded);
        };
        self.load_collection(&loaded)
    }

    /// Load the first collection of a session: the persisted selection if
    /// it is known to the library, otherwise `initial`.
    pub fn start(&self, initial: Option<&Rc<Collection>>) -> Result<(), ControllerError> {
        if let Some(store) = &self.shared.selection
            && let Some(id) = store.selected()
        {
            match self.shared.library.get(id).cloned() {
                Some(selected) => {
                    log::info!("Resuming collection \"{}\"", selected.name());
                    return self.load_collection(&selected);
                }
                None => log::warn!(
                    "Selected collection {id} is not in the library, falling back to the initial collection"
                ),
            }
        }

        match initial {
            Some(initial) => self.load_collection(initial),
            None => {
                log::warn!("Initial collection is not set, initial scene setup will not be loaded");
                Err(ControllerError::NoInitialCollection)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Clears the loading slot when the swap task finishes or is dropped.
struct InFlight {
    shared: Rc<ControllerShared>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.shared.state.borrow_mut().loading = None;
    }
}

impl ControllerShared {
    async fn run_swap(&self, target: Rc<Collection>) -> Result<(), SwapError> {
        log::debug!("Swapping to collection \"{}\"", target.name());

        let result = match self.config.swap_timeout() {
            None => self.pipeline(&target).await,
            Some(seconds) => {
                let pipeline = Box::pin(self.pipeline(&target));
                match select(pipeline, self.clock.delay(seconds)).await {
                    Either::Left((result, _)) => result,
                    Either::Right(((), pipeline)) => {
                        drop(pipeline);
                        Err(SwapError::TimedOut {
                            collection: target.name().to_string(),
                            seconds,
                        })
                    }
                }
            }
        };

        match &result {
            Ok(()) => self.commit(&target),
            Err(err) => log::error!(
                "Loading collection \"{}\" failed, keeping the previous collection: {err}",
                target.name()
            ),
        }
        result
    }

    async fn pipeline(&self, target: &Rc<Collection>) -> Result<(), SwapError> {
        let _transition = bridge(target.events(), &self.events, BridgeScope::Transition);

        target.show_transition(&self.clock).await;

        let outgoing = self.state.borrow().loaded.clone();
        if let Some(outgoing) = outgoing {
            log::debug!("Unloading collection \"{}\"", outgoing.name());
            let _lifecycle = bridge(outgoing.events(), &self.events, BridgeScope::Lifecycle);
            outgoing.unload(self.loader.as_ref()).await?;
        }

        {
            log::debug!("Loading collection \"{}\"", target.name());
            let _lifecycle = bridge(target.events(), &self.events, BridgeScope::Lifecycle);
            target.load(self.loader.as_ref()).await?;
        }

        target.delay_transition(&self.clock).await;
        target.hide_transition(&self.clock).await;
        Ok(())
    }

    fn commit(&self, target: &Rc<Collection>) {
        self.state.borrow_mut().loaded = Some(Rc::clone(target));

        if self.config.persist_selection
            && let Some(store) = &self.selection
            && let Err(err) = store.set_selected(target.id())
        {
            log::warn!(
                "Could not persist selection of collection \"{}\": {err}",
                target.name()
            );
        }

        log::info!("Collection \"{}\" loaded", target.name());
    }
}
