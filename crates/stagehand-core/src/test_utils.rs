//! Shared test helpers for unit and integration tests.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so the
//! integration-test crate and the headless demo can use them through the
//! `test-utils` feature.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use futures::{FutureExt, StreamExt, stream};

use crate::bridge::EventChannels;
use crate::collection::Collection;
use crate::controller::Controller;
use crate::error::LoaderError;
use crate::event::{CollectionEvent, SceneEvent};
use crate::handler::{HandlerEvent, SubscriptionSet};
use crate::id::SceneKey;
use crate::loader::{ProgressStream, SceneLoader};
use crate::scene::Scene;
use crate::schedule::{Clock, Scheduler};

/// Frame length used by [`drive`].
pub const FRAME_SECONDS: f32 = 0.1;

// ===========================================================================
// Mock loader
// ===========================================================================

struct MockState {
    loaded: HashSet<SceneKey>,
    invalid: HashSet<SceneKey>,
    scripts: HashMap<SceneKey, Vec<f32>>,
    default_script: Vec<f32>,
    failing_loads: HashSet<SceneKey>,
    failing_unloads: HashSet<SceneKey>,
    hanging: HashSet<SceneKey>,
    activations: Vec<SceneKey>,
    load_calls: Vec<SceneKey>,
    unload_calls: Vec<SceneKey>,
    ceiling: f32,
}

enum Step {
    Progress(f32),
    Fail,
    Finish,
}

/// Scripted in-memory [`SceneLoader`].
///
/// Each load yields its script's progress values, then marks the scene
/// loaded. With a clock, every step (and the unload) waits one frame, so
/// swaps stay in flight across ticks. Clones share state.
#[derive(Clone)]
pub struct MockLoader {
    state: Rc<RefCell<MockState>>,
    clock: Option<Clock>,
}

impl Default for MockLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLoader {
    /// Loads complete without waiting for frames.
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(MockState {
                loaded: HashSet::new(),
                invalid: HashSet::new(),
                scripts: HashMap::new(),
                default_script: vec![0.5, 1.0],
                failing_loads: HashSet::new(),
                failing_unloads: HashSet::new(),
                hanging: HashSet::new(),
                activations: Vec::new(),
                load_calls: Vec::new(),
                unload_calls: Vec::new(),
                ceiling: 1.0,
            })),
            clock: None,
        }
    }

    /// Every step waits for the next frame of `clock`.
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            clock: Some(clock),
            ..Self::new()
        }
    }

    pub fn mark_loaded(&self, key: impl Into<SceneKey>) {
        self.state.borrow_mut().loaded.insert(key.into());
    }

    pub fn mark_invalid(&self, key: impl Into<SceneKey>) {
        self.state.borrow_mut().invalid.insert(key.into());
    }

    /// Progress values reported by loads of `key`.
    pub fn set_script(&self, key: impl Into<SceneKey>, steps: Vec<f32>) {
        self.state.borrow_mut().scripts.insert(key.into(), steps);
    }

    /// Progress values reported by keys without their own script.
    pub fn set_default_script(&self, steps: Vec<f32>) {
        self.state.borrow_mut().default_script = steps;
    }

    /// Loads of `key` report one step, then fail.
    pub fn fail_load(&self, key: impl Into<SceneKey>) {
        self.state.borrow_mut().failing_loads.insert(key.into());
    }

    pub fn fail_unload(&self, key: impl Into<SceneKey>) {
        self.state.borrow_mut().failing_unloads.insert(key.into());
    }

    /// Loads of `key` never complete.
    pub fn hang_load(&self, key: impl Into<SceneKey>) {
        self.state.borrow_mut().hanging.insert(key.into());
    }

    pub fn set_progress_ceiling(&self, ceiling: f32) {
        self.state.borrow_mut().ceiling = ceiling;
    }

    pub fn activations(&self) -> Vec<SceneKey> {
        self.state.borrow().activations.clone()
    }

    pub fn load_calls(&self) -> Vec<SceneKey> {
        self.state.borrow().load_calls.clone()
    }

    pub fn unload_calls(&self) -> Vec<SceneKey> {
        self.state.borrow().unload_calls.clone()
    }
}

impl SceneLoader for MockLoader {
    fn is_valid(&self, key: &SceneKey) -> bool {
        !self.state.borrow().invalid.contains(key)
    }

    fn is_loaded(&self, key: &SceneKey) -> bool {
        self.state.borrow().loaded.contains(key)
    }

    fn load(&self, key: &SceneKey) -> Result<ProgressStream, LoaderError> {
        let mut state = self.state.borrow_mut();
        state.load_calls.push(key.clone());
        if state.invalid.contains(key) {
            return Err(LoaderError::InvalidKey { key: key.clone() });
        }
        if state.hanging.contains(key) {
            return Ok(stream::pending().boxed_local());
        }

        let script = state
            .scripts
            .get(key)
            .cloned()
            .unwrap_or_else(|| state.default_script.clone());
        let plan: VecDeque<Step> = if state.failing_loads.contains(key) {
            let first = script.first().copied().unwrap_or(0.0);
            VecDeque::from([Step::Progress(first), Step::Fail])
        } else {
            script
                .into_iter()
                .map(Step::Progress)
                .chain(std::iter::once(Step::Finish))
                .collect()
        };
        drop(state);

        let shared = Rc::clone(&self.state);
        let clock = self.clock.clone();
        let key = key.clone();
        let stream = stream::unfold(plan, move |mut plan| {
            let shared = Rc::clone(&shared);
            let clock = clock.clone();
            let key = key.clone();
            async move {
                if let Some(clock) = &clock {
                    clock.next_frame().await;
                }
                match plan.pop_front()? {
                    Step::Progress(progress) => Some((Ok(progress), plan)),
                    Step::Fail => Some((
                        Err(LoaderError::Failed {
                            key,
                            operation: "load",
                            detail: "scripted failure".into(),
                        }),
                        plan,
                    )),
                    Step::Finish => {
                        shared.borrow_mut().loaded.insert(key);
                        None
                    }
                }
            }
        });
        Ok(stream.boxed_local())
    }

    fn unload(&self, key: &SceneKey) -> LocalBoxFuture<'static, Result<(), LoaderError>> {
        let fail = {
            let mut state = self.state.borrow_mut();
            state.unload_calls.push(key.clone());
            state.failing_unloads.contains(key)
        };
        let shared = Rc::clone(&self.state);
        let clock = self.clock.clone();
        let key = key.clone();
        async move {
            if let Some(clock) = &clock {
                clock.next_frame().await;
            }
            if fail {
                return Err(LoaderError::Failed {
                    key,
                    operation: "unload",
                    detail: "scripted failure".into(),
                });
            }
            shared.borrow_mut().loaded.remove(&key);
            Ok(())
        }
        .boxed_local()
    }

    fn activate(&self, key: &SceneKey) -> Result<(), LoaderError> {
        let mut state = self.state.borrow_mut();
        if !state.loaded.contains(key) {
            return Err(LoaderError::Failed {
                key: key.clone(),
                operation: "activate",
                detail: "scene is not loaded".into(),
            });
        }
        state.activations.push(key.clone());
        Ok(())
    }

    fn progress_ceiling(&self) -> f32 {
        self.state.borrow().ceiling
    }
}

// ===========================================================================
// Event recorder
// ===========================================================================

/// Records every event on a set of channels as a short label, in arrival
/// order: `"collection LoadEntered Game"`, `"scene LoadProgress level 0.5"`,
/// `"collection LoadProgress Game level 0.25"`.
pub struct EventRecorder {
    events: Rc<RefCell<Vec<String>>>,
    progress: Rc<RefCell<Vec<f32>>>,
    _subscriptions: SubscriptionSet,
}

impl EventRecorder {
    pub fn attach(channels: &EventChannels) -> Self {
        let events = Rc::new(RefCell::new(Vec::new()));
        let progress = Rc::new(RefCell::new(Vec::new()));
        let mut subscriptions = SubscriptionSet::new();

        {
            let events = Rc::clone(&events);
            let progress = Rc::clone(&progress);
            subscriptions.push(channels.collections().subscribe(move |event: &CollectionEvent| {
                let label = match event {
                    CollectionEvent::LoadProgress {
                        collection,
                        scene,
                        collection_progress,
                        ..
                    } => {
                        progress.borrow_mut().push(*collection_progress);
                        format!(
                            "collection LoadProgress {} {} {}",
                            collection.name(),
                            scene.name(),
                            collection_progress
                        )
                    }
                    other => format!("collection {:?} {}", other.kind(), other.collection().name()),
                };
                events.borrow_mut().push(label);
            }));
        }
        {
            let events = Rc::clone(&events);
            subscriptions.push(channels.scenes().subscribe(move |event: &SceneEvent| {
                let label = match event {
                    SceneEvent::LoadProgress { scene, progress } => {
                        format!("scene LoadProgress {} {}", scene.name(), progress)
                    }
                    other => format!("scene {:?} {}", other.kind(), other.scene().name()),
                };
                events.borrow_mut().push(label);
            }));
        }

        Self {
            events,
            progress,
            _subscriptions: subscriptions,
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }

    /// Recorded labels without progress events.
    pub fn lifecycle(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter(|label| !label.contains("LoadProgress"))
            .cloned()
            .collect()
    }

    pub fn first(&self) -> Option<String> {
        self.events.borrow().first().cloned()
    }

    pub fn last(&self) -> Option<String> {
        self.events.borrow().last().cloned()
    }

    /// How many recorded labels equal `label`.
    pub fn count(&self, label: &str) -> usize {
        self.events.borrow().iter().filter(|l| *l == label).count()
    }

    /// Collection-level progress values, in order.
    pub fn collection_progress(&self) -> Vec<f32> {
        self.progress.borrow().clone()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
        self.progress.borrow_mut().clear();
    }
}

// ===========================================================================
// Builders & drivers
// ===========================================================================

/// A scene keyed by `scenes/<name>.scene`.
pub fn scene(name: &str) -> Rc<Scene> {
    Rc::new(Scene::new(name, SceneKey::Path(format!("scenes/{name}.scene"))))
}

/// A collection of plain scenes built with [`scene`].
pub fn collection(name: &str, scenes: &[&str]) -> Rc<Collection> {
    let collection = scenes
        .iter()
        .fold(Collection::new(name), |collection, s| collection.with_scene(scene(s)));
    Rc::new(collection)
}

/// Tick until the controller has no swap in flight. Returns `false` if it
/// is still loading after `max_frames`.
pub fn drive(scheduler: &mut Scheduler, controller: &Controller, max_frames: u32) -> bool {
    scheduler.run_until_idle();
    for _ in 0..max_frames {
        if !controller.is_loading() {
            return true;
        }
        scheduler.tick(FRAME_SECONDS);
    }
    !controller.is_loading()
}
