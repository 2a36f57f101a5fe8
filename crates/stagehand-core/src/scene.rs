//! A single loadable scene.
//!
//! Scenes are thin: they own their key, two flags and an event handler, and
//! delegate the real work to the [`SceneLoader`]. An invalid key never fails a
//! scene operation; it is logged and the operation short-circuits.

use std::rc::Rc;

use futures::StreamExt;

use crate::error::SwapError;
use crate::event::SceneEvent;
use crate::handler::EventHandler;
use crate::id::SceneKey;
use crate::loader::SceneLoader;
use crate::progress::{MonotonicProgress, remap};

pub struct Scene {
    name: String,
    key: SceneKey,
    activate_on_load: bool,
    persist: bool,
    events: EventHandler<SceneEvent>,
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("activate_on_load", &self.activate_on_load)
            .field("persist", &self.persist)
            .finish()
    }
}

impl Scene {
    pub fn new(name: impl Into<String>, key: impl Into<SceneKey>) -> Self {
        let name = name.into();
        Self {
            events: EventHandler::new(format!("scene {name}")),
            name,
            key: key.into(),
            activate_on_load: false,
            persist: false,
        }
    }

    /// Activate this scene right after it loads.
    pub fn with_activate_on_load(mut self, activate_on_load: bool) -> Self {
        self.activate_on_load = activate_on_load;
        self
    }

    /// Never unload this scene during a swap.
    pub fn with_persist(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &SceneKey {
        &self.key
    }

    pub fn activate_on_load(&self) -> bool {
        self.activate_on_load
    }

    pub fn persist(&self) -> bool {
        self.persist
    }

    pub fn events(&self) -> &EventHandler<SceneEvent> {
        &self.events
    }

    pub fn is_valid(&self, loader: &dyn SceneLoader) -> bool {
        loader.is_valid(&self.key)
    }

    pub fn is_loaded(&self, loader: &dyn SceneLoader) -> bool {
        loader.is_loaded(&self.key)
    }

    /// Load the scene, reporting progress in `[0, 1]`.
    ///
    /// An already loaded or unresolvable scene reports `1.0` without
    /// touching the loader. A load always ends on a progress of `1.0`.
    /// `LoadExited` is raised unless the loader failed.
    pub async fn load(self: &Rc<Self>, loader: &dyn SceneLoader) -> Result<(), SwapError> {
        self.raise(SceneEvent::LoadEntered {
            scene: Rc::clone(self),
        });

        if !self.is_valid(loader) {
            log::warn!(
                "Scene \"{}\" ({}) cannot be resolved, load skipped",
                self.name,
                self.key
            );
            self.report_progress(1.0);
        } else if self.is_loaded(loader) {
            self.report_progress(1.0);
        } else {
            let mut stream = loader.load(&self.key).map_err(|source| self.failure(source))?;
            let ceiling = loader.progress_ceiling();
            let mut progress = MonotonicProgress::new();

            while let Some(raw) = stream.next().await {
                let raw = raw.map_err(|source| self.failure(source))?;
                self.report_progress(progress.observe(remap(raw, ceiling)));
            }
            if progress.needs_completion() {
                self.report_progress(1.0);
            }
        }

        self.raise(SceneEvent::LoadExited {
            scene: Rc::clone(self),
        });
        Ok(())
    }

    /// Unload the scene. A scene that is not loaded is left alone.
    pub async fn unload(self: &Rc<Self>, loader: &dyn SceneLoader) -> Result<(), SwapError> {
        self.raise(SceneEvent::UnloadEntered {
            scene: Rc::clone(self),
        });

        if !self.is_valid(loader) {
            log::warn!(
                "Scene \"{}\" ({}) cannot be resolved, unload skipped",
                self.name,
                self.key
            );
        } else if self.is_loaded(loader) {
            loader
                .unload(&self.key)
                .await
                .map_err(|source| self.failure(source))?;
        }

        self.raise(SceneEvent::UnloadExited {
            scene: Rc::clone(self),
        });
        Ok(())
    }

    /// Ask the loader to make this scene active. Never fails; problems are
    /// logged. The enter/exit pair is always raised. Returns whether the
    /// activation went through.
    pub fn activate(self: &Rc<Self>, loader: &dyn SceneLoader) -> bool {
        self.raise(SceneEvent::ActivateEntered {
            scene: Rc::clone(self),
        });

        let activated = if !self.is_valid(loader) {
            log::warn!(
                "Scene \"{}\" ({}) cannot be resolved, activation skipped",
                self.name,
                self.key
            );
            false
        } else if !self.is_loaded(loader) {
            log::warn!("Scene \"{}\" is not loaded, activation skipped", self.name);
            false
        } else {
            match loader.activate(&self.key) {
                Ok(()) => true,
                Err(err) => {
                    log::warn!("Scene \"{}\" could not be activated: {err}", self.name);
                    false
                }
            }
        };

        self.raise(SceneEvent::ActivateExited {
            scene: Rc::clone(self),
        });
        activated
    }

    fn report_progress(self: &Rc<Self>, progress: f32) {
        self.raise(SceneEvent::LoadProgress {
            scene: Rc::clone(self),
            progress,
        });
    }

    fn raise(&self, event: SceneEvent) {
        self.events.raise(&event);
    }

    fn failure(&self, source: crate::error::LoaderError) -> SwapError {
        SwapError::Loader {
            scene: self.name.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::schedule::Scheduler;
    use crate::test_utils::MockLoader;

    fn record(scene: &Rc<Scene>) -> Rc<RefCell<Vec<String>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = Rc::clone(&log);
        scene.events().on(move |event| l.borrow_mut().push(event.to_string()));
        log
    }

    fn run<T: 'static>(
        scheduler: &mut Scheduler,
        future: impl std::future::Future<Output = T> + 'static,
    ) -> T {
        scheduler
            .block_on_frames(future, 0.1, 100)
            .expect("future did not finish")
    }

    #[test]
    fn load_reports_progress_and_brackets() {
        let mut scheduler = Scheduler::new();
        let loader = Rc::new(MockLoader::new());
        loader.set_script("scenes/level.scene", vec![0.25, 0.5]);
        let scene = Rc::new(Scene::new("level", "scenes/level.scene"));
        let log = record(&scene);

        let (s, l) = (Rc::clone(&scene), Rc::clone(&loader));
        run(&mut scheduler, async move { s.load(l.as_ref()).await }).unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                "Scene Load Entered: level",
                "Scene Load Progress: level (25%)",
                "Scene Load Progress: level (50%)",
                "Scene Load Progress: level (100%)",
                "Scene Load Exited: level",
            ]
        );
        assert!(scene.is_loaded(loader.as_ref()));
    }

    #[test]
    fn loaded_scene_skips_loader() {
        let mut scheduler = Scheduler::new();
        let loader = Rc::new(MockLoader::new());
        loader.mark_loaded("scenes/level.scene");
        let scene = Rc::new(Scene::new("level", "scenes/level.scene"));
        let log = record(&scene);

        let (s, l) = (Rc::clone(&scene), Rc::clone(&loader));
        run(&mut scheduler, async move { s.load(l.as_ref()).await }).unwrap();

        assert!(loader.load_calls().is_empty());
        assert_eq!(log.borrow()[1], "Scene Load Progress: level (100%)");
        assert_eq!(log.borrow().len(), 3);
    }

    #[test]
    fn invalid_scene_is_non_fatal() {
        let mut scheduler = Scheduler::new();
        let loader = Rc::new(MockLoader::new());
        loader.mark_invalid("scenes/missing.scene");
        let scene = Rc::new(Scene::new("missing", "scenes/missing.scene"));

        let (s, l) = (Rc::clone(&scene), Rc::clone(&loader));
        let result = run(&mut scheduler, async move {
            s.load(l.as_ref()).await?;
            s.unload(l.as_ref()).await
        });

        assert!(result.is_ok());
        assert!(loader.load_calls().is_empty());
        assert!(loader.unload_calls().is_empty());
        assert!(!scene.activate(loader.as_ref()));
    }

    #[test]
    fn invalid_scene_closes_its_brackets() {
        let mut scheduler = Scheduler::new();
        let loader = Rc::new(MockLoader::new());
        loader.mark_invalid("scenes/missing.scene");
        let scene = Rc::new(Scene::new("missing", "scenes/missing.scene"));
        let log = record(&scene);

        let (s, l) = (Rc::clone(&scene), Rc::clone(&loader));
        run(&mut scheduler, async move {
            s.load(l.as_ref()).await?;
            s.unload(l.as_ref()).await
        })
        .unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                "Scene Load Entered: missing",
                "Scene Load Progress: missing (100%)",
                "Scene Load Exited: missing",
                "Scene Unload Entered: missing",
                "Scene Unload Exited: missing",
            ]
        );
    }

    #[test]
    fn progress_is_remapped_by_ceiling() {
        let mut scheduler = Scheduler::new();
        let loader = Rc::new(MockLoader::new());
        loader.set_progress_ceiling(0.5);
        loader.set_script("scenes/level.scene", vec![0.25, 0.1, 0.5]);
        let scene = Rc::new(Scene::new("level", "scenes/level.scene"));
        let log = record(&scene);

        let (s, l) = (Rc::clone(&scene), Rc::clone(&loader));
        run(&mut scheduler, async move { s.load(l.as_ref()).await }).unwrap();

        // 0.1 would step backwards and is held at 50%; the raw 0.5 is complete.
        assert_eq!(
            log.borrow()[1..4].to_vec(),
            vec![
                "Scene Load Progress: level (50%)",
                "Scene Load Progress: level (50%)",
                "Scene Load Progress: level (100%)",
            ]
        );
        assert_eq!(log.borrow().len(), 5);
    }

    #[test]
    fn failed_load_has_no_exit_event() {
        let mut scheduler = Scheduler::new();
        let loader = Rc::new(MockLoader::new());
        loader.fail_load("scenes/level.scene");
        let scene = Rc::new(Scene::new("level", "scenes/level.scene"));
        let log = record(&scene);

        let (s, l) = (Rc::clone(&scene), Rc::clone(&loader));
        let result = run(&mut scheduler, async move { s.load(l.as_ref()).await });

        assert!(matches!(result, Err(SwapError::Loader { ref scene, .. }) if scene == "level"));
        assert!(!log.borrow().iter().any(|line| line.contains("Exited")));
    }

    #[test]
    fn unload_of_unloaded_scene_is_noop() {
        let mut scheduler = Scheduler::new();
        let loader = Rc::new(MockLoader::new());
        let scene = Rc::new(Scene::new("level", "scenes/level.scene"));
        let log = record(&scene);

        let (s, l) = (Rc::clone(&scene), Rc::clone(&loader));
        run(&mut scheduler, async move { s.unload(l.as_ref()).await }).unwrap();

        assert!(loader.unload_calls().is_empty());
        assert_eq!(
            *log.borrow(),
            vec!["Scene Unload Entered: level", "Scene Unload Exited: level"]
        );
    }

    #[test]
    fn activate_always_brackets() {
        let loader = MockLoader::new();
        let scene = Rc::new(Scene::new("level", "scenes/level.scene"));
        let log = record(&scene);

        assert!(!scene.activate(&loader));
        loader.mark_loaded("scenes/level.scene");
        assert!(scene.activate(&loader));

        assert_eq!(log.borrow().len(), 4);
        assert_eq!(loader.activations(), vec![SceneKey::from("scenes/level.scene")]);
    }
}
