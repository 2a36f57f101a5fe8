//! Stagehand Core -- scene-collection swapping for interactive applications.
//!
//! This crate provides scenes, collections of scenes, optional visual
//! transitions, and a controller that swaps one loaded collection for
//! another while broadcasting lifecycle and progress events.
//!
//! # Swap Pipeline
//!
//! Each call to [`controller::Controller::load_collection`] runs one swap as
//! a cooperative task:
//!
//! 1. **Show** -- Run the target's show transition.
//! 2. **Unload** -- Unload the current collection, scene by scene, skipping
//!    persistent scenes.
//! 3. **Load** -- Load the target, scene by scene, aggregating progress.
//! 4. **Delay** -- Let the loaded scenes settle.
//! 5. **Hide** -- Run the target's hide transition.
//! 6. **Commit** -- Record the target as loaded.
//!
//! At most one swap is in flight. A failed swap commits nothing and never
//! leaves the controller busy.
//!
//! # Runtime
//!
//! Everything runs on a single thread. The host owns a
//! [`schedule::Scheduler`] and ticks it once per frame:
//!
//! ```rust,ignore
//! let mut scheduler = Scheduler::new();
//! let controller = Controller::new(loader, &scheduler);
//! controller.load_collection(&menu)?;
//! loop {
//!     scheduler.tick(frame_seconds);
//! }
//! ```
//!
//! # Key Types
//!
//! - [`controller::Controller`] -- Single-flight swap orchestrator.
//! - [`collection::Collection`] -- Ordered scenes plus an optional transition.
//! - [`scene::Scene`] -- One loadable unit, keyed for the external loader.
//! - [`transition::Transition`] -- Show/delay/hide brackets (instant or fade).
//! - [`loader::SceneLoader`] -- Contract of the host's resource loader.
//! - [`handler::EventHandler`] -- Listener registry with RAII subscriptions.
//! - [`bridge`] -- Scoped forwarding of events onto global channels.

pub mod bridge;
pub mod collection;
pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod handler;
pub mod id;
pub mod journal;
pub mod library;
pub mod loader;
pub mod logger;
pub mod progress;
pub mod scene;
pub mod schedule;
pub mod store;
pub mod transition;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
