//! Headless swap example: a frame loop driving the controller.
//!
//! Builds a `Menu` and a `Game` collection against the scripted mock
//! loader, loads the menu, swaps to the game through a fade, then reloads
//! it. Every global event is logged through `env_logger`.
//!
//! Run with: `RUST_LOG=info cargo run -p stagehand-core --example headless_swap --features test-utils`

use std::rc::Rc;

use stagehand_core::collection::Collection;
use stagehand_core::controller::Controller;
use stagehand_core::logger::{EventLogger, LoggerOptions};
use stagehand_core::scene::Scene;
use stagehand_core::schedule::Scheduler;
use stagehand_core::test_utils::{FRAME_SECONDS, MockLoader, scene};
use stagehand_core::transition::{FadeSettings, Transition};

/// Tick until the controller is idle, returning the frames it took.
fn run(scheduler: &mut Scheduler, controller: &Controller) -> u32 {
    let mut frames = 0;
    scheduler.run_until_idle();
    while controller.is_loading() && frames < 1_000 {
        scheduler.tick(FRAME_SECONDS);
        frames += 1;
    }
    frames
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut scheduler = Scheduler::new();
    let loader = Rc::new(MockLoader::with_clock(scheduler.clock().clone()));
    loader.set_default_script(vec![0.25, 0.5, 0.75, 1.0]);

    let controller = Controller::new(loader.clone(), &scheduler);
    let _logger = EventLogger::attach(
        controller.events(),
        LoggerOptions {
            progress: true,
            scenes: false,
        },
    );

    // --- Collections ---

    let menu = Rc::new(
        Collection::new("Menu")
            .with_scene(Rc::new(Scene::new("hud", "scenes/hud.scene").with_persist(true)))
            .with_scene(scene("menu")),
    );
    let curtain = Rc::new(Transition::fade(
        "curtain",
        FadeSettings {
            delay_seconds: 0.5,
            ..FadeSettings::default()
        },
    ));
    let game = Rc::new(
        Collection::new("Game")
            .with_scene(scene("level1"))
            .with_scene(Rc::new(
                Scene::new("level1_lighting", "scenes/level1_lighting.scene").with_activate_on_load(true),
            ))
            .with_transition(curtain),
    );

    // --- Swaps ---

    for (label, target) in [("menu", &menu), ("game", &game)] {
        if let Err(err) = controller.load_collection(target) {
            eprintln!("could not load {label}: {err}");
            return;
        }
        let frames = run(&mut scheduler, &controller);
        println!("{label} loaded after {frames} frames");
    }

    if let Err(err) = controller.reload() {
        eprintln!("could not reload: {err}");
        return;
    }
    let frames = run(&mut scheduler, &controller);
    println!("reload finished after {frames} frames");

    let loaded = controller.try_get_loaded().map(|c| c.name().to_string());
    println!("loaded: {}", loaded.as_deref().unwrap_or("<none>"));
    println!("activations: {:?}", loader.activations());
    println!(
        "journal: {} events recorded",
        controller.journal().borrow().total_written()
    );
}
