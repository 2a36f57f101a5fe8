//! Visual brackets around a collection swap.
//!
//! A transition has three phases that the controller always runs in order:
//! show (before anything unloads), delay (after the target has loaded) and
//! hide (last). [`TransitionKind::Instant`] makes every phase a no-op;
//! [`TransitionKind::Fade`] drives the alpha of registered [`FadeTarget`]s.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::event::TransitionEvent;
use crate::handler::EventHandler;
use crate::schedule::Clock;

// ---------------------------------------------------------------------------
// Easing
// ---------------------------------------------------------------------------

/// Easing curve applied to fade progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
}

impl Easing {
    /// Map linear progress in `[0, 1]` onto the curve.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => t * (2.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    let u = 1.0 - t;
                    1.0 - 2.0 * u * u
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Fade settings
// ---------------------------------------------------------------------------

/// Tunables of the fade variant. Alphas are in `[0, 1]`, times in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FadeSettings {
    /// Alpha when the curtain is fully shown.
    pub fade_in_alpha: f32,
    /// Alpha when the curtain is fully hidden.
    pub fade_out_alpha: f32,
    /// Settle time between the target loading and the hide phase.
    pub delay_seconds: f32,
    pub fade_in_seconds: f32,
    pub fade_out_seconds: f32,
    pub easing: Easing,
}

impl Default for FadeSettings {
    fn default() -> Self {
        Self {
            fade_in_alpha: 1.0,
            fade_out_alpha: 0.0,
            delay_seconds: 2.0,
            fade_in_seconds: 0.5,
            fade_out_seconds: 0.5,
            easing: Easing::Linear,
        }
    }
}

impl FadeSettings {
    /// Clamp alphas into `[0, 1]` and times to non-negative values.
    pub fn sanitized(self) -> Self {
        let alpha = |a: f32| if a.is_nan() { 0.0 } else { a.clamp(0.0, 1.0) };
        let seconds = |s: f32| if s.is_nan() { 0.0 } else { s.max(0.0) };
        Self {
            fade_in_alpha: alpha(self.fade_in_alpha),
            fade_out_alpha: alpha(self.fade_out_alpha),
            delay_seconds: seconds(self.delay_seconds),
            fade_in_seconds: seconds(self.fade_in_seconds),
            fade_out_seconds: seconds(self.fade_out_seconds),
            easing: self.easing,
        }
    }
}

/// Something a fade can draw on: a full-screen overlay or similar.
pub trait FadeTarget {
    /// Make the target visible before fading in.
    fn show(&self);
    /// Make the target invisible after fading out.
    fn hide(&self);
    fn set_alpha(&self, alpha: f32);
}

// ---------------------------------------------------------------------------
// Transition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransitionKind {
    /// Every phase completes immediately.
    Instant,
    Fade(FadeSettings),
}

pub struct Transition {
    name: String,
    kind: TransitionKind,
    targets: RefCell<Vec<Rc<dyn FadeTarget>>>,
    events: EventHandler<TransitionEvent>,
}

impl std::fmt::Debug for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transition")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("targets", &self.targets.borrow().len())
            .finish()
    }
}

/// Raises the exit event of a phase when dropped, so the exit is seen even
/// if the phase is abandoned half way.
struct PhaseGuard<'a> {
    events: &'a EventHandler<TransitionEvent>,
    exit: TransitionEvent,
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        self.events.raise(&self.exit);
    }
}

impl Transition {
    pub fn new(name: impl Into<String>, kind: TransitionKind) -> Self {
        let name = name.into();
        let kind = match kind {
            TransitionKind::Fade(settings) => TransitionKind::Fade(settings.sanitized()),
            TransitionKind::Instant => TransitionKind::Instant,
        };
        Self {
            events: EventHandler::new(format!("transition {name}")),
            name,
            kind,
            targets: RefCell::new(Vec::new()),
        }
    }

    pub fn instant(name: impl Into<String>) -> Self {
        Self::new(name, TransitionKind::Instant)
    }

    pub fn fade(name: impl Into<String>, settings: FadeSettings) -> Self {
        Self::new(name, TransitionKind::Fade(settings))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &TransitionKind {
        &self.kind
    }

    pub fn events(&self) -> &EventHandler<TransitionEvent> {
        &self.events
    }

    pub fn add_target(&self, target: Rc<dyn FadeTarget>) {
        self.targets.borrow_mut().push(target);
    }

    /// Returns `false` if the target was not registered.
    pub fn remove_target(&self, target: &Rc<dyn FadeTarget>) -> bool {
        let mut targets = self.targets.borrow_mut();
        let before = targets.len();
        targets.retain(|t| !Rc::ptr_eq(t, target));
        targets.len() != before
    }

    pub fn target_count(&self) -> usize {
        self.targets.borrow().len()
    }

    /// Bring the curtain up.
    pub async fn show(&self, clock: &Clock) {
        self.events.raise(&TransitionEvent::ShowEntered);
        let _exit = self.phase_exit(TransitionEvent::ShowExited);

        if let TransitionKind::Fade(settings) = self.kind {
            for target in self.snapshot() {
                target.show();
            }
            self.run_fade(
                clock,
                settings.fade_out_alpha,
                settings.fade_in_alpha,
                settings.fade_in_seconds,
                settings.easing,
            )
            .await;
        }
    }

    /// Let the loaded content settle before hiding.
    pub async fn delay(&self, clock: &Clock) {
        if let TransitionKind::Fade(settings) = self.kind
            && settings.delay_seconds > 0.0
        {
            clock.delay(settings.delay_seconds).await;
        }
    }

    /// Take the curtain down.
    pub async fn hide(&self, clock: &Clock) {
        self.events.raise(&TransitionEvent::HideEntered);
        let _exit = self.phase_exit(TransitionEvent::HideExited);

        if let TransitionKind::Fade(settings) = self.kind {
            self.run_fade(
                clock,
                settings.fade_in_alpha,
                settings.fade_out_alpha,
                settings.fade_out_seconds,
                settings.easing,
            )
            .await;
            for target in self.snapshot() {
                target.hide();
            }
        }
    }

    fn phase_exit(&self, exit: TransitionEvent) -> PhaseGuard<'_> {
        PhaseGuard {
            events: &self.events,
            exit,
        }
    }

    fn snapshot(&self) -> Vec<Rc<dyn FadeTarget>> {
        self.targets.borrow().clone()
    }

    fn set_alpha(&self, alpha: f32) {
        for target in self.snapshot() {
            target.set_alpha(alpha);
        }
    }

    async fn run_fade(&self, clock: &Clock, from: f32, to: f32, seconds: f32, easing: Easing) {
        if seconds > 0.0 {
            let start = clock.elapsed();
            loop {
                let t = ((clock.elapsed() - start) / f64::from(seconds)) as f32;
                if t >= 1.0 {
                    break;
                }
                self.set_alpha(from + (to - from) * easing.apply(t));
                clock.next_frame().await;
            }
        }
        self.set_alpha(to);
    }
}
