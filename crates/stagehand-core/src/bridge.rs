//! Forwarding of collection and scene events into an outer set of channels.
//!
//! Forwarders hold only a weak handle to their sink, and are always wrapped
//! in a [`Subscription`], so a bridge installed for one operation disappears
//! with the token that owns it.

use crate::event::{CollectionEvent, CollectionEventKind, SceneEvent};
use crate::handler::{EventHandler, HandlerEvent, Subscription, SubscriptionSet};

/// The pair of handlers exposed by a collection and by the controller.
#[derive(Debug, Clone)]
pub struct EventChannels {
    collections: EventHandler<CollectionEvent>,
    scenes: EventHandler<SceneEvent>,
}

impl EventChannels {
    pub fn new(label: &str) -> Self {
        Self {
            collections: EventHandler::new(format!("{label} collections")),
            scenes: EventHandler::new(format!("{label} scenes")),
        }
    }

    pub fn collections(&self) -> &EventHandler<CollectionEvent> {
        &self.collections
    }

    pub fn scenes(&self) -> &EventHandler<SceneEvent> {
        &self.scenes
    }

    /// Total listeners across both handlers.
    pub fn listener_count(&self) -> usize {
        self.collections.listener_count() + self.scenes.listener_count()
    }
}

/// Re-raise events from `source` on `sink`. With `kinds`, only those kinds
/// are forwarded.
pub fn forward<E: HandlerEvent>(
    source: &EventHandler<E>,
    sink: &EventHandler<E>,
    kinds: Option<&'static [E::Kind]>,
) -> Subscription {
    let sink = sink.downgrade();
    source.subscribe(move |event| {
        if let Some(kinds) = kinds
            && !kinds.contains(&event.kind())
        {
            return;
        }
        if let Some(sink) = sink.upgrade() {
            sink.raise(event);
        }
    })
}

/// Which part of a collection's events a bridge carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeScope {
    /// Show/hide transition brackets only.
    Transition,
    /// Load/unload brackets and progress, plus every echoed scene event.
    Lifecycle,
}

/// Bridge `source` into `sink` for the given scope.
pub fn bridge(source: &EventChannels, sink: &EventChannels, scope: BridgeScope) -> SubscriptionSet {
    let mut set = SubscriptionSet::new();
    match scope {
        BridgeScope::Transition => {
            set.push(forward(
                &source.collections,
                &sink.collections,
                Some(&CollectionEventKind::TRANSITION),
            ));
        }
        BridgeScope::Lifecycle => {
            set.push(forward(
                &source.collections,
                &sink.collections,
                Some(&CollectionEventKind::LIFECYCLE),
            ));
            set.push(forward(&source.scenes, &sink.scenes, None));
        }
    }
    set
}
