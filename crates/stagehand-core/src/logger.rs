//! Opt-in logging of every event that passes through a set of channels.

use crate::bridge::EventChannels;
use crate::event::{CollectionEvent, CollectionEventKind, SceneEventKind};
use crate::handler::{HandlerEvent, SubscriptionSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggerOptions {
    /// Log progress events (one per loader step, so noisy).
    pub progress: bool,
    /// Log scene events in addition to collection events.
    pub scenes: bool,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            progress: true,
            scenes: true,
        }
    }
}

/// Logs events while alive. Dropping it detaches the listeners.
#[derive(Debug)]
pub struct EventLogger {
    _subscriptions: SubscriptionSet,
}

impl EventLogger {
    pub fn attach(channels: &EventChannels, options: LoggerOptions) -> Self {
        let mut subscriptions = SubscriptionSet::new();

        subscriptions.push(channels.collections().subscribe(move |event: &CollectionEvent| {
            match event.kind() {
                CollectionEventKind::LoadProgress if !options.progress => {}
                CollectionEventKind::LoadProgress => log::debug!("{event}"),
                _ => log::info!("{event}"),
            }
        }));

        if options.scenes {
            subscriptions.push(channels.scenes().subscribe(move |event| {
                if event.kind() != SceneEventKind::LoadProgress || options.progress {
                    log::debug!("{event}");
                }
            }));
        }

        Self {
            _subscriptions: subscriptions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logger_detaches_on_drop() {
        let channels = EventChannels::new("global");
        let logger = EventLogger::attach(&channels, LoggerOptions::default());
        assert_eq!(channels.listener_count(), 2);
        drop(logger);
        assert_eq!(channels.listener_count(), 0);
    }

    #[test]
    fn scene_logging_is_optional() {
        let channels = EventChannels::new("global");
        let _logger = EventLogger::attach(
            &channels,
            LoggerOptions {
                scenes: false,
                ..LoggerOptions::default()
            },
        );
        assert_eq!(channels.collections().listener_count(), 1);
        assert_eq!(channels.scenes().listener_count(), 0);
    }
}
