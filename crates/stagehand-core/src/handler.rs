//! Listener registry with scoped, token-based subscriptions.
//!
//! An [`EventHandler`] is a cheap, clonable handle to a shared listener
//! registry. Events are delivered synchronously to every matching listener in
//! `(priority, insertion_order)` order.
//!
//! # Failure isolation
//!
//! A listener that panics is caught at the point of invocation, logged, and
//! delivery continues with the next listener. A listener is never re-entered:
//! if raising an event causes the same listener to be reached again, the
//! nested delivery to it is skipped with a warning.
//!
//! # Subscriptions
//!
//! [`EventHandler::on`] registers a listener permanently and returns its
//! [`ListenerId`]. [`EventHandler::subscribe`] returns a [`Subscription`]
//! token instead, which removes the listener when dropped. Tokens are how the
//! swap pipeline attaches temporary forwarding for exactly one operation.

use std::cell::RefCell;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::{Rc, Weak};

use slotmap::SlotMap;

use crate::id::ListenerId;

// ---------------------------------------------------------------------------
// Event trait
// ---------------------------------------------------------------------------

/// An event that can be delivered through an [`EventHandler`].
pub trait HandlerEvent: Clone + std::fmt::Debug + 'static {
    /// Discriminant used for kind-based filtering.
    type Kind: Copy + Eq + std::fmt::Debug + 'static;

    /// Get the discriminant kind for this event.
    fn kind(&self) -> Self::Kind;
}

// ---------------------------------------------------------------------------
// Listeners, priorities & filters
// ---------------------------------------------------------------------------

/// A listener receives events read-only.
pub type Listener<E> = Box<dyn FnMut(&E)>;

/// Optional predicate that filters events for a listener.
pub type EventFilter<E> = Rc<dyn Fn(&E) -> bool>;

/// Priority level for listeners. Lower priorities run first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SubscriberPriority {
    Pre = 0,
    Normal = 1,
    Post = 2,
}

struct SubscriberEntry<E> {
    listener: Rc<RefCell<Listener<E>>>,
    priority: SubscriberPriority,
    filter: Option<EventFilter<E>>,
    insertion_order: u64,
}

struct Registry<E> {
    label: String,
    entries: SlotMap<ListenerId, SubscriberEntry<E>>,
    next_insertion_order: u64,
    total_raised: u64,
}

// ---------------------------------------------------------------------------
// EventHandler
// ---------------------------------------------------------------------------

/// Shared registry of listeners for one event type.
///
/// Cloning the handler clones the handle, not the registry: all clones
/// deliver to the same listeners.
pub struct EventHandler<E: HandlerEvent> {
    inner: Rc<RefCell<Registry<E>>>,
}

impl<E: HandlerEvent> Clone for EventHandler<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E: HandlerEvent> std::fmt::Debug for EventHandler<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.inner.borrow();
        f.debug_struct("EventHandler")
            .field("label", &registry.label)
            .field("listeners", &registry.entries.len())
            .field("total_raised", &registry.total_raised)
            .finish()
    }
}

impl<E: HandlerEvent> EventHandler<E> {
    /// Create an empty handler. The label prefixes log messages.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Registry {
                label: label.into(),
                entries: SlotMap::with_key(),
                next_insertion_order: 0,
                total_raised: 0,
            })),
        }
    }

    /// The label given at construction.
    pub fn label(&self) -> String {
        self.inner.borrow().label.clone()
    }

    /// Register a listener for every event with Normal priority.
    pub fn on(&self, listener: impl FnMut(&E) + 'static) -> ListenerId {
        self.on_filtered(SubscriberPriority::Normal, None, Box::new(listener))
    }

    /// Register a listener for a single event kind with Normal priority.
    pub fn on_kind(&self, kind: E::Kind, listener: impl FnMut(&E) + 'static) -> ListenerId {
        let filter: EventFilter<E> = Rc::new(move |event: &E| event.kind() == kind);
        self.on_filtered(SubscriberPriority::Normal, Some(filter), Box::new(listener))
    }

    /// Register a listener with explicit priority and optional filter.
    pub fn on_filtered(
        &self,
        priority: SubscriberPriority,
        filter: Option<EventFilter<E>>,
        listener: Listener<E>,
    ) -> ListenerId {
        let mut registry = self.inner.borrow_mut();
        let order = registry.next_insertion_order;
        registry.next_insertion_order += 1;
        registry.entries.insert(SubscriberEntry {
            listener: Rc::new(RefCell::new(listener)),
            priority,
            filter,
            insertion_order: order,
        })
    }

    /// Remove a listener. Returns `false` if it was already removed.
    pub fn remove(&self, id: ListenerId) -> bool {
        self.inner.borrow_mut().entries.remove(id).is_some()
    }

    /// Register a listener for every event; it is removed when the returned
    /// token is dropped.
    pub fn subscribe(&self, listener: impl FnMut(&E) + 'static) -> Subscription {
        let id = self.on(listener);
        self.scoped(id)
    }

    /// Register a listener for one kind; it is removed when the returned
    /// token is dropped.
    pub fn subscribe_kind(&self, kind: E::Kind, listener: impl FnMut(&E) + 'static) -> Subscription {
        let id = self.on_kind(kind, listener);
        self.scoped(id)
    }

    /// Wrap an already registered listener into a token that removes it on drop.
    pub fn scoped(&self, id: ListenerId) -> Subscription {
        let registry = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry.borrow_mut().entries.remove(id);
            }
        })
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    /// Total events raised on this handler since creation.
    pub fn total_raised(&self) -> u64 {
        self.inner.borrow().total_raised
    }

    /// A non-owning handle, used by forwarders so that a sink is not kept
    /// alive by the sources that feed it.
    pub fn downgrade(&self) -> WeakEventHandler<E> {
        WeakEventHandler {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Deliver an event to all matching listeners.
    ///
    /// The registry is not borrowed while listeners run, so listeners may
    /// register, remove, or raise freely.
    pub fn raise(&self, event: &E) {
        let (label, mut snapshot) = {
            let mut registry = self.inner.borrow_mut();
            registry.total_raised += 1;
            let snapshot: Vec<_> = registry
                .entries
                .values()
                .map(|entry| {
                    (
                        entry.priority,
                        entry.insertion_order,
                        entry.filter.clone(),
                        Rc::clone(&entry.listener),
                    )
                })
                .collect();
            (registry.label.clone(), snapshot)
        };

        snapshot.sort_by_key(|(priority, order, _, _)| (*priority, *order));

        for (_, _, filter, listener) in snapshot {
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                if let Some(filter) = &filter
                    && !filter(event)
                {
                    return;
                }
                match listener.try_borrow_mut() {
                    Ok(mut listener) => (*listener)(event),
                    Err(_) => log::warn!(
                        "{label}: listener re-entered while handling {:?}, skipping",
                        event.kind()
                    ),
                }
            }));

            if outcome.is_err() {
                log::error!(
                    "{label}: listener panicked while handling {:?}",
                    event.kind()
                );
            }
        }
    }
}

/// Non-owning counterpart of [`EventHandler`].
pub struct WeakEventHandler<E: HandlerEvent> {
    inner: Weak<RefCell<Registry<E>>>,
}

impl<E: HandlerEvent> Clone for WeakEventHandler<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<E: HandlerEvent> WeakEventHandler<E> {
    /// Upgrade to a strong handle if the handler is still alive.
    pub fn upgrade(&self) -> Option<EventHandler<E>> {
        self.inner.upgrade().map(|inner| EventHandler { inner })
    }
}

// ---------------------------------------------------------------------------
// Subscription tokens
// ---------------------------------------------------------------------------

/// Unsubscribe token. Dropping it detaches whatever it guards.
#[must_use = "dropping a Subscription detaches its listener immediately"]
pub struct Subscription {
    detach: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Create a token that runs `detach` exactly once, on drop or on [`Self::detach`].
    pub fn new(detach: impl FnOnce() + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// Detach now.
    pub fn detach(self) {
        drop(self);
    }

    /// Keep the listener registered for the lifetime of its handler.
    pub fn forget(mut self) {
        self.detach = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("attached", &self.detach.is_some())
            .finish()
    }
}

/// A group of subscriptions released together.
#[must_use = "dropping a SubscriptionSet detaches all of its listeners immediately"]
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    /// Move every subscription of `other` into this set.
    pub fn append(&mut self, mut other: SubscriptionSet) {
        self.subscriptions.append(&mut other.subscriptions);
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Detach everything now.
    pub fn detach_all(&mut self) {
        self.subscriptions.clear();
    }
}

// ===========================================================================
// Tests
// ===========================================================================
