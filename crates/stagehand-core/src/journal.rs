//! Bounded history of raised events.
//!
//! The controller keeps one journal of the collection events it re-raises so
//! that tools can inspect the last swaps after the fact. When the journal is
//! full the oldest entry is dropped.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::handler::{EventHandler, HandlerEvent, Subscription};

/// A fixed-capacity ring of events, oldest first.
#[derive(Debug, Clone)]
pub struct EventJournal<E> {
    entries: VecDeque<E>,
    capacity: usize,
    total_written: u64,
    dropped: u64,
}

/// Journal shared between the recording listener and its readers.
pub type SharedJournal<E> = Rc<RefCell<EventJournal<E>>>;

impl<E> EventJournal<E> {
    /// A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            total_written: 0,
            dropped: 0,
        }
    }

    pub fn push(&mut self, event: E) {
        if self.entries.len() == self.capacity && self.entries.pop_front().is_some() {
            self.dropped += 1;
        }
        self.entries.push_back(event);
        self.total_written += 1;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total events written since creation, including dropped ones.
    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Events pushed out because the journal was full.
    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &E> + '_ {
        self.entries.iter()
    }

    /// Most recent entry.
    pub fn last(&self) -> Option<&E> {
        self.entries.back()
    }

    /// Remove all entries. The write counter is kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Record every event raised on `handler` into `journal` until the returned
/// token is dropped.
pub fn record_into<E: HandlerEvent>(handler: &EventHandler<E>, journal: &SharedJournal<E>) -> Subscription {
    let journal = Rc::downgrade(journal);
    handler.subscribe(move |event| {
        if let Some(journal) = journal.upgrade() {
            journal.borrow_mut().push(event.clone());
        }
    })
}
