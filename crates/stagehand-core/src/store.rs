//! Persisted state collaborators.
//!
//! The controller never reaches for ambient global state to remember which
//! collection was selected; a [`SelectionStore`] is injected instead.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::StoreError;
use crate::id::CollectionId;

/// Remembers the selected collection across restarts.
pub trait SelectionStore {
    fn selected(&self) -> Option<CollectionId>;
    fn set_selected(&self, id: CollectionId) -> Result<(), StoreError>;
    fn clear_selected(&self) -> Result<(), StoreError>;
}

/// Per-collection key/value preferences (sort order, expanded state, ...).
pub trait PreferenceStore {
    fn get(&self, collection: CollectionId, key: &str) -> Option<String>;
    fn set(&self, collection: CollectionId, key: &str, value: String) -> Result<(), StoreError>;
    fn remove(&self, collection: CollectionId, key: &str) -> Result<(), StoreError>;
}

/// In-memory implementation of both stores.
#[derive(Debug, Default)]
pub struct MemorySelectionStore {
    selected: RefCell<Option<CollectionId>>,
    preferences: RefCell<HashMap<(CollectionId, String), String>>,
}

impl MemorySelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_selected(id: CollectionId) -> Self {
        let store = Self::default();
        *store.selected.borrow_mut() = Some(id);
        store
    }
}

impl SelectionStore for MemorySelectionStore {
    fn selected(&self) -> Option<CollectionId> {
        *self.selected.borrow()
    }

    fn set_selected(&self, id: CollectionId) -> Result<(), StoreError> {
        *self.selected.borrow_mut() = Some(id);
        Ok(())
    }

    fn clear_selected(&self) -> Result<(), StoreError> {
        *self.selected.borrow_mut() = None;
        Ok(())
    }
}

impl PreferenceStore for MemorySelectionStore {
    fn get(&self, collection: CollectionId, key: &str) -> Option<String> {
        self.preferences
            .borrow()
            .get(&(collection, key.to_string()))
            .cloned()
    }

    fn set(&self, collection: CollectionId, key: &str, value: String) -> Result<(), StoreError> {
        self.preferences
            .borrow_mut()
            .insert((collection, key.to_string()), value);
        Ok(())
    }

    fn remove(&self, collection: CollectionId, key: &str) -> Result<(), StoreError> {
        self.preferences
            .borrow_mut()
            .remove(&(collection, key.to_string()));
        Ok(())
    }
}
