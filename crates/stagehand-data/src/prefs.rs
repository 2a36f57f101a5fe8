//! JSON-file backed persistence of the selected collection and of
//! per-collection preferences. Every change is written through to disk.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use stagehand_core::error::StoreError;
use stagehand_core::id::CollectionId;
use stagehand_core::store::{PreferenceStore, SelectionStore};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PreferenceFile {
    #[serde(default)]
    selected: Option<CollectionId>,
    /// Collection id -> key -> value.
    #[serde(default)]
    collections: BTreeMap<String, BTreeMap<String, String>>,
}

#[derive(Debug)]
pub struct JsonPreferenceStore {
    path: PathBuf,
    data: RefCell<PreferenceFile>,
}

impl JsonPreferenceStore {
    /// Open the store at `path`. A missing file starts empty and is created
    /// on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let data = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content).map_err(|e| StoreError::Serialization {
                detail: format!("{}: {e}", path.display()),
            })?
        } else {
            PreferenceFile::default()
        };
        Ok(Self {
            path,
            data: RefCell::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` and write it through. A failed write restores the
    /// previous contents, so memory never runs ahead of the file.
    fn update(&self, change: impl FnOnce(&mut PreferenceFile)) -> Result<(), StoreError> {
        let previous = self.data.borrow().clone();
        change(&mut *self.data.borrow_mut());
        self.save().inspect_err(|_| {
            *self.data.borrow_mut() = previous;
        })
    }

    fn save(&self) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(&*self.data.borrow()).map_err(|e| {
            StoreError::Serialization {
                detail: e.to_string(),
            }
        })?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl SelectionStore for JsonPreferenceStore {
    fn selected(&self) -> Option<CollectionId> {
        self.data.borrow().selected
    }

    fn set_selected(&self, id: CollectionId) -> Result<(), StoreError> {
        self.update(|data| data.selected = Some(id))
    }

    fn clear_selected(&self) -> Result<(), StoreError> {
        self.update(|data| data.selected = None)
    }
}

impl PreferenceStore for JsonPreferenceStore {
    fn get(&self, collection: CollectionId, key: &str) -> Option<String> {
        self.data
            .borrow()
            .collections
            .get(&collection.to_string())
            .and_then(|values| values.get(key))
            .cloned()
    }

    fn set(&self, collection: CollectionId, key: &str, value: String) -> Result<(), StoreError> {
        self.update(|data| {
            data.collections
                .entry(collection.to_string())
                .or_default()
                .insert(key.to_string(), value);
        })
    }

    fn remove(&self, collection: CollectionId, key: &str) -> Result<(), StoreError> {
        self.update(|data| {
            let id = collection.to_string();
            if let Some(values) = data.collections.get_mut(&id) {
                values.remove(key);
                if values.is_empty() {
                    data.collections.remove(&id);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs").join("scenes.json");
        let game = CollectionId::from_name("Game");

        {
            let store = JsonPreferenceStore::open(&path).unwrap();
            assert_eq!(store.selected(), None);
            store.set_selected(game).unwrap();
        }

        let store = JsonPreferenceStore::open(&path).unwrap();
        assert_eq!(store.selected(), Some(game));
        store.clear_selected().unwrap();
        assert_eq!(JsonPreferenceStore::open(&path).unwrap().selected(), None);
    }

    #[test]
    fn preferences_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenes.json");
        let menu = CollectionId::from_name("Menu");

        let store = JsonPreferenceStore::open(&path).unwrap();
        store.set(menu, "expanded", "true".into()).unwrap();
        store.set(menu, "sort", "name".into()).unwrap();
        store.remove(menu, "sort").unwrap();

        let store = JsonPreferenceStore::open(&path).unwrap();
        assert_eq!(store.get(menu, "expanded").as_deref(), Some("true"));
        assert_eq!(store.get(menu, "sort"), None);
    }

    #[test]
    fn failed_write_leaves_memory_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        let store = JsonPreferenceStore::open(blocker.join("scenes.json")).unwrap();
        let game = CollectionId::from_name("Game");

        assert!(matches!(store.set_selected(game), Err(StoreError::Io(_))));
        assert_eq!(store.selected(), None);

        assert!(store.set(game, "expanded", "true".into()).is_err());
        assert_eq!(store.get(game, "expanded"), None);
    }

    #[test]
    fn corrupt_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenes.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            JsonPreferenceStore::open(&path),
            Err(StoreError::Serialization { .. })
        ));
    }
}
