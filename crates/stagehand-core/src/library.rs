use std::collections::HashMap;
use std::rc::Rc;

use crate::collection::Collection;
use crate::id::CollectionId;

/// Every known collection, indexed by id, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct CollectionLibrary {
    by_id: HashMap<CollectionId, Rc<Collection>>,
    order: Vec<CollectionId>,
}

impl CollectionLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a collection, replacing any previous one with the same id.
    /// Returns the replaced collection.
    pub fn insert(&mut self, collection: Rc<Collection>) -> Option<Rc<Collection>> {
        let id = collection.id();
        let previous = self.by_id.insert(id, collection);
        if previous.is_none() {
            self.order.push(id);
        }
        previous
    }

    pub fn get(&self, id: CollectionId) -> Option<&Rc<Collection>> {
        self.by_id.get(&id)
    }

    /// First collection with the given display name.
    pub fn find_by_name(&self, name: &str) -> Option<&Rc<Collection>> {
        self.iter().find(|collection| collection.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<Collection>> + '_ {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }

    pub fn ids(&self) -> &[CollectionId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl FromIterator<Rc<Collection>> for CollectionLibrary {
    fn from_iter<I: IntoIterator<Item = Rc<Collection>>>(iter: I) -> Self {
        let mut library = Self::new();
        for collection in iter {
            library.insert(collection);
        }
        library
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_id_and_name() {
        let library: CollectionLibrary = ["Menu", "Game"]
            .into_iter()
            .map(|name| Rc::new(Collection::new(name)))
            .collect();

        assert_eq!(library.len(), 2);
        let game = library.find_by_name("Game").unwrap();
        assert_eq!(library.get(game.id()).unwrap().name(), "Game");
        assert!(library.find_by_name("Credits").is_none());
    }

    #[test]
    fn insertion_order_is_kept_on_replace() {
        let mut library = CollectionLibrary::new();
        library.insert(Rc::new(Collection::new("Menu")));
        library.insert(Rc::new(Collection::new("Game")));
        let replaced = library.insert(Rc::new(Collection::new("Menu")));

        assert!(replaced.is_some());
        let names: Vec<_> = library.iter().map(|c| c.name().to_string()).collect();
        assert_eq!(names, vec!["Menu", "Game"]);
    }
}
