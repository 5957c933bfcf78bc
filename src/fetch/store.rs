//! Append-only store for one fetched collection

/// Ordered, append-only container for the entries of one collection
///
/// Entries keep their arrival order. Nothing is ever removed for the
/// lifetime of a view instance.
#[derive(Debug, Clone)]
pub struct CollectionStore<T> {
    items: Vec<T>,
}

impl<T> Default for CollectionStore<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Clone> CollectionStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extend the store with `items`, preserving their order
    pub fn append(&mut self, items: impl IntoIterator<Item = T>) {
        self.items.extend(items);
    }

    /// Populate an empty store from previously captured contents.
    ///
    /// Returns `false` and leaves the store untouched if it already holds
    /// entries.
    pub fn restore(&mut self, items: Vec<T>) -> bool {
        if !self.items.is_empty() {
            return false;
        }
        self.items = items;
        true
    }

    /// Current contents in order
    pub fn snapshot(&self) -> Vec<T> {
        self.items.clone()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let mut store = CollectionStore::new();
        store.append(vec!["a", "b", "c"]);
        assert_eq!(store.snapshot(), vec!["a", "b", "c"]);

        store.append(vec!["d"]);
        assert_eq!(store.snapshot(), vec!["a", "b", "c", "d"]);
        assert_eq!(store.get(3), Some(&"d"));
    }

    #[test]
    fn test_empty_snapshot() {
        let store: CollectionStore<u32> = CollectionStore::new();
        assert!(store.is_empty());
        assert_eq!(store.snapshot(), Vec::<u32>::new());
    }

    #[test]
    fn test_restore_only_into_empty_store() {
        let mut store = CollectionStore::new();
        assert!(store.restore(vec![1, 2]));
        assert!(!store.restore(vec![9]));
        assert_eq!(store.snapshot(), vec![1, 2]);
        assert_eq!(store.len(), 2);
    }
}
