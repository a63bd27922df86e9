//! Sparse store of loaded pages for one result set.
//!
//! Pages are keyed by zero-based index and may arrive out of order: a deep
//! link can populate page 7 before page 0 was ever requested. Nothing is
//! evicted; the whole cache is dropped on reset.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    index: usize,
    items: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(index: usize, items: Vec<T>) -> Self {
        Self { index, items }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct PageCache<T> {
    pages: BTreeMap<usize, Page<T>>,
    final_page: Option<usize>,
}

impl<T> Default for PageCache<T> {
    fn default() -> Self {
        Self {
            pages: BTreeMap::new(),
            final_page: None,
        }
    }
}

impl<T> PageCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, index: usize) -> Option<&Page<T>> {
        self.pages.get(&index)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.pages.contains_key(&index)
    }

    /// Stores a page. Pages are immutable once stored, so a second `put` for
    /// the same index is refused and returns `false`.
    ///
    /// The cache does not infer end-of-data from a short page; that is the
    /// caller's call via [`PageCache::mark_final`].
    pub fn put(&mut self, index: usize, items: Vec<T>) -> bool {
        if self.pages.contains_key(&index) {
            tracing::warn!(page = index, "refusing to overwrite a loaded page");
            return false;
        }
        self.pages.insert(index, Page::new(index, items));
        true
    }

    pub fn clear(&mut self) {
        self.pages.clear();
        self.final_page = None;
    }

    pub fn highest_loaded_page(&self) -> Option<usize> {
        self.pages.keys().next_back().copied()
    }

    pub fn final_page(&self) -> Option<usize> {
        self.final_page
    }

    /// Records `index` as the last page unless a smaller one is already known.
    /// Returns whether the marker changed.
    pub fn mark_final(&mut self, index: usize) -> bool {
        match self.final_page {
            Some(current) if current <= index => false,
            _ => {
                self.final_page = Some(index);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn loaded_item_count(&self) -> usize {
        self.pages.values().map(Page::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_pages_are_allowed() {
        let mut cache = PageCache::new();
        assert!(cache.put(3, vec![60, 61]));
        assert!(cache.get(0).is_none());
        assert_eq!(cache.get(3).map(Page::len), Some(2));
        assert_eq!(cache.highest_loaded_page(), Some(3));
    }

    #[test]
    fn pages_are_immutable_once_stored() {
        let mut cache = PageCache::new();
        assert!(cache.put(0, vec![1, 2, 3]));
        assert!(!cache.put(0, vec![9]));
        assert_eq!(cache.get(0).unwrap().items(), &[1, 2, 3]);
    }

    #[test]
    fn final_marker_keeps_smallest_index() {
        let mut cache: PageCache<u32> = PageCache::new();
        assert!(cache.mark_final(5));
        assert!(!cache.mark_final(7));
        assert!(cache.mark_final(2));
        assert_eq!(cache.final_page(), Some(2));
    }

    #[test]
    fn clear_drops_pages_and_marker() {
        let mut cache = PageCache::new();
        cache.put(0, vec![1]);
        cache.mark_final(0);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.final_page(), None);
        assert_eq!(cache.highest_loaded_page(), None);
    }

    #[test]
    fn counts_loaded_items() {
        let mut cache = PageCache::new();
        cache.put(0, vec![0; 20]);
        cache.put(4, vec![0; 7]);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.loaded_item_count(), 27);
    }
}
