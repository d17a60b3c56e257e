//! Insertion Order Module
//!
//! Tracks the order keys were written into a namespace. This is the only
//! signal the eviction manager uses.

use std::collections::VecDeque;

use crate::cache::CacheKey;

// == Insertion Order ==
/// Tracks write order for oldest-inserted-first eviction.
///
/// Keys are stored in a VecDeque where:
/// - Front = Oldest insertion
/// - Back = Newest insertion
///
/// Reads never reorder keys. Re-inserting an existing key moves it to the back.
#[derive(Debug, Default)]
pub struct InsertionOrder {
    order: VecDeque<CacheKey>,
}

impl InsertionOrder {
    // == Constructor ==
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Record Insert ==
    /// Marks a key as the newest insertion.
    ///
    /// If the key is already tracked it is removed first, so a replacement
    /// counts as a fresh insertion at the end of the order.
    pub fn record_insert(&mut self, key: &CacheKey) {
        self.remove(key);
        self.order.push_back(key.clone());
    }

    // == Remove ==
    /// Removes a key from the tracker.
    pub fn remove(&mut self, key: &CacheKey) {
        self.order.retain(|k| k != key);
    }

    // == Oldest ==
    /// Returns the oldest-inserted key without removing it.
    pub fn oldest(&self) -> Option<&CacheKey> {
        self.order.front()
    }

    /// Keys from oldest to newest.
    pub fn keys(&self) -> Vec<CacheKey> {
        self.order.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn key(path: &str) -> CacheKey {
        CacheKey::get(&Url::parse(&format!("https://tiles.test/{}", path)).unwrap())
    }

    #[test]
    fn test_order_new() {
        let order = InsertionOrder::new();
        assert!(order.is_empty());
        assert_eq!(order.len(), 0);
        assert!(order.oldest().is_none());
    }

    #[test]
    fn test_order_tracks_first_insert_as_oldest() {
        let mut order = InsertionOrder::new();

        order.record_insert(&key("a"));
        order.record_insert(&key("b"));
        order.record_insert(&key("c"));

        assert_eq!(order.len(), 3);
        assert_eq!(order.oldest(), Some(&key("a")));
        assert_eq!(order.keys(), vec![key("a"), key("b"), key("c")]);
    }

    #[test]
    fn test_reinsert_moves_to_back() {
        let mut order = InsertionOrder::new();

        order.record_insert(&key("a"));
        order.record_insert(&key("b"));
        order.record_insert(&key("c"));

        // Replacing "a" is a new insertion
        order.record_insert(&key("a"));

        assert_eq!(order.len(), 3);
        assert_eq!(order.oldest(), Some(&key("b")));
        assert_eq!(order.keys(), vec![key("b"), key("c"), key("a")]);
    }

    #[test]
    fn test_remove() {
        let mut order = InsertionOrder::new();

        order.record_insert(&key("a"));
        order.record_insert(&key("b"));
        order.record_insert(&key("c"));

        order.remove(&key("b"));

        assert_eq!(order.keys(), vec![key("a"), key("c")]);
    }

    #[test]
    fn test_remove_untracked_key_is_noop() {
        let mut order = InsertionOrder::new();
        order.record_insert(&key("a"));

        order.remove(&key("missing"));

        assert_eq!(order.len(), 1);
    }

    #[test]
    fn test_repeated_insert_of_same_key() {
        let mut order = InsertionOrder::new();

        order.record_insert(&key("a"));
        order.record_insert(&key("a"));
        order.record_insert(&key("a"));

        assert_eq!(order.len(), 1);
        assert_eq!(order.oldest(), Some(&key("a")));
    }

    #[test]
    fn test_clear() {
        let mut order = InsertionOrder::new();
        order.record_insert(&key("a"));
        order.record_insert(&key("b"));

        order.clear();

        assert!(order.is_empty());
    }
}
