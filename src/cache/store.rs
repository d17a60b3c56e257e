//! Cache Store Module
//!
//! Async, namespaced key-to-entry storage shared by every request task.
//! Each namespace pairs a HashMap of entries with its insertion order.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::cache::{CacheEntry, CacheKey, InsertionOrder};
use crate::error::{CacheError, Result};

// == Namespace ==
/// One isolated key-space.
#[derive(Debug, Default)]
struct Namespace {
    entries: HashMap<CacheKey, CacheEntry>,
    order: InsertionOrder,
    bytes: usize,
}

impl Namespace {
    fn remove(&mut self, key: &CacheKey) -> bool {
        match self.entries.remove(key) {
            Some(old) => {
                self.bytes = self.bytes.saturating_sub(old.size_bytes());
                self.order.remove(key);
                true
            }
            None => false,
        }
    }
}

// == Cache Store ==
/// Namespaced cache storage.
///
/// Namespaces are created lazily on first write and live until cleared.
/// `put` and `delete` each run under a single write lock, so readers never
/// observe a partially written entry. No operation spans several keys.
#[derive(Debug)]
pub struct CacheStore {
    namespaces: RwLock<HashMap<String, Namespace>>,
    /// Total bytes the store may hold across namespaces, None = unbounded
    quota_bytes: Option<usize>,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an unbounded store.
    pub fn new() -> Self {
        Self {
            namespaces: RwLock::new(HashMap::new()),
            quota_bytes: None,
        }
    }

    /// Creates a store that refuses writes once `quota_bytes` would be exceeded.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            namespaces: RwLock::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    // == Get ==
    /// Looks up an entry. No side effects.
    pub async fn get(&self, namespace: &str, key: &CacheKey) -> Option<CacheEntry> {
        let namespaces = self.namespaces.read().await;
        namespaces.get(namespace)?.entries.get(key).cloned()
    }

    // == Put ==
    /// Inserts or replaces an entry.
    ///
    /// A replacement is recorded as a new insertion at the end of the order.
    /// Fails with `StorageExhausted` when the quota would be exceeded; the
    /// previous entry for the key, if any, is kept in that case.
    pub async fn put(&self, namespace: &str, entry: CacheEntry) -> Result<()> {
        let mut namespaces = self.namespaces.write().await;

        if let Some(quota) = self.quota_bytes {
            let used: usize = namespaces.values().map(|ns| ns.bytes).sum();
            let replaced = namespaces
                .get(namespace)
                .and_then(|ns| ns.entries.get(&entry.key))
                .map(CacheEntry::size_bytes)
                .unwrap_or(0);
            let needed = entry.size_bytes();
            if used - replaced + needed > quota {
                return Err(CacheError::StorageExhausted(format!(
                    "{} needs {} bytes, {} of {} in use",
                    entry.key, needed, used, quota
                )));
            }
        }

        let ns = namespaces.entry(namespace.to_string()).or_default();
        let key = entry.key.clone();
        ns.remove(&key);
        ns.bytes += entry.size_bytes();
        ns.order.record_insert(&key);
        ns.entries.insert(key, entry);

        Ok(())
    }

    // == Delete ==
    /// Removes an entry. Returns whether something was removed.
    pub async fn delete(&self, namespace: &str, key: &CacheKey) -> bool {
        let mut namespaces = self.namespaces.write().await;
        namespaces
            .get_mut(namespace)
            .map(|ns| ns.remove(key))
            .unwrap_or(false)
    }

    // == List Keys ==
    /// Keys of a namespace from oldest to newest insertion.
    pub async fn list_keys(&self, namespace: &str) -> Vec<CacheKey> {
        let namespaces = self.namespaces.read().await;
        namespaces
            .get(namespace)
            .map(|ns| ns.order.keys())
            .unwrap_or_default()
    }

    // == Oldest Key ==
    /// The oldest-inserted key of a namespace.
    pub async fn oldest_key(&self, namespace: &str) -> Option<CacheKey> {
        let namespaces = self.namespaces.read().await;
        namespaces.get(namespace)?.order.oldest().cloned()
    }

    // == Length ==
    /// Number of entries in a namespace.
    pub async fn len(&self, namespace: &str) -> usize {
        let namespaces = self.namespaces.read().await;
        namespaces
            .get(namespace)
            .map(|ns| ns.entries.len())
            .unwrap_or(0)
    }

    /// Bytes held by a namespace.
    pub async fn size_bytes(&self, namespace: &str) -> usize {
        let namespaces = self.namespaces.read().await;
        namespaces.get(namespace).map(|ns| ns.bytes).unwrap_or(0)
    }

    // == Namespaces ==
    /// Names of every namespace that currently exists, sorted.
    pub async fn namespaces(&self) -> Vec<String> {
        let namespaces = self.namespaces.read().await;
        let mut names: Vec<String> = namespaces.keys().cloned().collect();
        names.sort();
        names
    }

    // == Delete Namespace ==
    /// Drops a namespace and all of its entries.
    pub async fn delete_namespace(&self, namespace: &str) -> bool {
        let mut namespaces = self.namespaces.write().await;
        namespaces.remove(namespace).is_some()
    }

    // == Clear ==
    /// Drops every namespace. Returns how many were removed.
    pub async fn clear(&self) -> usize {
        let mut namespaces = self.namespaces.write().await;
        let count = namespaces.len();
        namespaces.clear();
        count
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use bytes::Bytes;
    use url::Url;

    fn key(path: &str) -> CacheKey {
        CacheKey::get(&Url::parse(&format!("https://app.test/{}", path)).unwrap())
    }

    fn entry(path: &str, body: &str) -> CacheEntry {
        CacheEntry {
            key: key(path),
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    #[tokio::test]
    async fn test_store_new() {
        let store = CacheStore::new();
        assert_eq!(store.len("static").await, 0);
        assert!(store.namespaces().await.is_empty());
    }

    #[tokio::test]
    async fn test_store_put_and_get() {
        let store = CacheStore::new();

        store.put("static", entry("a", "alpha")).await.unwrap();
        let found = store.get("static", &key("a")).await.unwrap();

        assert_eq!(found.body, Bytes::from("alpha"));
        assert_eq!(store.len("static").await, 1);
    }

    #[tokio::test]
    async fn test_store_get_missing() {
        let store = CacheStore::new();
        store.put("static", entry("a", "alpha")).await.unwrap();

        assert!(store.get("static", &key("b")).await.is_none());
        assert!(store.get("api", &key("a")).await.is_none());
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated_and_lazy() {
        let store = CacheStore::new();

        store.put("tiles", entry("a", "tile")).await.unwrap();
        store.put("api", entry("a", "json")).await.unwrap();

        assert_eq!(store.namespaces().await, vec!["api", "tiles"]);
        assert_eq!(
            store.get("tiles", &key("a")).await.unwrap().body,
            Bytes::from("tile")
        );
        assert_eq!(
            store.get("api", &key("a")).await.unwrap().body,
            Bytes::from("json")
        );
    }

    #[tokio::test]
    async fn test_store_delete() {
        let store = CacheStore::new();

        store.put("static", entry("a", "alpha")).await.unwrap();
        assert!(store.delete("static", &key("a")).await);

        assert!(store.get("static", &key("a")).await.is_none());
        assert!(store.list_keys("static").await.is_empty());
        assert!(!store.delete("static", &key("a")).await);
        assert!(!store.delete("unknown", &key("a")).await);
    }

    #[tokio::test]
    async fn test_list_keys_in_insertion_order() {
        let store = CacheStore::new();

        store.put("tiles", entry("1", "x")).await.unwrap();
        store.put("tiles", entry("2", "x")).await.unwrap();
        store.put("tiles", entry("3", "x")).await.unwrap();

        // Reads do not reorder
        store.get("tiles", &key("1")).await.unwrap();

        assert_eq!(
            store.list_keys("tiles").await,
            vec![key("1"), key("2"), key("3")]
        );
        assert_eq!(store.oldest_key("tiles").await, Some(key("1")));
    }

    #[tokio::test]
    async fn test_replacement_moves_to_end() {
        let store = CacheStore::new();

        store.put("tiles", entry("1", "old")).await.unwrap();
        store.put("tiles", entry("2", "x")).await.unwrap();
        store.put("tiles", entry("1", "new")).await.unwrap();

        assert_eq!(store.len("tiles").await, 2);
        assert_eq!(store.list_keys("tiles").await, vec![key("2"), key("1")]);
        assert_eq!(
            store.get("tiles", &key("1")).await.unwrap().body,
            Bytes::from("new")
        );
    }

    #[tokio::test]
    async fn test_clear_drops_every_namespace() {
        let store = CacheStore::new();
        store.put("tiles", entry("1", "x")).await.unwrap();
        store.put("api", entry("2", "x")).await.unwrap();

        assert_eq!(store.clear().await, 2);

        assert!(store.get("tiles", &key("1")).await.is_none());
        assert!(store.get("api", &key("2")).await.is_none());
        assert!(store.namespaces().await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_namespace() {
        let store = CacheStore::new();
        store.put("tiles", entry("1", "x")).await.unwrap();
        store.put("api", entry("2", "x")).await.unwrap();

        assert!(store.delete_namespace("tiles").await);

        assert_eq!(store.namespaces().await, vec!["api"]);
        assert!(!store.delete_namespace("tiles").await);
    }

    #[tokio::test]
    async fn test_quota_rejects_oversized_put() {
        let small = entry("a", "x");
        let store = CacheStore::with_quota(small.size_bytes() + 4);

        store.put("static", small).await.unwrap();
        let result = store.put("static", entry("b", "yyyyyyyy")).await;

        assert!(matches!(result, Err(CacheError::StorageExhausted(_))));
        assert!(store.get("static", &key("a")).await.is_some());
        assert!(store.get("static", &key("b")).await.is_none());
    }

    #[tokio::test]
    async fn test_quota_accounts_for_replacement() {
        let first = entry("a", "12345678");
        let store = CacheStore::with_quota(first.size_bytes());

        store.put("static", first).await.unwrap();
        // Same key, same size: the old bytes are released first
        store.put("static", entry("a", "abcdefgh")).await.unwrap();

        assert_eq!(
            store.get("static", &key("a")).await.unwrap().body,
            Bytes::from("abcdefgh")
        );
    }

    #[tokio::test]
    async fn test_size_bytes_tracks_deletes() {
        let store = CacheStore::new();
        let e = entry("a", "hello");
        let size = e.size_bytes();

        store.put("static", e).await.unwrap();
        assert_eq!(store.size_bytes("static").await, size);

        store.delete("static", &key("a")).await;
        assert_eq!(store.size_bytes("static").await, 0);
    }
}
