//! Eviction Manager
//!
//! Keeps a bounded namespace within its entry cap by deleting the
//! oldest-inserted entries first.

use tracing::debug;

use crate::cache::CacheStore;

/// Deletes oldest-inserted entries until `namespace` holds at most
/// `max_entries`. Returns how many entries were removed.
///
/// The count is re-read on every pass, so concurrent writers are tolerated:
/// the loop simply runs until the bound holds at the moment it is checked.
pub async fn trim(store: &CacheStore, namespace: &str, max_entries: usize) -> usize {
    let mut evicted = 0;

    while store.len(namespace).await > max_entries {
        let Some(oldest) = store.oldest_key(namespace).await else {
            break;
        };
        if store.delete(namespace, &oldest).await {
            evicted += 1;
            debug!(namespace, key = %oldest, "evicted oldest entry");
        }
    }

    evicted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheEntry, CacheKey};
    use axum::http::{HeaderMap, StatusCode};
    use bytes::Bytes;
    use url::Url;

    fn key(i: usize) -> CacheKey {
        CacheKey::get(&Url::parse(&format!("https://tile.openstreetmap.org/5/{}/1.png", i)).unwrap())
    }

    fn entry(i: usize) -> CacheEntry {
        CacheEntry {
            key: key(i),
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::from(vec![0u8; 8]),
        }
    }

    async fn filled(count: usize) -> CacheStore {
        let store = CacheStore::new();
        for i in 0..count {
            store.put("tiles", entry(i)).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_trim_within_bound_is_noop() {
        let store = filled(3).await;

        assert_eq!(trim(&store, "tiles", 3).await, 0);
        assert_eq!(store.len("tiles").await, 3);
    }

    #[tokio::test]
    async fn test_trim_removes_oldest_first() {
        let store = filled(5).await;

        assert_eq!(trim(&store, "tiles", 2).await, 3);

        assert_eq!(store.list_keys("tiles").await, vec![key(3), key(4)]);
    }

    #[tokio::test]
    async fn test_trim_at_capacity_plus_one() {
        let store = filled(500).await;
        store.put("tiles", entry(500)).await.unwrap();

        assert_eq!(trim(&store, "tiles", 500).await, 1);

        assert_eq!(store.len("tiles").await, 500);
        assert!(store.get("tiles", &key(0)).await.is_none());
        assert!(store.get("tiles", &key(1)).await.is_some());
        assert!(store.get("tiles", &key(500)).await.is_some());
    }

    #[tokio::test]
    async fn test_trim_respects_replacement_order() {
        let store = filled(3).await;
        // Rewriting key 0 makes key 1 the oldest
        store.put("tiles", entry(0)).await.unwrap();

        trim(&store, "tiles", 2).await;

        assert_eq!(store.list_keys("tiles").await, vec![key(2), key(0)]);
    }

    #[tokio::test]
    async fn test_trim_to_zero_and_missing_namespace() {
        let store = filled(4).await;

        assert_eq!(trim(&store, "tiles", 0).await, 4);
        assert_eq!(store.len("tiles").await, 0);
        assert_eq!(trim(&store, "nothing-here", 0).await, 0);
    }
}
