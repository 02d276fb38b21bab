//! Per-run cache of FTP directory listings.
//!
//! Concurrent requests for the same directory share one in-flight listing:
//! the first caller lists, the others wait for its result. Failed listings are
//! not cached, so a later group may try again.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::OnceCell;

use super::Listing;
use crate::locator::ParentKey;

type Slot = Arc<OnceCell<Arc<Listing>>>;

/// Directory listings keyed by [`ParentKey`], scoped to one run.
#[derive(Debug, Default)]
pub struct DirectoryCache {
    slots: Mutex<HashMap<ParentKey, Slot>>,
}

impl DirectoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: &ParentKey) -> Slot {
        // A poisoned map still holds valid slots
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.entry(key.clone()).or_default().clone()
    }

    /// Returns the cached listing for `key`, running `list` if there is none yet.
    ///
    /// # Errors
    ///
    /// Propagates the error of `list`; nothing is cached in that case.
    pub async fn get_or_list<F, Fut, E>(&self, key: &ParentKey, list: F) -> Result<Arc<Listing>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Listing, E>>,
    {
        let slot = self.slot(key);
        slot.get_or_try_init(|| async move { list().await.map(Arc::new) })
            .await
            .cloned()
    }

    /// Listing already cached for `key`, if any.
    pub fn get(&self, key: &ParentKey) -> Option<Arc<Listing>> {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.get(key).and_then(|slot| slot.get().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn key(parent: &str) -> ParentKey {
        ParentKey {
            scheme: "ftp".into(),
            host: "ftp.example.com".into(),
            port: Some(21),
            username: None,
            parent: parent.into(),
        }
    }

    #[tokio::test]
    async fn test_concurrent_callers_list_once() {
        let cache = Arc::new(DirectoryCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_list(&key("/pub"), || async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                        Ok::<_, String>(Listing::default())
                    })
                    .await
            }));
        }
        for handle in handles {
            assert!(handle.await.expect("task").is_ok());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.get(&key("/pub")).is_some());
        assert!(cache.get(&key("/other")).is_none());
    }

    #[tokio::test]
    async fn test_failed_listing_is_not_cached() {
        let cache = DirectoryCache::new();

        let first = cache
            .get_or_list(&key("/pub"), || async { Err::<Listing, _>("550".to_string()) })
            .await;
        assert_eq!(first.err().as_deref(), Some("550"));
        assert!(cache.get(&key("/pub")).is_none());

        let second = cache
            .get_or_list(&key("/pub"), || async { Ok::<_, String>(Listing::default()) })
            .await;
        assert!(second.is_ok());
    }
}
