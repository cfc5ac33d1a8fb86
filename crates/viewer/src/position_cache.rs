//! In-memory per-session cache of position lookups (explorer statistics,
//! cloud evaluations).
//!
//! Keys are the exact position string, not the game, so a position reached
//! in two different games shares one entry. A miss starts exactly one fetch;
//! callers that ask for the same position while it is in flight await that
//! same fetch. Entries never expire and are only dropped wholesale by
//! [`PositionCache::clear`].

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;

use crate::error::FetchError;

type SharedFetch<V> = Shared<BoxFuture<'static, Result<Arc<V>, FetchError>>>;

/// A stored lookup result.
#[derive(Debug)]
pub struct CacheEntry<V> {
    pub value: Arc<V>,
    pub fetched_at: DateTime<Utc>,
}

impl<V> Clone for CacheEntry<V> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            fetched_at: self.fetched_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheStatus {
    Hit,
    Pending,
    Miss,
}

enum Slot<V> {
    Ready(CacheEntry<V>),
    Pending(SharedFetch<V>),
}

struct Inner<V> {
    /// Bumped on every clear so late fetches cannot repopulate a reset cache.
    generation: u64,
    entries: HashMap<String, Slot<V>>,
}

pub struct PositionCache<V> {
    name: &'static str,
    inner: Arc<Mutex<Inner<V>>>,
}

impl<V> Clone for PositionCache<V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: Send + Sync + 'static> PositionCache<V> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: Arc::new(Mutex::new(Inner {
                generation: 0,
                entries: HashMap::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a completed entry. Never triggers a fetch.
    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        self.entry(key).map(|e| e.value)
    }

    pub fn entry(&self, key: &str) -> Option<CacheEntry<V>> {
        match self.lock().entries.get(key) {
            Some(Slot::Ready(entry)) => Some(entry.clone()),
            _ => None,
        }
    }

    pub fn set(&self, key: impl Into<String>, value: V) {
        let entry = CacheEntry {
            value: Arc::new(value),
            fetched_at: Utc::now(),
        };
        self.lock().entries.insert(key.into(), Slot::Ready(entry));
    }

    pub fn status(&self, key: &str) -> CacheStatus {
        match self.lock().entries.get(key) {
            Some(Slot::Ready(_)) => CacheStatus::Hit,
            Some(Slot::Pending(_)) => CacheStatus::Pending,
            None => CacheStatus::Miss,
        }
    }

    /// Number of completed entries.
    pub fn len(&self) -> usize {
        self.lock()
            .entries
            .values()
            .filter(|slot| matches!(slot, Slot::Ready(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry, including in-flight ones.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.entries.clear();
        tracing::debug!(cache = self.name, generation = inner.generation, "Cache cleared");
    }

    /// Return the cached value for `key`, or run `fetch` once and store its
    /// result before returning it. Failures are not cached.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> Result<Arc<V>, FetchError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<V, FetchError>> + Send + 'static,
    {
        let (pending, generation) = {
            let mut inner = self.lock();
            let generation = inner.generation;
            match inner.entries.get(key) {
                Some(Slot::Ready(entry)) => {
                    tracing::trace!(cache = self.name, position = key, "Cache hit");
                    return Ok(Arc::clone(&entry.value));
                }
                Some(Slot::Pending(pending)) => {
                    tracing::debug!(cache = self.name, position = key, "Joining in-flight fetch");
                    (pending.clone(), generation)
                }
                None => {
                    tracing::debug!(cache = self.name, position = key, "Cache miss, fetching");
                    let fut = fetch(key.to_string());
                    let pending = async move { fut.await.map(Arc::new) }.boxed().shared();
                    inner
                        .entries
                        .insert(key.to_string(), Slot::Pending(pending.clone()));
                    (pending, generation)
                }
            }
        };

        let result = pending.clone().await;

        let mut inner = self.lock();
        let still_ours = inner.generation == generation
            && matches!(inner.entries.get(key), Some(Slot::Pending(p)) if p.ptr_eq(&pending));
        if still_ours {
            match &result {
                Ok(value) => {
                    let entry = CacheEntry {
                        value: Arc::clone(value),
                        fetched_at: Utc::now(),
                    };
                    inner.entries.insert(key.to_string(), Slot::Ready(entry));
                }
                Err(e) => {
                    tracing::warn!(cache = self.name, position = key, "Fetch failed: {e}");
                    inner.entries.remove(key);
                }
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    #[test]
    fn test_set_get_and_status() {
        let cache: PositionCache<u32> = PositionCache::new("test");
        assert_eq!(cache.status("a"), CacheStatus::Miss);
        cache.set("a", 1);
        assert_eq!(cache.get("a").as_deref(), Some(&1));
        assert_eq!(cache.status("a"), CacheStatus::Hit);
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);
    }

    #[tokio::test]
    async fn test_second_lookup_is_served_from_cache() {
        let cache: PositionCache<String> = PositionCache::new("test");
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            let value = cache
                .get_or_fetch("fen", move |key| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(format!("eval of {key}"))
                })
                .await
                .unwrap();
            assert_eq!(*value, "eval of fen");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_lookups_share_one_fetch() {
        let cache: PositionCache<u32> = PositionCache::new("test");
        let calls = Arc::new(AtomicUsize::new(0));
        let (release, gate) = oneshot::channel::<()>();
        let gate = gate.shared();

        let fetch = |calls: Arc<AtomicUsize>, gate: Shared<oneshot::Receiver<()>>| {
            move |_key: String| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                let _ = gate.await;
                Ok(7)
            }
        };

        let first = cache.get_or_fetch("fen", fetch(Arc::clone(&calls), gate.clone()));
        let second = cache.get_or_fetch("fen", fetch(Arc::clone(&calls), gate.clone()));
        let observe = async {
            tokio::task::yield_now().await;
            assert_eq!(cache.status("fen"), CacheStatus::Pending);
            release.send(()).unwrap();
        };

        let (a, b, ()) = tokio::join!(first, second, observe);
        assert_eq!(*a.unwrap(), 7);
        assert_eq!(*b.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.status("fen"), CacheStatus::Hit);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let cache: PositionCache<u32> = PositionCache::new("test");
        cache.set("other", 1);

        let err = cache
            .get_or_fetch("fen", |_| async { Err(FetchError::Status(503)) })
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::Status(503));
        assert_eq!(cache.status("fen"), CacheStatus::Miss);
        assert_eq!(cache.get("other").as_deref(), Some(&1));

        let value = cache.get_or_fetch("fen", |_| async { Ok(2) }).await.unwrap();
        assert_eq!(*value, 2);
    }

    #[tokio::test]
    async fn test_clear_discards_in_flight_result() {
        let cache: PositionCache<u32> = PositionCache::new("test");
        let (release, gate) = oneshot::channel::<()>();

        let lookup = cache.get_or_fetch("fen", move |_| async move {
            let _ = gate.await;
            Ok(5)
        });
        let reset = async {
            tokio::task::yield_now().await;
            cache.clear();
            release.send(()).unwrap();
        };

        let (value, ()) = tokio::join!(lookup, reset);
        assert_eq!(*value.unwrap(), 5);
        assert_eq!(cache.status("fen"), CacheStatus::Miss);
    }
}
