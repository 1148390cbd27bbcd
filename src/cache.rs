//! Process-local TTL cache fronting all reads, with single-flight producer
//! collapsing.
//!
//! One lock guards the map; a per-key `Notify` is the wait primitive
//! concurrent misses block on, the shape `platform/session.rs` uses for its
//! shared mutable session state generalized to many keys instead of one.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::{Mutex, Notify};

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

enum Slot<V> {
    Ready(Entry<V>),
    /// A producer is in flight; waiters park on the `Notify` and re-check
    /// the map once woken.
    InFlight(Arc<Notify>),
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct CacheStats {
    pub entry_count: usize,
    pub hits: u64,
    pub misses: u64,
    pub last_sweep: Option<String>,
}

struct Inner<V> {
    map: HashMap<String, Slot<V>>,
    hits: u64,
    misses: u64,
    last_sweep: Option<Instant>,
}

/// A TTL-bounded cache with single-flight semantics per key.
///
/// `V` must be `Clone` since reads hand back an owned copy rather than a
/// guard, matching the value-not-reference shape `CachedEntry` names.
pub struct TtlCache<V: Clone + Send + 'static> {
    inner: Mutex<Inner<V>>,
    default_ttl: Duration,
}

impl<V: Clone + Send + 'static> TtlCache<V> {
    pub fn new(default_ttl: Duration) -> Self {
        TtlCache {
            inner: Mutex::new(Inner {
                map: HashMap::new(),
                hits: 0,
                misses: 0,
                last_sweep: None,
            }),
            default_ttl,
        }
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock().await;
        let now = Instant::now();
        let hit = match inner.map.get(key) {
            Some(Slot::Ready(entry)) if entry.expires_at > now => Some(entry.value.clone()),
            _ => None,
        };
        if hit.is_some() {
            inner.hits += 1;
        } else {
            inner.misses += 1;
            if matches!(inner.map.get(key), Some(Slot::Ready(entry)) if entry.expires_at <= now) {
                inner.map.remove(key);
            }
        }
        hit
    }

    pub async fn set(&self, key: impl Into<String>, value: V) {
        self.set_with_ttl(key, value, self.default_ttl).await;
    }

    pub async fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let mut inner = self.inner.lock().await;
        let key = key.into();
        let notify = match inner.map.remove(&key) {
            Some(Slot::InFlight(notify)) => Some(notify),
            _ => None,
        };
        inner.map.insert(
            key,
            Slot::Ready(Entry {
                value,
                expires_at: Instant::now() + ttl,
            }),
        );
        if let Some(notify) = notify {
            notify.notify_waiters();
        }
    }

    pub async fn delete(&self, key: &str) {
        let mut inner = self.inner.lock().await;
        inner.map.remove(key);
    }

    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        inner.map.clear();
    }

    pub async fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().await;
        CacheStats {
            entry_count: inner.map.len(),
            hits: inner.hits,
            misses: inner.misses,
            last_sweep: inner
                .last_sweep
                .map(|t| format!("{:?} ago", t.elapsed())),
        }
    }

    /// Removes expired entries. Returns the number of entries purged.
    pub async fn sweep(&self) -> usize {
        let mut inner = self.inner.lock().await;
        let now = Instant::now();
        let before = inner.map.len();
        inner
            .map
            .retain(|_, slot| !matches!(slot, Slot::Ready(entry) if entry.expires_at <= now));
        inner.last_sweep = Some(now);
        before - inner.map.len()
    }

    /// Guarantees that concurrent callers with the same key execute
    /// `producer` at most once; the rest block until the first completes,
    /// then observe the stored value. Producer errors are not cached.
    pub async fn get_or_compute<F, Fut, E>(&self, key: &str, ttl: Duration, producer: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        loop {
            let notify_to_wait_on = {
                let mut inner = self.inner.lock().await;
                let now = Instant::now();
                match inner.map.get(key) {
                    Some(Slot::Ready(entry)) if entry.expires_at > now => {
                        inner.hits += 1;
                        return Ok(match inner.map.get(key) {
                            Some(Slot::Ready(entry)) => entry.value.clone(),
                            _ => unreachable!(),
                        });
                    }
                    Some(Slot::InFlight(notify)) => Some(Arc::clone(notify)),
                    _ => {
                        inner.misses += 1;
                        inner
                            .map
                            .insert(key.to_string(), Slot::InFlight(Arc::new(Notify::new())));
                        None
                    }
                }
            };

            match notify_to_wait_on {
                Some(notify) => {
                    notify.notified().await;
                    continue;
                }
                None => {
                    let result = producer().await;
                    let mut inner = self.inner.lock().await;
                    let notify = match inner.map.remove(key) {
                        Some(Slot::InFlight(notify)) => notify,
                        other => {
                            // Another writer raced us via set_with_ttl; put it back.
                            if let Some(slot) = other {
                                inner.map.insert(key.to_string(), slot);
                            }
                            Arc::new(Notify::new())
                        }
                    };
                    match result {
                        Ok(value) => {
                            inner.map.insert(
                                key.to_string(),
                                Slot::Ready(Entry {
                                    value: value.clone(),
                                    expires_at: Instant::now() + ttl,
                                }),
                            );
                            drop(inner);
                            notify.notify_waiters();
                            return Ok(value);
                        }
                        Err(err) => {
                            // Leave the key absent so it remains a miss.
                            drop(inner);
                            notify.notify_waiters();
                            return Err(err);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration as StdDuration;

    #[tokio::test]
    async fn set_then_get_returns_value_within_ttl() {
        let cache: TtlCache<i32> = TtlCache::new(Duration::from_secs(30));
        cache.set_with_ttl("nodes", 42, Duration::from_millis(50)).await;
        assert_eq!(cache.get("nodes").await, Some(42));
        tokio::time::sleep(StdDuration::from_millis(80)).await;
        assert_eq!(cache.get("nodes").await, None);
    }

    #[tokio::test]
    async fn single_flight_collapses_concurrent_producers() {
        let cache = Arc::new(TtlCache::<i32>::new(Duration::from_secs(30)));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..5 {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_compute::<_, _, ()>("nodes", Duration::from_secs(30), || {
                        let calls = Arc::clone(&calls);
                        async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(StdDuration::from_millis(100)).await;
                            Ok(42)
                        }
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), Ok(42));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let again = cache
            .get_or_compute::<_, _, ()>("nodes", Duration::from_secs(30), || async { Ok(0) })
            .await;
        assert_eq!(again, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn producer_errors_are_not_cached() {
        let cache: TtlCache<i32> = TtlCache::new(Duration::from_secs(30));
        let result = cache
            .get_or_compute("flaky", Duration::from_secs(30), || async { Err::<i32, &str>("boom") })
            .await;
        assert_eq!(result, Err("boom"));
        assert_eq!(cache.get("flaky").await, None);
    }

    #[tokio::test]
    async fn sweep_purges_expired_entries() {
        let cache: TtlCache<i32> = TtlCache::new(Duration::from_secs(30));
        cache.set_with_ttl("a", 1, Duration::from_millis(10)).await;
        tokio::time::sleep(StdDuration::from_millis(30)).await;
        let purged = cache.sweep().await;
        assert_eq!(purged, 1);
        let stats = cache.stats().await;
        assert_eq!(stats.entry_count, 0);
    }
}
