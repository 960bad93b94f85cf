//! Time-to-live cache.
//!
//! Entries expire passively: a stale entry is dropped the next time its key
//! is read or written, never by a background sweep. There is no capacity
//! bound and no LRU ordering.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Keys for the memoized client operations. One variant per operation, so
/// equal arguments always produce equal keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    UserSearch { query: String },
    IssueDigest { issue_key: String },
}

struct Entry<V> {
    value: V,
    stored_at: Instant,
}

struct State<K, V> {
    entries: HashMap<K, Entry<V>>,
    /// Bumped by `invalidate`. A memoized computation only stores its result
    /// if the key's generation is unchanged since it started.
    generations: HashMap<K, u64>,
}

impl<K: Eq + Hash, V> State<K, V> {
    fn generation(&self, key: &K) -> u64 {
        self.generations.get(key).copied().unwrap_or(0)
    }
}

pub struct TtlCache<K, V> {
    ttl: Duration,
    state: Mutex<State<K, V>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: Mutex::new(State {
                entries: HashMap::new(),
                generations: HashMap::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<K, V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `value`, replacing whatever was there and restarting its clock.
    pub fn set(&self, key: K, value: V) {
        self.lock().entries.insert(
            key,
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Return the value if it is younger than the TTL. Reading does not
    /// refresh the timestamp. An expired entry is removed under the same
    /// lock that observed it.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut state = self.lock();
        let expired = match state.entries.get(key) {
            None => return None,
            Some(entry) => entry.stored_at.elapsed() > self.ttl,
        };
        if expired {
            state.entries.remove(key);
            return None;
        }
        state.entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&self, key: &K) {
        self.lock().entries.remove(key);
    }

    /// Remove the entry and discard any in-flight memoized result for it.
    pub fn invalidate(&self, key: &K) {
        let mut state = self.lock();
        state.entries.remove(key);
        *state.generations.entry(key.clone()).or_insert(0) += 1;
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    /// Number of stored entries, expired ones included until they are touched.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Memoize `compute` under `key`. On a miss the future runs without the
    /// lock held. A successful result is stored unless the key was
    /// invalidated while it ran; errors are never cached.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.get(&key) {
            tracing::debug!("cache hit");
            return Ok(hit);
        }
        let started = self.lock().generation(&key);
        let value = compute().await?;

        let mut state = self.lock();
        if state.generation(&key) == started {
            state.entries.insert(
                key,
                Entry {
                    value: value.clone(),
                    stored_at: Instant::now(),
                },
            );
        } else {
            tracing::debug!("invalidated during fetch, result not cached");
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn key(s: &str) -> CacheKey {
        CacheKey::UserSearch { query: s.into() }
    }

    #[test]
    fn set_then_get_returns_value() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set(key("hector"), "value1".to_string());
        assert_eq!(cache.get(&key("hector")), Some("value1".to_string()));
        assert!(cache.contains(&key("hector")));
    }

    #[test]
    fn missing_key_is_absent() {
        let cache: TtlCache<CacheKey, String> = TtlCache::new(Duration::from_secs(60));
        assert_eq!(cache.get(&key("nobody")), None);
        assert!(!cache.contains(&key("nobody")));
    }

    #[test]
    fn set_overwrites() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set(key("a"), 1);
        cache.set(key("a"), 2);
        assert_eq!(cache.get(&key("a")), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn entries_expire_and_are_purged_on_read() {
        let cache = TtlCache::new(Duration::from_millis(50));
        cache.set(key("a"), "value1");
        assert_eq!(cache.get(&key("a")), Some("value1"));

        std::thread::sleep(Duration::from_millis(120));

        // still physically present until touched
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&key("a")), None);
        assert_eq!(cache.len(), 0);
        assert!(!cache.contains(&key("a")));
    }

    #[test]
    fn reads_do_not_extend_lifetime() {
        let cache = TtlCache::new(Duration::from_millis(80));
        cache.set(key("a"), 1);
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(cache.get(&key("a")), Some(1));
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(cache.get(&key("a")), None);
    }

    #[test]
    fn clear_and_remove() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set(key("a"), 1);
        cache.set(key("b"), 2);
        cache.remove(&key("a"));
        assert_eq!(cache.get(&key("a")), None);
        assert_eq!(cache.get(&key("b")), Some(2));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn variants_do_not_collide() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set(CacheKey::UserSearch { query: "CRM-1".into() }, "user");
        cache.set(
            CacheKey::IssueDigest {
                issue_key: "CRM-1".into(),
            },
            "digest",
        );
        assert_eq!(
            cache.get(&CacheKey::UserSearch { query: "CRM-1".into() }),
            Some("user")
        );
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn memoized_call_runs_once_until_expiry() {
        let cache = TtlCache::new(Duration::from_millis(60));
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = calls.clone();
            let value: Result<u32, String> = cache
                .get_or_try_insert_with(key("a"), || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .await;
            assert_eq!(value.unwrap(), 7);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(120)).await;
        let calls2 = calls.clone();
        let _: Result<u32, String> = cache
            .get_or_try_insert_with(key("a"), || async move {
                calls2.fetch_add(1, Ordering::SeqCst);
                Ok(8)
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidation_during_fetch_discards_result() {
        let cache: TtlCache<CacheKey, u32> = TtlCache::new(Duration::from_secs(60));

        let value: Result<u32, String> = cache
            .get_or_try_insert_with(key("a"), || async {
                cache.invalidate(&key("a"));
                Ok(1)
            })
            .await;
        assert_eq!(value.unwrap(), 1);
        assert!(!cache.contains(&key("a")));

        // later fetches cache normally again
        let _: Result<u32, String> = cache
            .get_or_try_insert_with(key("a"), || async { Ok(2) })
            .await;
        assert_eq!(cache.get(&key("a")), Some(2));
    }

    #[tokio::test]
    async fn memoized_errors_are_not_stored() {
        let cache: TtlCache<CacheKey, u32> = TtlCache::new(Duration::from_secs(60));
        let result: Result<u32, &str> = cache
            .get_or_try_insert_with(key("a"), || async { Err("boom") })
            .await;
        assert!(result.is_err());
        assert!(!cache.contains(&key("a")));
    }
}
