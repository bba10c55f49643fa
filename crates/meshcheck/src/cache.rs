//! Expiring in-memory map backing the liveness registry.
//!
//! Entries carry an optional deadline. A read past the deadline misses
//! even if the background sweeper has not purged the entry yet, so
//! logical expiry never depends on sweep timing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;

struct Entry<V> {
    value: V,
    deadline: Option<Instant>,
}

impl<V> Entry<V> {
    fn expired(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| deadline <= now)
    }
}

/// String-keyed map with per-entry time-to-live.
pub struct ExpiringMap<V> {
    inner: Arc<Mutex<HashMap<String, Entry<V>>>>,
}

impl<V> Default for ExpiringMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> ExpiringMap<V> {
    pub fn new() -> Self {
        Self { inner: Arc::new(Mutex::new(HashMap::new())) }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry<V>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or overwrite an entry. `ttl = None` means the entry never
    /// expires.
    pub fn insert(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let deadline = ttl.map(|ttl| Instant::now() + ttl);
        self.lock().insert(key.into(), Entry { value, deadline });
    }

    pub fn remove(&self, key: &str) -> Option<V> {
        self.lock().remove(key).map(|entry| entry.value)
    }

    /// Count of live (non-expired) entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.lock().values().filter(|entry| !entry.expired(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry whose deadline has elapsed.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.lock().retain(|_, entry| !entry.expired(now));
    }
}

impl<V: Clone> ExpiringMap<V> {
    /// Fetch a live entry; logically expired entries read as absent.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let guard = self.lock();
        let entry = guard.get(key)?;
        if entry.expired(now) {
            None
        } else {
            Some(entry.value.clone())
        }
    }

    /// Snapshot of all live entries.
    pub fn entries(&self) -> HashMap<String, V> {
        let now = Instant::now();
        self.lock()
            .iter()
            .filter(|(_, entry)| !entry.expired(now))
            .map(|(key, entry)| (key.clone(), entry.value.clone()))
            .collect()
    }
}

impl<V: Send + 'static> ExpiringMap<V> {
    /// Spawn a background task purging expired entries at a fixed
    /// interval. The task holds only a weak handle and exits once the
    /// map is dropped.
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let weak: Weak<Mutex<HashMap<String, Entry<V>>>> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            let mut timer = tokio::time::interval(every);
            timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // the first tick completes immediately
            timer.tick().await;
            loop {
                timer.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let now = Instant::now();
                inner
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .retain(|_, entry| !entry.expired(now));
            }
        })
    }
}
