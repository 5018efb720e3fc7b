//! In-memory, time-bounded result cache.
//!
//! Entries older than the TTL are never returned. Eviction is lazy: an expired
//! entry stays in the map until it is overwritten or [`TtlCache::purge_expired`]
//! runs. Nothing is persisted.

use log::{debug, info};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Default lifetime of geocoding results
pub const GEOCODE_TTL: Duration = Duration::from_secs(5 * 60);
/// Default lifetime of routing results
pub const ROUTE_TTL: Duration = Duration::from_secs(60);

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone, Debug)]
struct CacheEntry<T> {
    value: T,
    stored_at: Instant,
}

/// A cheaply cloneable handle to a shared TTL map.
#[derive(Clone, Debug)]
pub struct TtlCache<T> {
    entries: Arc<Mutex<HashMap<String, CacheEntry<T>>>>,
    ttl: Duration,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        TtlCache {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a fresh value. An entry aged `ttl` or more is a miss.
    pub fn get(&self, key: &str) -> Option<T> {
        let entries = lock(&self.entries);
        match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                debug!("cache hit for {}", key);
                Some(entry.value.clone())
            }
            Some(_) => {
                debug!("cache entry for {} expired", key);
                None
            }
            None => {
                debug!("cache miss for {}", key);
                None
            }
        }
    }

    pub fn set(&self, key: impl Into<String>, value: T) {
        let key = key.into();
        debug!("caching {} for {}s", key, self.ttl.as_secs());
        lock(&self.entries).insert(
            key,
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn clear(&self) {
        let mut entries = lock(&self.entries);
        let count = entries.len();
        entries.clear();
        info!("cache cleared, {} entries removed", count);
    }

    /// Drop expired entries, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut entries = lock(&self.entries);
        let before = entries.len();
        let ttl = self.ttl;
        entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
        before - entries.len()
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
