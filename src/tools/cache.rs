use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// In-memory key/value cache with a per-entry time to live.
///
/// Owned by whoever constructs it (one per tool client, typically keyed by
/// user id for access tokens). Nothing is shared process-wide and nothing
/// survives a restart.
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, Entry<V>>>,
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Live value for `key`; expired entries are dropped on read.
    pub fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.set_at(key, value, ttl, Instant::now());
    }

    pub fn remove(&self, key: &str) -> Option<V> {
        self.entries.lock().remove(key).map(|e| e.value)
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    /// Number of stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<V> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn set_at(&self, key: impl Into<String>, value: V, ttl: Duration, now: Instant) {
        self.entries.lock().insert(
            key.into(),
            Entry {
                value,
                expires_at: now + ttl,
            },
        );
    }

    fn purge_expired_at(&self, now: Instant) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, e| e.expires_at > now);
        before - entries.len()
    }
}
