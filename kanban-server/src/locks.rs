//! Keyed async locks used to serialize read-then-write sequences.
//!
//! The memory store's transactions are atomic but not serializable, so the
//! engine takes one lock per column it touches (and the board directory one
//! per board) for the whole transaction. Locks for several keys are always
//! acquired in sorted order, so two requests can never wait on each other.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OwnedMutexGuard;

/// Registry of per-key async mutexes.
pub struct KeyedLocks<K> {
    entries: Arc<Mutex<HashMap<K, Arc<tokio::sync::Mutex<()>>>>>,
}

impl<K> Clone for KeyedLocks<K> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

/// Holds the locks for a set of keys; released on drop.
#[must_use = "locks are released as soon as the guard is dropped"]
pub struct KeyGuard<K> {
    keys: Vec<K>,
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl<K> KeyGuard<K> {
    /// Keys held by this guard, sorted.
    #[must_use]
    pub fn keys(&self) -> &[K] {
        &self.keys
    }
}

impl<K> KeyedLocks<K>
where
    K: Clone + Eq + Hash + Ord,
{
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the locks for every key (duplicates allowed) in sorted order.
    pub async fn acquire(&self, keys: &[&K]) -> KeyGuard<K> {
        let mut sorted: Vec<K> = keys.iter().map(|k| (*k).clone()).collect();
        sorted.sort();
        sorted.dedup();

        let mutexes: Vec<_> = {
            let mut entries = self.entries.lock();
            entries.retain(|_, m| Arc::strong_count(m) > 1);
            sorted
                .iter()
                .map(|k| Arc::clone(entries.entry(k.clone()).or_default()))
                .collect()
        };

        let mut guards = Vec::with_capacity(mutexes.len());
        for mutex in mutexes {
            guards.push(mutex.lock_owned().await);
        }

        KeyGuard {
            keys: sorted,
            _guards: guards,
        }
    }

    /// Number of keys currently tracked (held, awaited, or not yet pruned).
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.entries.lock().len()
    }
}
