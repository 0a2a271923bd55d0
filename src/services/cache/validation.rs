//! In-process TTL cache for credential validation verdicts.
//!
//! - Keyed on a SHA-256 digest of the credential pair; the raw key is never stored.
//! - One loader per key at a time (single-flight). Concurrent callers for the
//!   same key wait on the in-flight load instead of issuing their own.
//! - The map mutex only guards map mutation. Loads run outside of it.
//! - Expiry is checked on access. The map never holds more than `max_entries`
//!   slots: a new key at capacity sweeps expired and abandoned slots, then
//!   evicts the oldest verdict. When every slot is still loading, the new key
//!   is loaded without being cached.
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use sha2::{Digest, Sha256};
use tokio::sync::OnceCell;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    pub fn for_credential(app_id: &str, app_key: &str) -> Self {
        let mut hasher = Sha256::new();
        // Length prefix keeps ("ab", "c") and ("a", "bc") apart.
        hasher.update((app_id.len() as u64).to_be_bytes());
        hasher.update(app_id.as_bytes());
        hasher.update(app_key.as_bytes());
        Self(hasher.finalize().into())
    }
}

struct Entry<V> {
    value: V,
    stored_at: Instant,
}

struct Slot<V> {
    cell: OnceCell<Entry<V>>,
}

impl<V> Slot<V> {
    fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    // A pending slot is never expired: callers join the in-flight load.
    fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        self.cell
            .get()
            .is_some_and(|entry| now.duration_since(entry.stored_at) >= ttl)
    }
}

pub struct ValidationCache<V> {
    ttl: Duration,
    max_entries: usize,
    slots: Mutex<HashMap<CacheKey, Arc<Slot<V>>>>,
}

impl<V> std::fmt::Debug for ValidationCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationCache")
            .field("ttl", &self.ttl)
            .field("max_entries", &self.max_entries)
            .field("len", &self.len())
            .finish()
    }
}

impl<V: Clone> ValidationCache<V> {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached value for `key`, or run `load` to produce one.
    ///
    /// Values for which `keep` returns false are handed to every caller that
    /// joined the load, then dropped from the map so the next call reloads.
    pub async fn get_or_load<F, Fut, K>(&self, key: CacheKey, load: F, keep: K) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
        K: FnOnce(&V) -> bool,
    {
        if self.ttl.is_zero() {
            return load().await;
        }

        let Some(slot) = self.slot_for(key) else {
            return load().await;
        };

        let mut loaded_here = false;
        let entry = slot
            .cell
            .get_or_init(|| async {
                loaded_here = true;
                Entry {
                    value: load().await,
                    stored_at: Instant::now(),
                }
            })
            .await;

        if !loaded_here {
            tracing::debug!("credential verdict served from cache");
        } else if !keep(&entry.value) {
            self.remove_slot(&key, &slot);
        }

        entry.value.clone()
    }

    // None means the map is full of in-flight loads and the caller goes uncached.
    fn slot_for(&self, key: CacheKey) -> Option<Arc<Slot<V>>> {
        let now = Instant::now();
        let mut slots = self.lock();

        if let Some(slot) = slots.get(&key) {
            if !slot.is_expired(self.ttl, now) {
                return Some(Arc::clone(slot));
            }
            slots.remove(&key);
        }

        if slots.len() >= self.max_entries {
            Self::sweep(&mut slots, self.ttl, now);
        }
        if slots.len() >= self.max_entries && !Self::evict_oldest(&mut slots) {
            return None;
        }

        let slot = Arc::new(Slot::new());
        slots.insert(key, Arc::clone(&slot));
        Some(slot)
    }

    fn evict_oldest(slots: &mut HashMap<CacheKey, Arc<Slot<V>>>) -> bool {
        let oldest = slots
            .iter()
            .filter_map(|(key, slot)| slot.cell.get().map(|entry| (*key, entry.stored_at)))
            .min_by_key(|&(_, stored_at)| stored_at)
            .map(|(key, _)| key);

        match oldest {
            Some(key) => {
                slots.remove(&key);
                tracing::debug!("validation cache full, evicted oldest verdict");
                true
            }
            None => false,
        }
    }

    fn remove_slot(&self, key: &CacheKey, slot: &Arc<Slot<V>>) {
        let mut slots = self.lock();
        // Another caller may already have replaced the slot.
        if slots.get(key).is_some_and(|current| Arc::ptr_eq(current, slot)) {
            slots.remove(key);
        }
    }

    /// Drop expired entries and slots whose loader was cancelled with nobody waiting.
    pub fn purge_expired(&self) -> usize {
        let mut slots = self.lock();
        Self::sweep(&mut slots, self.ttl, Instant::now())
    }

    fn sweep(slots: &mut HashMap<CacheKey, Arc<Slot<V>>>, ttl: Duration, now: Instant) -> usize {
        let before = slots.len();
        slots.retain(|_, slot| match slot.cell.get() {
            Some(_) => !slot.is_expired(ttl, now),
            None => Arc::strong_count(slot) > 1,
        });
        let removed = before - slots.len();
        if removed > 0 {
            tracing::debug!(removed, "swept validation cache");
        }
        removed
    }
}

impl<V> ValidationCache<V> {
    pub fn invalidate(&self, key: &CacheKey) {
        self.lock().remove(key);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, Arc<Slot<V>>>> {
        // The map holds no invariants a panicking holder could break.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
