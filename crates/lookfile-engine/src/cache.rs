//! Process-wide cache of loaded rule sets
//!
//! Every object sharing a rule file should share one parsed copy. The cache
//! guarantees at most one load per key at a time: concurrent callers for a
//! key block until the first load finishes, then share its result. A failed
//! load is cached too, so an unreadable file is not retried until the next
//! flush.
//!
//! Flushing swaps in an empty generation. Readers holding an `Arc` from the
//! previous generation keep a valid snapshot.

use crate::config::{CacheConfig, LoadOptions};
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::fmt::Display;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

/// Identifies one loaded rule set: the file plus the options that shaped it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceKey {
    pub path: PathBuf,
    pub fingerprint: u64,
}

impl SourceKey {
    pub fn new(path: impl Into<PathBuf>, options: &LoadOptions) -> Self {
        Self {
            path: path.into(),
            fingerprint: options.fingerprint(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

type Slot<V> = Arc<OnceLock<Option<Arc<V>>>>;

struct Slots<K, V> {
    map: HashMap<K, Slot<V>>,
    /// Insertion order, oldest first, for eviction
    order: VecDeque<K>,
}

struct Generation<K, V> {
    slots: RwLock<Slots<K, V>>,
}

impl<K: Eq + Hash + Clone, V> Generation<K, V> {
    fn new() -> Self {
        Self {
            slots: RwLock::new(Slots {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    /// The slot for `key`, created (and the oldest evicted) if needed
    ///
    /// Hits only take the read lock. A miss re-checks under the write lock,
    /// since another caller may have inserted the key in between.
    fn slot(&self, key: &K, capacity: usize) -> Slot<V> {
        if let Some(slot) = self.get(key) {
            return slot;
        }

        let mut slots = self.slots.write();
        if let Some(slot) = slots.map.get(key) {
            return slot.clone();
        }

        while slots.map.len() >= capacity.max(1) {
            let Some(oldest) = slots.order.pop_front() else {
                break;
            };
            slots.map.remove(&oldest);
        }

        let slot: Slot<V> = Arc::new(OnceLock::new());
        slots.map.insert(key.clone(), slot.clone());
        slots.order.push_back(key.clone());
        slot
    }

    fn get(&self, key: &K) -> Option<Slot<V>> {
        self.slots.read().map.get(key).cloned()
    }

    fn len(&self) -> usize {
        self.slots.read().map.len()
    }
}

/// Keyed cache with per-key single loading and whole-cache flush
pub struct RuleCache<K, V> {
    config: CacheConfig,
    generation: RwLock<Arc<Generation<K, V>>>,
}

impl<K: Eq + Hash + Clone, V> RuleCache<K, V> {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            generation: RwLock::new(Arc::new(Generation::new())),
        }
    }

    /// Return the cached value for `key`, running `load` if it is absent
    ///
    /// `load` runs at most once per key per generation. Its failure is
    /// logged and cached as `None`.
    pub fn get_or_load<E, F>(&self, key: &K, load: F) -> Option<Arc<V>>
    where
        E: Display,
        F: FnOnce() -> Result<V, E>,
    {
        let generation = self.generation.read().clone();
        let slot = generation.slot(key, self.config.capacity);

        slot.get_or_init(|| match load() {
            Ok(value) => Some(Arc::new(value)),
            Err(e) => {
                tracing::warn!("Rule load failed: {}", e);
                None
            }
        })
        .clone()
    }

    /// The cached value for `key` if it has finished loading successfully
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let generation = self.generation.read().clone();
        generation.get(key)?.get()?.clone()
    }

    /// Drop every entry; in-flight loads finish into the discarded generation
    pub fn flush(&self) {
        *self.generation.write() = Arc::new(Generation::new());
        tracing::info!("Flushed rule cache");
    }

    pub fn config(&self) -> CacheConfig {
        self.config
    }

    /// Number of keys in the current generation, loaded or loading
    pub fn len(&self) -> usize {
        self.generation.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash + Clone, V> Default for RuleCache<K, V> {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
