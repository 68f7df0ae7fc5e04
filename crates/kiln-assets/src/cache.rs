//! Per-type asset caches and the registry that sweeps them.

use std::sync::{Arc, Mutex, Weak};

use ahash::AHashMap;

use crate::address::Address;
use crate::error::LoadPromise;
use crate::registry::AssetKind;

/// Per-type cache mapping addresses to in-flight or settled load promises.
///
/// Storing the promise itself is what makes coalescing work: concurrent
/// requests for the same address observe the same in-flight load instead of
/// starting a duplicate pipeline. A settled rejection stays cached: a failed
/// load is remembered as "this failed" until the host evicts it and asks
/// again.
pub struct AssetCache<T> {
    kind: AssetKind,
    entries: Mutex<AHashMap<Address, LoadPromise<Arc<T>>>>,
}

impl<T: Send + Sync + 'static> AssetCache<T> {
    /// Create an empty cache for one asset kind.
    pub fn new(kind: AssetKind) -> Self {
        Self {
            kind,
            entries: Mutex::new(AHashMap::new()),
        }
    }

    /// The kind this cache stores.
    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    /// Look up the promise for an address, without triggering a load.
    pub fn get(&self, address: &Address) -> Option<LoadPromise<Arc<T>>> {
        self.entries
            .lock()
            .expect("asset cache poisoned")
            .get(address)
            .cloned()
    }

    /// Return the cached promise for an address, or register one and start
    /// the loader.
    ///
    /// For a given address at most one `loader` invocation is in flight at a
    /// time: the entry is registered before the loader runs, so concurrent
    /// callers join the same promise. The loader itself runs outside the
    /// cache lock and may recursively enter other caches.
    pub fn get_or_load(
        &self,
        address: &Address,
        loader: impl FnOnce() -> LoadPromise<Arc<T>>,
    ) -> LoadPromise<Arc<T>> {
        let gate = {
            let mut entries = self.entries.lock().expect("asset cache poisoned");
            if let Some(existing) = entries.get(address) {
                return existing.clone();
            }
            let gate = LoadPromise::pending();
            entries.insert(address.clone(), gate.clone());
            gate
        };

        let settle = gate.clone();
        loader().on_settle(move |result| match result {
            Ok(asset) => settle.fulfill(asset),
            Err(error) => settle.reject(error),
        });
        gate
    }

    /// Look up a fulfilled asset, never triggering or awaiting a load.
    pub fn find(&self, address: &Address) -> Option<Arc<T>> {
        let entries = self.entries.lock().expect("asset cache poisoned");
        entries.get(address).and_then(|promise| {
            promise.inspect(|state| match state {
                Some(Ok(asset)) => Some(Arc::clone(asset)),
                _ => None,
            })
        })
    }

    /// Remove the entry for an address, if any.
    pub fn evict(&self, address: &Address) -> bool {
        self.entries
            .lock()
            .expect("asset cache poisoned")
            .remove(address)
            .is_some()
    }

    /// Number of cached entries, including in-flight and failed loads.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("asset cache poisoned").len()
    }

    /// Check whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Type-erased cache operations used by the global eviction sweep.
pub trait CacheOps: Send + Sync {
    /// The kind the cache stores.
    fn kind(&self) -> AssetKind;

    /// Remove entries with no external owner; returns how many were removed.
    fn unload_unused(&self) -> usize;

    /// Number of cached entries.
    fn len(&self) -> usize;
}

impl<T: Send + Sync + 'static> CacheOps for AssetCache<T> {
    fn kind(&self) -> AssetKind {
        self.kind
    }

    fn unload_unused(&self) -> usize {
        let mut entries = self.entries.lock().expect("asset cache poisoned");
        let before = entries.len();
        entries.retain(|address, promise| {
            let keep = promise.inspect(|state| match state {
                // In-flight loads are never swept.
                None => true,
                // The cache's stored value is the single strong reference
                // when nothing outside holds the asset.
                Some(Ok(asset)) => Arc::strong_count(asset) > 1,
                // Cached failures are swept so the host can retry.
                Some(Err(_)) => false,
            });
            if !keep {
                tracing::debug!(kind = %self.kind, address = %address, "unloading unused asset");
            }
            keep
        });
        before - entries.len()
    }

    fn len(&self) -> usize {
        self.entries.lock().expect("asset cache poisoned").len()
    }
}

/// Registry of every live per-type cache, for bulk eviction.
///
/// Owned by the library rather than hidden in a global; caches register on
/// construction and drop out automatically when their owner releases them.
/// The sweep locks one cache at a time, so caches may be added concurrently
/// with a sweep in progress.
#[derive(Default)]
pub struct CacheRegistry {
    caches: Mutex<Vec<Weak<dyn CacheOps>>>,
}

impl CacheRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cache for future sweeps.
    pub fn register(&self, cache: Weak<dyn CacheOps>) {
        let mut caches = self.caches.lock().expect("cache registry poisoned");
        caches.retain(|entry| entry.strong_count() > 0);
        caches.push(cache);
    }

    fn snapshot(&self) -> Vec<Arc<dyn CacheOps>> {
        self.caches
            .lock()
            .expect("cache registry poisoned")
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }

    /// Sweep every registered cache, removing entries with no external
    /// owner. Returns the total number of entries removed.
    ///
    /// Runs to a fixpoint: evicting an asset can release its own
    /// dependencies, so passes repeat until a pass removes nothing.
    pub fn sweep(&self) -> usize {
        let caches = self.snapshot();
        let mut total = 0;
        loop {
            let removed: usize = caches.iter().map(|cache| cache.unload_unused()).sum();
            total += removed;
            if removed == 0 {
                break;
            }
        }
        total
    }

    /// Total number of entries across all registered caches.
    pub fn total_len(&self) -> usize {
        self.snapshot().iter().map(|cache| cache.len()).sum()
    }
}
