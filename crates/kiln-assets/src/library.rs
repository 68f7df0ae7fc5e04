//! The library orchestrator.

use std::any::{Any, TypeId};
use std::sync::{Arc, Mutex, Weak};
use std::thread;

use ahash::AHashMap;
use kiln_core::Deferrer;

use crate::address::Address;
use crate::backend::{AudioBackend, RenderBackend};
use crate::cache::{AssetCache, CacheOps, CacheRegistry};
use crate::collect::{self, Dependency};
use crate::error::{LoadError, LoadPromise, LoadResult};
use crate::registry::{AssetKind, KindRegistry};
use crate::types::AssetType;
use crate::vfs::ContentSource;

/// Configures and constructs a [`Library`].
pub struct LibraryBuilder {
    source: Arc<dyn ContentSource>,
    render: Option<Arc<dyn RenderBackend>>,
    audio: Option<Arc<dyn AudioBackend>>,
    worker_threads: Option<usize>,
}

impl LibraryBuilder {
    /// Start a builder over a content source.
    pub fn new(source: impl ContentSource) -> Self {
        Self::from_shared(Arc::new(source))
    }

    /// Start a builder over an already-shared content source.
    pub fn from_shared(source: Arc<dyn ContentSource>) -> Self {
        Self {
            source,
            render: None,
            audio: None,
            worker_threads: None,
        }
    }

    /// Attach the rendering backend used by texture and shader pipelines.
    pub fn render_backend(mut self, backend: impl RenderBackend) -> Self {
        self.render = Some(Arc::new(backend));
        self
    }

    /// Attach the audio backend used by sound pipelines.
    pub fn audio_backend(mut self, backend: impl AudioBackend) -> Self {
        self.audio = Some(Arc::new(backend));
        self
    }

    /// Override the background worker thread count.
    pub fn worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads);
        self
    }

    /// Build the library.
    pub fn build(self) -> Library {
        let deferrer = match self.worker_threads {
            Some(threads) => Deferrer::with_worker_threads(threads),
            None => Deferrer::new(),
        };
        tracing::debug!(source = %self.source.describe(), "library created");
        Library {
            inner: Arc::new(LibraryInner {
                source: self.source,
                deferrer,
                caches: Mutex::new(AHashMap::new()),
                registry: CacheRegistry::new(),
                kinds: KindRegistry::with_builtins(),
                render: self.render,
                audio: self.audio,
            }),
        }
    }
}

/// The entry point for all asset loading.
///
/// A library owns the root of one content tree plus the machinery to load
/// from it: the deferrer, the per-type caches, the cache registry used for
/// bulk eviction, and the kind registry the collector consults. Cloning a
/// library clones a handle to the same instance; pipelines clone it freely
/// to issue recursive loads from worker threads.
#[derive(Clone)]
pub struct Library {
    inner: Arc<LibraryInner>,
}

struct LibraryInner {
    source: Arc<dyn ContentSource>,
    deferrer: Deferrer,
    caches: Mutex<AHashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
    registry: CacheRegistry,
    kinds: KindRegistry,
    render: Option<Arc<dyn RenderBackend>>,
    audio: Option<Arc<dyn AudioBackend>>,
}

impl Library {
    /// Start building a library over a content source.
    pub fn builder(source: impl ContentSource) -> LibraryBuilder {
        LibraryBuilder::new(source)
    }

    /// Request an asset, returning a promise for its shared handle.
    ///
    /// A cached entry (in flight, fulfilled, or failed) is returned
    /// immediately; otherwise the type's load pipeline starts and its promise
    /// is memoized before this call returns, so concurrent requests for the
    /// same `(type, address)` always coalesce onto one load.
    pub fn load_asset_async<T: AssetType>(&self, address: impl Into<Address>) -> LoadPromise<Arc<T>> {
        let address = address.into();
        let cache = self.cache::<T>();
        let library = self.clone();
        let load_address = address.clone();
        cache.get_or_load(&address, move || {
            tracing::debug!(kind = %T::KIND, address = %load_address, "starting asset load");
            T::load_async(&library, &load_address)
        })
    }

    /// Request an asset and block until its pipeline settles.
    ///
    /// Pumps the frame-thread queue while waiting, so main-thread stages make
    /// progress. Only for contexts that can afford to block, typically the
    /// owning thread during startup or level changes.
    pub fn load_asset<T: AssetType>(&self, address: impl Into<Address>) -> LoadResult<Arc<T>> {
        let promise = self.load_asset_async::<T>(address);
        loop {
            if let Some(result) = promise.try_value() {
                return result;
            }
            if self.frame_tick() == 0 {
                thread::yield_now();
            }
        }
    }

    /// Look up an already-loaded asset, never triggering a load.
    pub fn find_asset<T: AssetType>(&self, address: impl Into<Address>) -> Option<Arc<T>> {
        self.try_cache::<T>()?.find(&address.into())
    }

    /// Load a nested reference from an asset's declaration.
    ///
    /// The reference resolves against the referring address; a failure is
    /// logged with both addresses and surfaces as a dependency error
    /// wrapping the underlying cause.
    pub fn load_dependency_async<T: AssetType>(
        &self,
        referring: &Address,
        reference: &str,
    ) -> LoadPromise<Arc<T>> {
        let dependency = referring.resolve(reference);
        let referring = referring.clone();
        self.load_asset_async::<T>(dependency.clone())
            .catch(move |err| {
                tracing::error!(
                    address = %referring,
                    dependency = %dependency,
                    error = %err,
                    "failed to load referenced asset"
                );
                Err(LoadError::DependencyNotFound {
                    address: referring,
                    dependency: format!("{} '{}'", T::KIND, dependency),
                    cause: Some(Box::new(err)),
                })
            })
    }

    /// Remove every cache entry whose asset has no external owner.
    ///
    /// Explicit, on-demand garbage collection; there is no timer-based
    /// eviction. Returns the number of entries removed.
    pub fn unload_unused_assets(&self) -> usize {
        let removed = self.inner.registry.sweep();
        if removed > 0 {
            tracing::debug!(removed, "swept unused assets");
        }
        removed
    }

    /// Total number of cache entries across all asset types.
    pub fn asset_count(&self) -> usize {
        self.inner.registry.total_len()
    }

    /// Statically collect the transitive dependencies of an asset.
    pub fn collect_dependencies(
        &self,
        kind: AssetKind,
        address: impl Into<Address>,
    ) -> LoadResult<Vec<Dependency>> {
        collect::collect_dependencies(self, kind, &address.into())
    }

    /// Pump main-thread pipeline stages; must be called regularly by the
    /// host loop. Returns the number of tasks executed.
    pub fn frame_tick(&self) -> usize {
        self.inner.deferrer.frame_tick()
    }

    /// The deferrer driving this library's pipelines.
    pub fn deferrer(&self) -> &Deferrer {
        &self.inner.deferrer
    }

    /// The content source this library reads from.
    pub fn content_source(&self) -> &Arc<dyn ContentSource> {
        &self.inner.source
    }

    /// The kind registry built at construction.
    pub fn kinds(&self) -> &KindRegistry {
        &self.inner.kinds
    }

    /// Read raw bytes on a worker thread.
    pub fn read_bytes_async(&self, address: &Address) -> LoadPromise<Vec<u8>> {
        let source = Arc::clone(&self.inner.source);
        let address = address.clone();
        self.inner.deferrer.do_in_worker_thread(move || {
            source.read(&address).map_err(|err| {
                tracing::error!(address = %address, error = %err, "failed to read asset bytes");
                err
            })
        })
    }

    /// Read and parse a JSON declaration on a worker thread, validating it
    /// against the kind's schema when one is registered.
    pub fn load_declaration_async(
        &self,
        kind: AssetKind,
        address: &Address,
    ) -> LoadPromise<serde_json::Value> {
        let library = self.clone();
        let address_for_parse = address.clone();
        self.read_bytes_async(address).then(move |bytes| {
            let document: serde_json::Value =
                serde_json::from_slice(&bytes).map_err(|err| {
                    let error = LoadError::Parse {
                        address: address_for_parse.clone(),
                        format: "json",
                        message: err.to_string(),
                    };
                    tracing::error!(address = %address_for_parse, error = %error, "failed to parse declaration");
                    error
                })?;
            if let Some(schema) = library.kinds().schema(kind) {
                schema.validate(&address_for_parse, &document)?;
            }
            Ok(document)
        })
    }

    pub(crate) fn render_backend(&self) -> Option<Arc<dyn RenderBackend>> {
        self.inner.render.clone()
    }

    pub(crate) fn audio_backend(&self) -> Option<Arc<dyn AudioBackend>> {
        self.inner.audio.clone()
    }

    /// Get or create the cache for an asset type, registering it for sweeps.
    fn cache<T: AssetType>(&self) -> Arc<AssetCache<T>> {
        let mut caches = self.inner.caches.lock().expect("library caches poisoned");
        let entry = caches.entry(TypeId::of::<T>()).or_insert_with(|| {
            let cache = Arc::new(AssetCache::<T>::new(T::KIND));
            let weak: Weak<AssetCache<T>> = Arc::downgrade(&cache);
            let ops: Weak<dyn CacheOps> = weak;
            self.inner.registry.register(ops);
            cache
        });
        entry
            .clone()
            .downcast::<AssetCache<T>>()
            .ok()
            .expect("asset cache type confusion")
    }

    fn try_cache<T: AssetType>(&self) -> Option<Arc<AssetCache<T>>> {
        let caches = self.inner.caches.lock().expect("library caches poisoned");
        caches.get(&TypeId::of::<T>()).map(|entry| {
            entry
                .clone()
                .downcast::<AssetCache<T>>()
                .ok()
                .expect("asset cache type confusion")
        })
    }
}
