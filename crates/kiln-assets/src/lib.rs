//! Kiln Assets
//!
//! The asynchronous asset pipeline: textual addresses in, cross-referenced,
//! reference-counted runtime objects out.
//!
//! A [`Library`] resolves an [`Address`] through a per-type cache; on a miss
//! it starts the type's promise pipeline (read bytes on a worker, parse and
//! schema-validate the declaration, recursively load nested references,
//! marshal onto the frame thread for backend object creation) and memoizes
//! the in-flight promise so concurrent requests coalesce. Eviction is
//! explicit: [`Library::unload_unused_assets`] sweeps every per-type cache
//! for entries nothing else owns.
//!
//! ```ignore
//! let library = Library::builder(DirSource::new("content"))
//!     .render_backend(renderer)
//!     .build();
//!
//! let sprite = library.load_asset_async::<SpriteAsset>("sprites/hero.json");
//!
//! // Once per frame, on the owning thread:
//! library.frame_tick();
//! ```

pub mod address;
pub mod backend;
pub mod cache;
pub mod collect;
pub mod error;
pub mod library;
pub mod registry;
pub mod schema;
pub mod types;
pub mod vfs;

pub use address::Address;
pub use backend::{AudioBackend, RenderBackend, ShaderHandle, SoundHandle, TextureHandle};
pub use cache::{AssetCache, CacheOps, CacheRegistry};
pub use collect::Dependency;
pub use error::{LoadError, LoadPromise, LoadResult};
pub use library::{Library, LibraryBuilder};
pub use registry::{AssetKind, KindRegistry, KindSpec};
pub use schema::{FieldType, Schema, SchemaField};
pub use types::{
    AssetType, AtlasAsset, BinaryAsset, ImageAsset, ImageData, JsonAsset, Region, ShaderAsset,
    SoundAsset, SpriteAsset, TextAsset, TextureAsset,
};
pub use vfs::{ContentSource, DirSource, MemorySource};
