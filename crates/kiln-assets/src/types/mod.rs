//! Concrete asset types and their load pipelines.
//!
//! Every asset wraps an immutable content value, is handed out behind `Arc`,
//! and is produced by a type-specific [`load_async`] pipeline chained out of
//! deferrer-scheduled steps. Nothing mutates content after its pipeline
//! fulfills, which is what makes sharing across threads safe without
//! per-object locking.
//!
//! [`load_async`]: AssetType::load_async

use std::sync::Arc;

use crate::address::Address;
use crate::error::LoadPromise;
use crate::library::Library;
use crate::registry::AssetKind;

pub mod atlas;
pub mod binary;
pub mod image;
pub mod json;
pub mod shader;
pub mod sound;
pub mod sprite;
pub mod text;
pub mod texture;

pub use atlas::{AtlasAsset, Region};
pub use binary::BinaryAsset;
pub use image::{ImageAsset, ImageData};
pub use json::JsonAsset;
pub use shader::ShaderAsset;
pub use sound::SoundAsset;
pub use sprite::SpriteAsset;
pub use text::TextAsset;
pub use texture::TextureAsset;

/// A loadable asset type.
///
/// Implementations declare their stable kind identifier and provide the
/// asynchronous factory the library invokes on a cache miss. The factory
/// must never be called directly by consumers; go through
/// [`Library::load_asset_async`] so requests coalesce on the cache.
pub trait AssetType: Send + Sync + Sized + 'static {
    /// Stable identifier for this type.
    const KIND: AssetKind;

    /// Start this type's load pipeline for `address`.
    fn load_async(library: &Library, address: &Address) -> LoadPromise<Arc<Self>>;
}

/// Decode a schema-validated declaration document into its typed form.
pub(crate) fn decode_declaration<T: serde::de::DeserializeOwned>(
    address: &Address,
    document: serde_json::Value,
) -> crate::error::LoadResult<T> {
    serde_json::from_value(document).map_err(|err| {
        let error = crate::error::LoadError::Parse {
            address: address.clone(),
            format: "declaration",
            message: err.to_string(),
        };
        tracing::error!(address = %address, error = %error, "failed to decode declaration");
        error
    })
}
