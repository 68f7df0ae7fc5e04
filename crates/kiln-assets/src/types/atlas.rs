//! Texture atlas assets.

use std::sync::Arc;

use ahash::AHashMap;
use serde::Deserialize;

use crate::address::Address;
use crate::error::LoadPromise;
use crate::library::Library;
use crate::registry::AssetKind;
use crate::schema::{FieldType, Schema, SchemaField};
use crate::types::texture::TextureAsset;
use crate::types::{AssetType, decode_declaration};

/// Declaration schema: `{"texture": addr, "regions": {name: [x, y, w, h]}}`.
pub static ATLAS_SCHEMA: Schema = Schema {
    fields: &[
        SchemaField {
            name: "texture",
            ty: FieldType::AddressRef(AssetKind::Texture),
            required: true,
        },
        SchemaField {
            name: "regions",
            ty: FieldType::Object,
            required: false,
        },
    ],
};

#[derive(Debug, Clone, Deserialize)]
struct AtlasDecl {
    texture: String,
    #[serde(default)]
    regions: AHashMap<String, [u32; 4]>,
}

/// A named rectangle within an atlas texture, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A texture plus its named sub-regions.
#[derive(Debug)]
pub struct AtlasAsset {
    pub texture: Arc<TextureAsset>,
    pub regions: AHashMap<String, Region>,
}

impl AtlasAsset {
    /// Look up a named region.
    pub fn region(&self, name: &str) -> Option<Region> {
        self.regions.get(name).copied()
    }
}

impl AssetType for AtlasAsset {
    const KIND: AssetKind = AssetKind::Atlas;

    fn load_async(library: &Library, address: &Address) -> LoadPromise<Arc<Self>> {
        let declaration = library.load_declaration_async(AssetKind::Atlas, address);
        let library = library.clone();
        let address = address.clone();
        declaration
            .then({
                let address = address.clone();
                move |document| decode_declaration::<AtlasDecl>(&address, document)
            })
            .chain(move |decl| {
                let regions: AHashMap<String, Region> = decl
                    .regions
                    .into_iter()
                    .map(|(name, [x, y, width, height])| {
                        (
                            name,
                            Region {
                                x,
                                y,
                                width,
                                height,
                            },
                        )
                    })
                    .collect();
                library
                    .load_dependency_async::<TextureAsset>(&address, &decl.texture)
                    .then(move |texture| Ok(Arc::new(AtlasAsset { texture, regions })))
            })
    }
}
