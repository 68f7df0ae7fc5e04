//! Sprite assets: one named region of an atlas.

use std::sync::Arc;

use serde::Deserialize;

use crate::address::Address;
use crate::error::{LoadError, LoadPromise};
use crate::library::Library;
use crate::registry::AssetKind;
use crate::schema::{FieldType, Schema, SchemaField};
use crate::types::atlas::{AtlasAsset, Region};
use crate::types::{AssetType, decode_declaration};

/// Declaration schema: `{"atlas": addr, "region": name}`.
pub static SPRITE_SCHEMA: Schema = Schema {
    fields: &[
        SchemaField {
            name: "atlas",
            ty: FieldType::AddressRef(AssetKind::Atlas),
            required: true,
        },
        SchemaField {
            name: "region",
            ty: FieldType::String,
            required: true,
        },
    ],
};

#[derive(Debug, Clone, Deserialize)]
struct SpriteDecl {
    atlas: String,
    region: String,
}

/// A single drawable region of an atlas.
#[derive(Debug)]
pub struct SpriteAsset {
    pub atlas: Arc<AtlasAsset>,
    pub region: Region,
}

impl AssetType for SpriteAsset {
    const KIND: AssetKind = AssetKind::Sprite;

    fn load_async(library: &Library, address: &Address) -> LoadPromise<Arc<Self>> {
        let declaration = library.load_declaration_async(AssetKind::Sprite, address);
        let library = library.clone();
        let address = address.clone();
        declaration
            .then({
                let address = address.clone();
                move |document| decode_declaration::<SpriteDecl>(&address, document)
            })
            .chain(move |decl| {
                let atlas_reference = decl.atlas;
                let region_name = decl.region;
                library
                    .load_dependency_async::<AtlasAsset>(&address, &atlas_reference)
                    .then(move |atlas| {
                        let region = atlas.region(&region_name).ok_or_else(|| {
                            tracing::error!(
                                address = %address,
                                atlas = %atlas_reference,
                                region = %region_name,
                                "sprite references a region its atlas does not define"
                            );
                            LoadError::DependencyNotFound {
                                address: address.clone(),
                                dependency: format!(
                                    "region '{}' of atlas '{}'",
                                    region_name, atlas_reference
                                ),
                                cause: None,
                            }
                        })?;
                        Ok(Arc::new(SpriteAsset { atlas, region }))
                    })
            })
    }
}
