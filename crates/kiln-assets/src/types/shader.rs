//! Shader program assets.

use std::sync::Arc;

use kiln_core::join2;
use serde::Deserialize;

use crate::address::Address;
use crate::backend::ShaderHandle;
use crate::error::{LoadError, LoadPromise};
use crate::library::Library;
use crate::registry::AssetKind;
use crate::schema::{FieldType, Schema, SchemaField};
use crate::types::text::TextAsset;
use crate::types::{AssetType, decode_declaration};

/// Declaration schema: `{"vertex": addr, "fragment": addr}`.
pub static SHADER_SCHEMA: Schema = Schema {
    fields: &[
        SchemaField {
            name: "vertex",
            ty: FieldType::AddressRef(AssetKind::Text),
            required: true,
        },
        SchemaField {
            name: "fragment",
            ty: FieldType::AddressRef(AssetKind::Text),
            required: true,
        },
    ],
};

#[derive(Debug, Clone, Deserialize)]
struct ShaderDecl {
    vertex: String,
    fragment: String,
}

/// A linked shader program.
#[derive(Debug)]
pub struct ShaderAsset {
    pub handle: ShaderHandle,
}

impl AssetType for ShaderAsset {
    const KIND: AssetKind = AssetKind::Shader;

    fn load_async(library: &Library, address: &Address) -> LoadPromise<Arc<Self>> {
        let declaration = library.load_declaration_async(AssetKind::Shader, address);
        let library = library.clone();
        let address = address.clone();
        declaration
            .then({
                let address = address.clone();
                move |document| decode_declaration::<ShaderDecl>(&address, document)
            })
            .chain(move |decl| {
                // Both stages load in parallel; the join is the only
                // synchronization point before program creation.
                let vertex = library.load_dependency_async::<TextAsset>(&address, &decl.vertex);
                let fragment =
                    library.load_dependency_async::<TextAsset>(&address, &decl.fragment);
                join2(&vertex, &fragment).chain(move |(vertex_src, fragment_src)| {
                    let render = library.render_backend();
                    library.deferrer().do_in_main_thread(move || {
                        let render = render.ok_or_else(|| {
                            tracing::error!(address = %address, "no render backend configured");
                            LoadError::Backend {
                                address: address.clone(),
                                what: "render backend not available",
                            }
                        })?;
                        let handle = render
                            .create_shader(&vertex_src.text, &fragment_src.text)
                            .ok_or_else(|| {
                                tracing::error!(address = %address, "render backend failed to link shader");
                                LoadError::Backend {
                                    address: address.clone(),
                                    what: "create_shader returned null",
                                }
                            })?;
                        Ok(Arc::new(ShaderAsset { handle }))
                    })
                })
            })
    }
}
