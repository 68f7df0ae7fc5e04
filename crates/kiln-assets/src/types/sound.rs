//! Sound assets backed by the audio backend.

use std::sync::Arc;

use serde::Deserialize;

use crate::address::Address;
use crate::backend::SoundHandle;
use crate::error::{LoadError, LoadPromise};
use crate::library::Library;
use crate::registry::AssetKind;
use crate::schema::{FieldType, Schema, SchemaField};
use crate::types::binary::BinaryAsset;
use crate::types::{AssetType, decode_declaration};

/// Declaration schema: `{"source": addr, "streaming": bool, "volume"?: num}`.
pub static SOUND_SCHEMA: Schema = Schema {
    fields: &[
        SchemaField {
            name: "source",
            ty: FieldType::AddressRef(AssetKind::Binary),
            required: true,
        },
        SchemaField {
            name: "streaming",
            ty: FieldType::Bool,
            required: true,
        },
        SchemaField {
            name: "volume",
            ty: FieldType::Number,
            required: false,
        },
    ],
};

fn default_volume() -> f32 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
struct SoundDecl {
    source: String,
    streaming: bool,
    #[serde(default = "default_volume")]
    volume: f32,
}

/// A playable sound stream.
#[derive(Debug)]
pub struct SoundAsset {
    pub handle: SoundHandle,
    pub streaming: bool,
    pub volume: f32,
}

impl AssetType for SoundAsset {
    const KIND: AssetKind = AssetKind::Sound;

    fn load_async(library: &Library, address: &Address) -> LoadPromise<Arc<Self>> {
        let declaration = library.load_declaration_async(AssetKind::Sound, address);
        let library = library.clone();
        let address = address.clone();
        declaration
            .then({
                let address = address.clone();
                move |document| decode_declaration::<SoundDecl>(&address, document)
            })
            .chain(move |decl| {
                let payload = library.load_dependency_async::<BinaryAsset>(&address, &decl.source);
                let streaming = decl.streaming;
                let volume = decl.volume;
                payload.chain(move |bytes| {
                    let audio = library.audio_backend();
                    library.deferrer().do_in_main_thread(move || {
                        let audio = audio.ok_or_else(|| {
                            tracing::error!(address = %address, "no audio backend configured");
                            LoadError::Backend {
                                address: address.clone(),
                                what: "audio backend not available",
                            }
                        })?;
                        let handle = audio.create_stream(&bytes.bytes).ok_or_else(|| {
                            tracing::error!(address = %address, "audio backend failed to create stream");
                            LoadError::Backend {
                                address: address.clone(),
                                what: "create_stream returned null",
                            }
                        })?;
                        Ok(Arc::new(SoundAsset {
                            handle,
                            streaming,
                            volume,
                        }))
                    })
                })
            })
    }
}
