//! Generic JSON document assets.

use std::sync::Arc;

use crate::address::Address;
use crate::error::LoadPromise;
use crate::library::Library;
use crate::registry::AssetKind;
use crate::types::AssetType;

/// A parsed JSON document with no schema of its own.
#[derive(Debug)]
pub struct JsonAsset {
    pub document: serde_json::Value,
}

impl AssetType for JsonAsset {
    const KIND: AssetKind = AssetKind::Json;

    fn load_async(library: &Library, address: &Address) -> LoadPromise<Arc<Self>> {
        library
            .load_declaration_async(AssetKind::Json, address)
            .then(|document| Ok(Arc::new(JsonAsset { document })))
    }
}
