//! Raw byte assets.

use std::sync::Arc;

use crate::address::Address;
use crate::error::LoadPromise;
use crate::library::Library;
use crate::registry::AssetKind;
use crate::types::AssetType;

/// An uninterpreted byte blob.
#[derive(Debug)]
pub struct BinaryAsset {
    pub bytes: Vec<u8>,
}

impl AssetType for BinaryAsset {
    const KIND: AssetKind = AssetKind::Binary;

    fn load_async(library: &Library, address: &Address) -> LoadPromise<Arc<Self>> {
        library
            .read_bytes_async(address)
            .then(|bytes| Ok(Arc::new(BinaryAsset { bytes })))
    }
}
