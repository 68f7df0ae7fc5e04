//! Encoded image assets.
//!
//! Image codecs are an external collaborator: the pipeline only requires
//! "parse these bytes into a content object or fail" and carries the encoded
//! payload through to the render backend untouched.

use std::sync::Arc;

use crate::address::Address;
use crate::error::{LoadError, LoadPromise, LoadResult};
use crate::library::Library;
use crate::registry::AssetKind;
use crate::types::AssetType;

/// The encoded payload of an image.
#[derive(Debug, Clone)]
pub struct ImageData {
    bytes: Vec<u8>,
}

impl ImageData {
    /// Wrap encoded image bytes, rejecting an empty payload.
    pub fn from_bytes(address: &Address, bytes: Vec<u8>) -> LoadResult<Self> {
        if bytes.is_empty() {
            let error = LoadError::Parse {
                address: address.clone(),
                format: "image",
                message: "empty image payload".to_string(),
            };
            tracing::error!(address = %address, error = %error, "failed to parse image");
            return Err(error);
        }
        Ok(Self { bytes })
    }

    /// The encoded bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size of the encoded payload in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the payload is empty (never true for a loaded image).
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// An encoded image ready for backend texture creation.
#[derive(Debug)]
pub struct ImageAsset {
    pub data: ImageData,
}

impl AssetType for ImageAsset {
    const KIND: AssetKind = AssetKind::Image;

    fn load_async(library: &Library, address: &Address) -> LoadPromise<Arc<Self>> {
        let parse_address = address.clone();
        library.read_bytes_async(address).then(move |bytes| {
            let data = ImageData::from_bytes(&parse_address, bytes)?;
            Ok(Arc::new(ImageAsset { data }))
        })
    }
}
