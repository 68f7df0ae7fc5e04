//! UTF-8 text assets.

use std::sync::Arc;

use crate::address::Address;
use crate::error::{LoadError, LoadPromise};
use crate::library::Library;
use crate::registry::AssetKind;
use crate::types::AssetType;

/// A UTF-8 text file.
#[derive(Debug)]
pub struct TextAsset {
    pub text: String,
}

impl AssetType for TextAsset {
    const KIND: AssetKind = AssetKind::Text;

    fn load_async(library: &Library, address: &Address) -> LoadPromise<Arc<Self>> {
        let parse_address = address.clone();
        library.read_bytes_async(address).then(move |bytes| {
            let text = String::from_utf8(bytes).map_err(|err| {
                let error = LoadError::Parse {
                    address: parse_address.clone(),
                    format: "utf-8",
                    message: err.to_string(),
                };
                tracing::error!(address = %parse_address, error = %error, "text asset is not valid UTF-8");
                error
            })?;
            Ok(Arc::new(TextAsset { text }))
        })
    }
}
