//! GPU texture assets.

use std::sync::Arc;

use crate::address::Address;
use crate::backend::TextureHandle;
use crate::error::{LoadError, LoadPromise};
use crate::library::Library;
use crate::registry::AssetKind;
use crate::types::AssetType;
use crate::types::image::ImageAsset;

/// A backend texture created from the image at the same address.
///
/// The source image stays referenced so it shares the texture's lifetime in
/// the cache.
#[derive(Debug)]
pub struct TextureAsset {
    pub image: Arc<ImageAsset>,
    pub handle: TextureHandle,
}

impl AssetType for TextureAsset {
    const KIND: AssetKind = AssetKind::Texture;

    fn load_async(library: &Library, address: &Address) -> LoadPromise<Arc<Self>> {
        let library = library.clone();
        let address = address.clone();
        library
            .clone()
            .load_asset_async::<ImageAsset>(address.clone())
            .chain(move |image| {
                // Texture objects must be created on the owning thread.
                let render = library.render_backend();
                library.deferrer().do_in_main_thread(move || {
                    let render = render.ok_or_else(|| {
                        tracing::error!(address = %address, "no render backend configured");
                        LoadError::Backend {
                            address: address.clone(),
                            what: "render backend not available",
                        }
                    })?;
                    let handle = render.create_texture(&image.data).ok_or_else(|| {
                        tracing::error!(address = %address, "render backend failed to create texture");
                        LoadError::Backend {
                            address: address.clone(),
                            what: "create_texture returned null",
                        }
                    })?;
                    Ok(Arc::new(TextureAsset { image, handle }))
                })
            })
    }
}
