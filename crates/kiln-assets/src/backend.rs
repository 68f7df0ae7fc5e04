//! Opaque backend factories invoked from main-thread pipeline stages.
//!
//! The pipeline never interprets these handles; it only requires that a
//! factory either produces one or fails. A `None` return is treated as a
//! load failure. Factory calls are made exclusively from `do_in_main_thread`
//! stages, so implementations are free to touch APIs that must be used from
//! the owning thread.

/// Opaque handle to a backend texture object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// Opaque handle to a backend shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub u64);

/// Opaque handle to a backend sound stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundHandle(pub u64);

/// Factory surface of the rendering backend.
pub trait RenderBackend: Send + Sync + 'static {
    /// Create a texture from an image's encoded payload.
    fn create_texture(&self, image: &crate::types::image::ImageData) -> Option<TextureHandle>;

    /// Create a shader program from vertex and fragment sources.
    fn create_shader(&self, vertex_src: &str, fragment_src: &str) -> Option<ShaderHandle>;
}

/// Factory surface of the audio backend.
pub trait AudioBackend: Send + Sync + 'static {
    /// Create a playable stream from encoded sound bytes.
    fn create_stream(&self, bytes: &[u8]) -> Option<SoundHandle>;
}
