use std::path::Path;

use crate::{
    assets::{PreparedImage, load_element_image},
    foundation::{core::Canvas, error::NftgenResult},
};

/// Snapshot of a surface as straight-alpha RGBA8.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Straight (non-premultiplied) RGBA8, tightly packed, row-major.
    pub data: Vec<u8>,
}

/// Drawable surface the compositor renders editions onto.
///
/// The surface persists across a run and is cleared before each edition. `load_image` is called
/// from worker threads during element fan-out, hence the `Sync` bound.
pub trait RenderBackend: Send + Sync {
    /// Surface size; every element is drawn at these bounds.
    fn canvas(&self) -> Canvas;

    /// Reset every pixel to transparent.
    fn clear(&mut self);

    /// Blend `image` over the surface at full bounds with `opacity` as global alpha.
    fn draw_image(&mut self, image: &PreparedImage, opacity: f32) -> NftgenResult<()>;

    /// Encode the current surface to PNG bytes.
    fn encode_png(&self) -> NftgenResult<Vec<u8>>;

    /// Read back the current surface.
    fn read_pixels(&self) -> FrameRGBA;

    /// Load an element file into a drawable image sized to [`RenderBackend::canvas`].
    fn load_image(&self, path: &Path) -> NftgenResult<PreparedImage> {
        load_element_image(path, self.canvas())
    }
}

/// Available backend kinds.
#[derive(Clone, Copy, Debug, Default)]
pub enum BackendKind {
    /// In-memory premultiplied RGBA8 raster.
    #[default]
    Cpu,
}

/// Create a rendering backend implementation.
pub fn create_backend(kind: BackendKind, canvas: Canvas) -> NftgenResult<Box<dyn RenderBackend>> {
    match kind {
        BackendKind::Cpu => Ok(Box::new(crate::render::cpu::CpuBackend::new(canvas)?)),
    }
}
