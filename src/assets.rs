pub mod decode;
pub mod svg_raster;

use std::path::Path;

use crate::foundation::{
    core::Canvas,
    error::{NftgenError, NftgenResult},
};

/// Element image scaled to full canvas bounds.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    pub width: u32,
    pub height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub rgba8_premul: Vec<u8>,
}

/// Read one element file and prepare it for drawing at `canvas` size.
///
/// `.svg` files are rasterized with resvg; everything else goes through the `image` decoders.
pub fn load_element_image(path: &Path, canvas: Canvas) -> NftgenResult<PreparedImage> {
    let bytes = std::fs::read(path).map_err(|e| NftgenError::asset_load(path, e))?;
    let is_svg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"));

    let prepared = if is_svg {
        decode::parse_svg(&bytes).and_then(|tree| {
            svg_raster::rasterize_svg_to_premul_rgba8(&tree, canvas.width, canvas.height)
        })
        .map(|rgba8_premul| PreparedImage {
            width: canvas.width,
            height: canvas.height,
            rgba8_premul,
        })
    } else {
        decode::decode_image_to_canvas(&bytes, canvas)
    };
    prepared.map_err(|e| NftgenError::asset_load(path, format!("{e:#}")))
}
