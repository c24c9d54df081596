use crate::foundation::error::{NftgenError, NftgenResult};

// Guards against pathological allocations from a misconfigured format.
const MAX_DIM: u32 = 16_384;

/// Rasterize an SVG tree stretched to `width` x `height`, returning premultiplied RGBA8.
pub fn rasterize_svg_to_premul_rgba8(
    tree: &usvg::Tree,
    width: u32,
    height: u32,
) -> NftgenResult<Vec<u8>> {
    if width > MAX_DIM || height > MAX_DIM {
        return Err(NftgenError::render(format!(
            "svg raster size too large: {width}x{height} (max {MAX_DIM}x{MAX_DIM})"
        )));
    }
    let size = tree.size();
    if !size.width().is_finite() || size.width() <= 0.0 || !size.height().is_finite() || size.height() <= 0.0 {
        return Err(NftgenError::render("svg has invalid width/height"));
    }

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| NftgenError::render("failed to allocate svg pixmap"))?;

    let sx = (width as f32) / size.width();
    let sy = (height as f32) / size.height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);

    resvg::render(tree, xform, &mut pixmap.as_mut());
    Ok(pixmap.data().to_vec())
}
