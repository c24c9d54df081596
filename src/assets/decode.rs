use anyhow::Context;

use crate::{
    assets::PreparedImage,
    foundation::{core::Canvas, error::NftgenResult},
};

/// Decode raster bytes, stretch to the canvas when sizes differ, and premultiply.
pub fn decode_image_to_canvas(bytes: &[u8], canvas: Canvas) -> NftgenResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let mut rgba = dyn_img.to_rgba8();
    if rgba.dimensions() != (canvas.width, canvas.height) {
        rgba = image::imageops::resize(
            &rgba,
            canvas.width,
            canvas.height,
            image::imageops::FilterType::Nearest,
        );
    }

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width: canvas.width,
        height: canvas.height,
        rgba8_premul,
    })
}

pub fn parse_svg(bytes: &[u8]) -> NftgenResult<usvg::Tree> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts).context("parse svg tree")?;
    Ok(tree)
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

/// Inverse of [`premultiply_rgba8_in_place`], used before PNG encoding.
pub(crate) fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((*c as u16 * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
