//! Contact sheet of every generated edition.

use image::{RgbaImage, imageops};
use serde_json::Value;

use crate::{
    assets::{decode::parse_svg, decode::unpremultiply_rgba8_in_place, svg_raster},
    config::Config,
    config::OutputPaths,
    foundation::error::{NftgenError, NftgenResult},
    metadata::get_path,
    output::{manifest_editions, read_manifest},
    vector::decode_base64_data_uri,
};

/// Dimensions of a written preview sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PreviewSheet {
    pub width: u32,
    pub height: u32,
    pub thumbnails: usize,
}

/// Tile every edition from the manifest into `<output>/<imageName>`.
pub fn create_preview(config: &Config, paths: &OutputPaths) -> NftgenResult<PreviewSheet> {
    let manifest = read_manifest(&paths.manifest_path)?;
    let editions = manifest_editions(&manifest)?;

    let thumb_w = config.preview.thumb_width;
    let thumb_h = ((u64::from(thumb_w) * u64::from(config.format.height))
        / u64::from(config.format.width.max(1)))
    .max(1) as u32;
    let per_row = config.preview.thumb_per_row;
    let rows = (editions.len() as u32).div_ceil(per_row).max(1);
    let sheet_w = thumb_w * per_row;
    let sheet_h = thumb_h * rows;

    tracing::info!(
        "Preparing a {sheet_w}x{sheet_h} project preview with {} thumbnails.",
        editions.len()
    );

    let mut sheet = RgbaImage::new(sheet_w, sheet_h);
    for (index, item) in editions.iter().enumerate() {
        let thumb = load_thumbnail(config, paths, item, thumb_w, thumb_h)?;
        let index = index as u32;
        let x = thumb_w * (index % per_row);
        let y = thumb_h * (index / per_row);
        imageops::overlay(&mut sheet, &thumb, i64::from(x), i64::from(y));
    }

    sheet
        .save_with_format(&paths.preview_path, image::ImageFormat::Png)
        .map_err(|e| NftgenError::render(format!("write preview: {e}")))?;
    tracing::info!("Project preview image located at: {}", paths.preview_path.display());

    Ok(PreviewSheet {
        width: sheet_w,
        height: sheet_h,
        thumbnails: editions.len(),
    })
}

fn load_thumbnail(
    config: &Config,
    paths: &OutputPaths,
    item: &Value,
    thumb_w: u32,
    thumb_h: u32,
) -> NftgenResult<RgbaImage> {
    let mapper = &config.metadata_schema_mapper;
    if config.svg_base64_data_only {
        let svg = get_path(item, &mapper.base64_svg_data_uri)
            .and_then(Value::as_str)
            .and_then(decode_base64_data_uri)
            .ok_or_else(|| NftgenError::serde("edition has no inline svg data uri"))?;
        let tree = parse_svg(&svg)?;
        let mut data = svg_raster::rasterize_svg_to_premul_rgba8(&tree, thumb_w, thumb_h)?;
        unpremultiply_rgba8_in_place(&mut data);
        return RgbaImage::from_raw(thumb_w, thumb_h, data)
            .ok_or_else(|| NftgenError::render("thumbnail buffer size mismatch"));
    }

    let edition = get_path(item, &mapper.edition)
        .and_then(Value::as_u64)
        .ok_or_else(|| NftgenError::serde("edition entry has no numeric edition field"))?;
    let path = paths.images_dir.join(format!("{edition}.png"));
    let img = image::open(&path)
        .map_err(|e| NftgenError::asset_load(&path, e))?
        .to_rgba8();
    Ok(imageops::resize(
        &img,
        thumb_w,
        thumb_h,
        imageops::FilterType::Nearest,
    ))
}
