use std::io::Cursor;

use crate::{
    assets::{PreparedImage, decode::unpremultiply_rgba8_in_place},
    foundation::{
        core::Canvas,
        error::{NftgenError, NftgenResult},
    },
    render::{
        backend::{FrameRGBA, RenderBackend},
        composite::over_in_place,
    },
};

/// CPU raster surface holding premultiplied RGBA8.
#[derive(Debug, Clone)]
pub struct CpuBackend {
    canvas: Canvas,
    surface: Vec<u8>,
}

impl CpuBackend {
    pub fn new(canvas: Canvas) -> NftgenResult<Self> {
        if canvas.width == 0 || canvas.height == 0 {
            return Err(NftgenError::render("surface width/height must be > 0"));
        }
        Ok(Self {
            canvas,
            surface: vec![0u8; canvas.byte_len()],
        })
    }

    fn straight_rgba(&self) -> Vec<u8> {
        let mut data = self.surface.clone();
        unpremultiply_rgba8_in_place(&mut data);
        data
    }
}

impl RenderBackend for CpuBackend {
    fn canvas(&self) -> Canvas {
        self.canvas
    }

    fn clear(&mut self) {
        self.surface.fill(0);
    }

    fn draw_image(&mut self, image: &PreparedImage, opacity: f32) -> NftgenResult<()> {
        if image.width != self.canvas.width || image.height != self.canvas.height {
            return Err(NftgenError::render(format!(
                "image is {}x{} but surface is {}x{}",
                image.width, image.height, self.canvas.width, self.canvas.height
            )));
        }
        over_in_place(&mut self.surface, &image.rgba8_premul, opacity)
    }

    fn encode_png(&self) -> NftgenResult<Vec<u8>> {
        let img = image::RgbaImage::from_raw(
            self.canvas.width,
            self.canvas.height,
            self.straight_rgba(),
        )
        .ok_or_else(|| NftgenError::render("surface buffer does not match canvas size"))?;

        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .map_err(|e| NftgenError::render(format!("encode png: {e}")))?;
        Ok(buf)
    }

    fn read_pixels(&self) -> FrameRGBA {
        FrameRGBA {
            width: self.canvas.width,
            height: self.canvas.height,
            data: self.straight_rgba(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
