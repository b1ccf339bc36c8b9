//! Circular point sprite rasterized on the host.
//!
//! Every point of a layer samples this texture, so stars render as soft
//! discs instead of squares.

use image::{Rgba, RgbaImage};

use crate::error::RenderError;

/// Largest sprite the host will allocate.
pub const MAX_SPRITE_SIZE: u32 = 4096;

/// An RGBA8 sprite image ready for GPU upload.
#[derive(Clone, Debug)]
pub struct SpriteImage {
    image: RgbaImage,
}

impl SpriteImage {
    /// Width in texels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in texels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Raw RGBA8 bytes, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        self.image.as_raw()
    }
}

/// Rasterize a white disc filling a `size`×`size` canvas.
///
/// Edge texels get fractional coverage so the disc stays round when sampled
/// with linear filtering.
pub fn circle_sprite(size: u32) -> Result<SpriteImage, RenderError> {
    if size == 0 || size > MAX_SPRITE_SIZE {
        return Err(RenderError::CanvasUnavailable { size });
    }

    let radius = size as f32 / 2.0;
    let image = RgbaImage::from_fn(size, size, |x, y| {
        let dx = x as f32 + 0.5 - radius;
        let dy = y as f32 + 0.5 - radius;
        let distance = (dx * dx + dy * dy).sqrt();
        let coverage = (radius - distance + 0.5).clamp(0.0, 1.0);
        Rgba([255, 255, 255, (coverage * 255.0).round() as u8])
    });

    log::debug!("Rasterized {size}x{size} circle sprite");
    Ok(SpriteImage { image })
}
