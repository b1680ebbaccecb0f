use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::ReelResult;
use crate::foundation::math::premultiply_rgba8_in_place;

#[derive(Clone, Debug)]
/// Decoded still image held as premultiplied RGBA8.
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// Decode encoded image bytes and convert to premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> ReelResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    Ok(prepare_rgba(dyn_img.to_rgba8()))
}

/// Resize to exactly `width`x`height` with a Triangle filter.
///
/// Filtering premultiplied pixels directly keeps transparent edges from bleeding dark fringes.
pub fn resize_prepared(src: &PreparedImage, width: u32, height: u32) -> ReelResult<PreparedImage> {
    let (width, height) = (width.max(1), height.max(1));
    if (src.width, src.height) == (width, height) {
        return Ok(src.clone());
    }
    let buf = image::RgbaImage::from_raw(src.width, src.height, src.rgba8_premul.to_vec())
        .ok_or_else(|| anyhow::anyhow!("prepared image buffer does not match its dimensions"))?;
    let resized =
        image::imageops::resize(&buf, width, height, image::imageops::FilterType::Triangle);
    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(resized.into_raw()),
    })
}

pub(crate) fn prepare_rgba(rgba: image::RgbaImage) -> PreparedImage {
    let (width, height) = rgba.dimensions();
    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
