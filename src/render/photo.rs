use crate::assets::decode::{PreparedImage, resize_prepared};
use crate::foundation::core::Rect;
use crate::foundation::error::ReelResult;
use crate::render::surface::{FrameRGBA, ImageView};

/// Draws the still photo into its region with a centered zoom (Ken Burns).
///
/// The photo is resized to the region once. Each frame builds one source-index table per axis
/// and gathers pixels through them, so a zoom costs two small table fills plus a copy.
pub struct PhotoRenderer {
    image: PreparedImage,
    x0: i64,
    y0: i64,
    cols: Vec<usize>,
    rows: Vec<usize>,
    scratch: Vec<u8>,
}

impl PhotoRenderer {
    pub fn new(image: &PreparedImage, region: Rect) -> ReelResult<Self> {
        let w = region.width().round().max(1.0) as u32;
        let h = region.height().round().max(1.0) as u32;
        let image = resize_prepared(image, w, h)?;
        Ok(Self {
            image,
            x0: region.x0.round() as i64,
            y0: region.y0.round() as i64,
            cols: Vec::with_capacity(w as usize),
            rows: Vec::with_capacity(h as usize),
            scratch: vec![0u8; w as usize * h as usize * 4],
        })
    }

    pub fn render(&mut self, frame: &mut FrameRGBA, zoom: f64, opacity: f32) -> ReelResult<()> {
        let (w, h) = (self.image.width as usize, self.image.height as usize);
        zoom_indices(&mut self.cols, w, zoom);
        zoom_indices(&mut self.rows, h, zoom);

        let src = self.image.rgba8_premul.as_slice();
        for (dst_row, &sy) in self.scratch.chunks_exact_mut(w * 4).zip(&self.rows) {
            let src_row = &src[sy * w * 4..(sy + 1) * w * 4];
            for (d, &sx) in dst_row.chunks_exact_mut(4).zip(&self.cols) {
                d.copy_from_slice(&src_row[sx * 4..sx * 4 + 4]);
            }
        }

        frame.blit_over(
            ImageView {
                width: self.image.width,
                height: self.image.height,
                data: &self.scratch,
            },
            self.x0,
            self.y0,
            opacity,
            None,
        )
    }
}

/// Nearest source index for each of `len` output pixels under a centered `zoom`.
pub(crate) fn zoom_indices(out: &mut Vec<usize>, len: usize, zoom: f64) {
    out.clear();
    if len == 0 {
        return;
    }
    let zoom = zoom.max(1.0);
    let c = len as f64 / 2.0;
    let last = len - 1;
    out.extend((0..len).map(|i| {
        let s = c + (i as f64 + 0.5 - c) / zoom;
        (s.floor().max(0.0) as usize).min(last)
    }));
}

#[cfg(test)]
#[path = "../../tests/unit/render/photo.rs"]
mod tests;
