use crate::foundation::core::Canvas;
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::{opacity_to_u8, premul_over_px};

/// A rendered frame as RGBA8 pixels.
///
/// Frames are premultiplied alpha while compositing; the encoder flattens them to opaque RGBA
/// before handing them to `ffmpeg`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Fully transparent frame.
    pub fn new(canvas: Canvas) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            data: vec![0u8; canvas.byte_len()],
            premultiplied: true,
        }
    }

    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Premultiplied pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// Source-over `src` with its top-left at `(dx, dy)`.
    ///
    /// Pixels falling outside the frame or outside `clip` (x0, y0, x1, y1) are skipped.
    pub fn blit_over(
        &mut self,
        src: ImageView<'_>,
        dx: i64,
        dy: i64,
        opacity: f32,
        clip: Option<[i64; 4]>,
    ) -> ReelResult<()> {
        if src.data.len() != src.width as usize * src.height as usize * 4 {
            return Err(ReelError::validation(
                "blit_over expects src of width*height*4 bytes",
            ));
        }
        let op = opacity_to_u8(opacity);
        if op == 0 {
            return Ok(());
        }
        let frame = [0, 0, i64::from(self.width), i64::from(self.height)];
        let [cx0, cy0, cx1, cy1] = clip.unwrap_or(frame);
        let x0 = dx.max(cx0).max(0);
        let y0 = dy.max(cy0).max(0);
        let x1 = (dx + i64::from(src.width)).min(cx1).min(frame[2]);
        let y1 = (dy + i64::from(src.height)).min(cy1).min(frame[3]);
        if x0 >= x1 || y0 >= y1 {
            return Ok(());
        }

        let fw = self.width as usize;
        let sw = src.width as usize;
        let span = (x1 - x0) as usize * 4;
        for y in y0..y1 {
            let d_start = (y as usize * fw + x0 as usize) * 4;
            let s_start = ((y - dy) as usize * sw + (x0 - dx) as usize) * 4;
            let d_row = &mut self.data[d_start..d_start + span];
            let s_row = &src.data[s_start..s_start + span];
            for (d, s) in d_row.chunks_exact_mut(4).zip(s_row.chunks_exact(4)) {
                let out = premul_over_px([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], op);
                d.copy_from_slice(&out);
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
/// Borrowed premultiplied RGBA8 pixels.
pub struct ImageView<'a> {
    pub width: u32,
    pub height: u32,
    pub data: &'a [u8],
}

#[derive(Clone, Debug)]
/// A premultiplied RGBA8 image drawn at some position, e.g. rasterized text.
pub struct Sprite {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Sprite {
    pub fn view(&self) -> ImageView<'_> {
        ImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
