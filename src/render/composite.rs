use crate::assets::media::VideoFrameStream;
use crate::config::BackgroundStyle;
use crate::foundation::core::{Canvas, Fps, FrameIndex, Rect};
use crate::foundation::error::{ReelError, ReelResult};
use crate::layout::schedule::Window;
use crate::layout::timeline::{Bounce, LayerContent, MouthLayer, Position, Timeline, ZoomRamp};
use crate::render::background::render_background;
use crate::render::mouth::render_mouth;
use crate::render::photo::PhotoRenderer;
use crate::render::surface::{FrameRGBA, ImageView, Sprite};
use crate::render::text::TextRasterizer;

/// Horizontal margin kept free on each side of text layers.
const TEXT_SIDE_MARGIN: u32 = 50;

enum Renderer {
    Background(BackgroundStyle),
    Photo {
        photo: PhotoRenderer,
        zoom: ZoomRamp,
    },
    Video {
        stream: VideoFrameStream,
        region: Rect,
    },
    Text {
        sprite: Sprite,
        x: i64,
        y: i64,
        bounce: Option<Bounce>,
    },
    Mouth(MouthLayer),
}

struct PreparedLayer {
    name: String,
    window: Window,
    renderer: Renderer,
}

/// Turns a [`Timeline`] into frames.
///
/// Frame `i` shows time `i / fps` for `i` in `[0, floor(total_duration * fps))`. Layers draw in
/// timeline order (ascending z-order); a layer is visible on the half-open interval
/// `[start, start + duration)` and its opacity is scaled by its fade multiplier.
///
/// Rendering is deterministic: the same timeline always yields the same pixels, and frames may be
/// requested again from the start.
pub struct Compositor {
    canvas: Canvas,
    fps: Fps,
    total_duration: f64,
    frame_count: u64,
    layers: Vec<PreparedLayer>,
}

impl Compositor {
    /// Prepare per-layer renderers: resize the photo, rasterize text, open video streams.
    #[tracing::instrument(skip_all, fields(layers = timeline.layers.len()))]
    pub fn new(timeline: &Timeline, fps: Fps) -> ReelResult<Self> {
        let canvas = timeline.canvas;
        if canvas.width == 0 || canvas.height == 0 {
            return Err(ReelError::validation("canvas width/height must be non-zero"));
        }
        let frame_count = fps.secs_to_frames_floor(timeline.total_duration);
        if frame_count == 0 {
            return Err(ReelError::layout(format!(
                "{}s at {} fps yields zero frames",
                timeline.total_duration,
                fps.as_f64()
            )));
        }

        let mut text: Option<TextRasterizer> = None;
        let mut layers = Vec::with_capacity(timeline.layers.len());
        for l in &timeline.layers {
            let renderer = match &l.content {
                LayerContent::Background(style) => Renderer::Background(*style),
                LayerContent::Photo { image, zoom } => Renderer::Photo {
                    photo: PhotoRenderer::new(image, region_of(l.position, canvas))?,
                    zoom: *zoom,
                },
                LayerContent::Video(info) => {
                    let region = region_of(l.position, canvas);
                    let size = Canvas {
                        width: region.width().round().max(1.0) as u32,
                        height: region.height().round().max(1.0) as u32,
                    };
                    Renderer::Video {
                        stream: VideoFrameStream::new(&info.source_path, fps, size)?,
                        region,
                    }
                }
                LayerContent::Text {
                    text: s,
                    style,
                    bounce,
                } => {
                    let raster = text.get_or_insert_with(TextRasterizer::new);
                    let max_w = canvas.width.saturating_sub(2 * TEXT_SIDE_MARGIN).max(1);
                    let sprite = raster.rasterize(s, style, max_w)?;
                    let (x, y) = text_origin(l.position, canvas, &sprite);
                    Renderer::Text {
                        sprite,
                        x,
                        y,
                        bounce: *bounce,
                    }
                }
                LayerContent::Mouth(m) => Renderer::Mouth(m.clone()),
            };
            layers.push(PreparedLayer {
                name: l.name.clone(),
                window: l.window(),
                renderer,
            });
        }

        tracing::info!(
            frame_count,
            width = canvas.width,
            height = canvas.height,
            "compositor ready"
        );
        Ok(Self {
            canvas,
            fps,
            total_duration: timeline.total_duration,
            frame_count,
            layers,
        })
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// `floor(total_duration * fps)`.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn time_of(&self, idx: FrameIndex) -> f64 {
        self.fps.frames_to_secs(idx.0)
    }

    pub fn render_frame(&mut self, idx: FrameIndex) -> ReelResult<FrameRGBA> {
        if idx.0 >= self.frame_count {
            return Err(ReelError::validation(format!(
                "frame {} out of range (frame count {})",
                idx.0, self.frame_count
            )));
        }
        self.render_at(self.time_of(idx))
    }

    /// Render the frame showing time `t` (seconds).
    pub fn render_at(&mut self, t: f64) -> ReelResult<FrameRGBA> {
        let mut frame = FrameRGBA::new(self.canvas);
        let video_idx = self.fps.secs_to_frames_floor(t);
        let total = self.total_duration;

        for layer in &mut self.layers {
            if !layer.window.contains(t) {
                continue;
            }
            let opacity = layer.window.fade_multiplier(t) as f32;
            if opacity <= 0.0 {
                continue;
            }
            let local = t - layer.window.start;
            match &mut layer.renderer {
                Renderer::Background(style) => render_background(*style, &mut frame, t, total),
                Renderer::Photo { photo, zoom } => photo.render(&mut frame, zoom.at(t), opacity)?,
                Renderer::Video { stream, region } => {
                    let size = stream.size();
                    if let Some(px) = stream.frame(video_idx)? {
                        frame.blit_over(
                            ImageView {
                                width: size.width,
                                height: size.height,
                                data: px,
                            },
                            region.x0.round() as i64,
                            region.y0.round() as i64,
                            opacity,
                            None,
                        )?;
                    } else {
                        tracing::debug!(layer = %layer.name, "video layer has no frames");
                    }
                }
                Renderer::Text {
                    sprite,
                    x,
                    y,
                    bounce,
                } => {
                    let dy = bounce.map_or(0, |b| b.offset(local).round() as i64);
                    frame.blit_over(sprite.view(), *x, *y + dy, opacity, None)?;
                }
                Renderer::Mouth(m) => render_mouth(m, &mut frame, t, opacity),
            }
        }
        Ok(frame)
    }

    /// Lazy, in-order frame sequence from frame 0.
    pub fn frames(&mut self) -> Frames<'_> {
        Frames {
            compositor: self,
            next: 0,
        }
    }
}

/// Iterator returned by [`Compositor::frames`].
pub struct Frames<'a> {
    compositor: &'a mut Compositor,
    next: u64,
}

impl Iterator for Frames<'_> {
    type Item = ReelResult<(FrameIndex, FrameRGBA)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.compositor.frame_count {
            return None;
        }
        let idx = FrameIndex(self.next);
        self.next += 1;
        Some(self.compositor.render_frame(idx).map(|f| (idx, f)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.compositor.frame_count.saturating_sub(self.next) as usize;
        (left, Some(left))
    }
}

fn region_of(position: Position, canvas: Canvas) -> Rect {
    match position {
        Position::Region(r) => r,
        _ => canvas.rect(),
    }
}

fn text_origin(position: Position, canvas: Canvas, sprite: &Sprite) -> (i64, i64) {
    let cw = i64::from(canvas.width);
    let ch = i64::from(canvas.height);
    let centered_x = (cw - i64::from(sprite.width)) / 2;
    match position {
        Position::Fill => (centered_x, (ch - i64::from(sprite.height)) / 2),
        Position::Region(r) => (r.x0.round() as i64, r.y0.round() as i64),
        // Wrapped text on a low row must not run off the bottom edge.
        Position::CenterX { y } => (
            centered_x,
            (y.round() as i64).min(ch - i64::from(sprite.height)).max(0),
        ),
        Position::BottomCenter { margin } => (
            centered_x,
            ch - margin.round() as i64 - i64::from(sprite.height),
        ),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
