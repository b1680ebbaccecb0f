use std::sync::Arc;

use crate::assets::decode::PreparedImage;
use crate::assets::loader::PhotoAsset;
use crate::assets::media::VideoSourceInfo;
use crate::audio::envelope::AudioEnvelope;
use crate::capability::{Capabilities, FaceBox};
use crate::config::{BackgroundStyle, CaptionStyle, MouthConfig, PipelineConfig};
use crate::foundation::core::{Canvas, Rect};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::clamp01;
use crate::layout::schedule::{Schedule, Window, schedule};

/// Bottom margin of lower-third captions, in pixels.
const LOWER_THIRD_MARGIN: f64 = 48.0;

#[derive(Clone, Copy, Debug, PartialEq)]
/// Where a layer is drawn on the canvas.
pub enum Position {
    /// Covers the whole canvas.
    Fill,
    /// Occupies exactly this canvas rectangle (and is clipped to it).
    Region(Rect),
    /// Horizontally centered, top edge at `y`.
    CenterX { y: f64 },
    /// Horizontally centered, bottom edge `margin` pixels above the canvas bottom.
    BottomCenter { margin: f64 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
/// Linear zoom from 1.0 at `t = 0` to `max_zoom` at `t = total`.
pub struct ZoomRamp {
    pub max_zoom: f64,
    pub total: f64,
}

impl ZoomRamp {
    pub fn constant() -> Self {
        Self {
            max_zoom: 1.0,
            total: 1.0,
        }
    }

    pub fn at(&self, t: f64) -> f64 {
        if self.total <= 0.0 {
            return 1.0;
        }
        1.0 + (self.max_zoom - 1.0) * clamp01(t / self.total)
    }
}

#[derive(Clone, Debug, PartialEq)]
/// Look of a text layer.
pub struct TextStyle {
    pub font_size: f32,
    pub color: String,
    pub font_family: String,
    /// Draw a translucent plate behind the text.
    pub plate: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
/// Vertical sine bounce, `amplitude * sin(2*pi*t / period)`.
pub struct Bounce {
    pub amplitude: f64,
    pub period: f64,
}

impl Bounce {
    pub fn offset(&self, t: f64) -> f64 {
        self.amplitude * (std::f64::consts::TAU * t / self.period).sin()
    }
}

#[derive(Clone, Debug)]
/// Energy-driven mouth overlay.
///
/// A coarse stand-in for lip-sync: the mouth opens with the loudness of the voice, it does not
/// form visemes.
pub struct MouthLayer {
    pub envelope: Arc<AudioEnvelope>,
    /// Canvas rect of the photo at zoom 1.0; the mouth follows its zoom.
    pub photo_region: Rect,
    /// Box the fractional mouth constants refer to, in canvas pixels at zoom 1.0.
    pub reference: Rect,
    pub zoom: ZoomRamp,
    pub config: MouthConfig,
}

#[derive(Clone, Debug)]
/// What a layer draws.
pub enum LayerContent {
    Background(BackgroundStyle),
    Photo { image: PreparedImage, zoom: ZoomRamp },
    /// Pre-rendered talking-head video streamed frame by frame.
    Video(VideoSourceInfo),
    Text {
        text: String,
        style: TextStyle,
        bounce: Option<Bounce>,
    },
    Mouth(MouthLayer),
}

#[derive(Clone, Debug)]
/// One timed element of the video.
pub struct VisualLayer {
    /// Short label for logs.
    pub name: String,
    pub content: LayerContent,
    pub start: f64,
    pub duration: f64,
    pub position: Position,
    pub fade_in: f64,
    pub fade_out: f64,
    /// Layers draw in ascending order; the background owns 0.
    pub z_order: u32,
}

impl VisualLayer {
    pub fn window(&self) -> Window {
        Window {
            start: self.start,
            duration: self.duration,
            fade_in: self.fade_in,
            fade_out: self.fade_out,
        }
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    pub fn is_active(&self, t: f64) -> bool {
        self.window().contains(t)
    }

    pub fn fade_multiplier(&self, t: f64) -> f64 {
        self.window().fade_multiplier(t)
    }
}

pub const Z_BACKGROUND: u32 = 0;
pub const Z_PHOTO: u32 = 1;
pub const Z_MOUTH: u32 = 2;
pub const Z_TITLE: u32 = 3;
pub const Z_CAPTION: u32 = 4;
pub const Z_SKILL: u32 = 5;

#[derive(Clone, Debug)]
/// All layers of one video, sorted by `z_order` (stable).
pub struct Timeline {
    pub total_duration: f64,
    pub canvas: Canvas,
    pub layers: Vec<VisualLayer>,
    pub schedule: Schedule,
}

impl Timeline {
    /// Check every layer lies within `[0, total_duration]`.
    pub fn validate(&self) -> ReelResult<()> {
        const EPS: f64 = 1e-9;
        for l in &self.layers {
            if !(l.start >= 0.0 && l.duration >= 0.0 && l.end() <= self.total_duration + EPS) {
                return Err(ReelError::layout(format!(
                    "layer '{}' [{}, {}) does not fit in [0, {}]",
                    l.name,
                    l.start,
                    l.end(),
                    self.total_duration
                )));
            }
        }
        Ok(())
    }

    pub fn captions(&self) -> impl Iterator<Item = &VisualLayer> {
        self.layers.iter().filter(|l| l.z_order == Z_CAPTION)
    }
}

/// Fit the photo to the canvas height (never wider than the canvas), left aligned and
/// vertically centered.
pub fn photo_region(canvas: Canvas, photo_w: u32, photo_h: u32) -> Rect {
    let cw = f64::from(canvas.width);
    let ch = f64::from(canvas.height);
    let scale = (ch / f64::from(photo_h.max(1))).min(cw / f64::from(photo_w.max(1)));
    let w = (f64::from(photo_w) * scale).round().clamp(1.0, cw);
    let h = (f64::from(photo_h) * scale).round().clamp(1.0, ch);
    let y0 = ((ch - h) / 2.0).floor();
    Rect::new(0.0, y0, w, y0 + h)
}

/// Map a face box from photo pixels onto the photo's canvas region.
fn face_reference(region: Rect, photo: &PreparedImage, face: Option<FaceBox>) -> Rect {
    let Some(f) = face else {
        return region;
    };
    let sx = region.width() / f64::from(photo.width.max(1));
    let sy = region.height() / f64::from(photo.height.max(1));
    Rect::new(
        region.x0 + f.x * sx,
        region.y0 + f.y * sy,
        region.x0 + (f.x + f.width) * sx,
        region.y0 + (f.y + f.height) * sy,
    )
}

/// Build the layer timeline for one video of `total_duration` seconds.
///
/// The mouth overlay is added only when an envelope is supplied, mouth animation is enabled and
/// no lip-sync video replaces the photo.
#[tracing::instrument(
    skip_all,
    fields(total_duration = total_duration, sentences = sentences.len())
)]
pub fn build_timeline(
    cfg: &PipelineConfig,
    photo: &PhotoAsset,
    sentences: &[String],
    total_duration: f64,
    envelope: Option<Arc<AudioEnvelope>>,
    caps: &Capabilities,
) -> ReelResult<Timeline> {
    let sched = schedule(
        total_duration,
        sentences.len(),
        cfg.skill_highlights.len(),
        &cfg.timing,
    )?;
    let canvas = cfg.canvas();
    let whole = Window {
        start: 0.0,
        duration: total_duration,
        fade_in: 0.0,
        fade_out: 0.0,
    };
    let mut layers = Vec::new();

    layers.push(layer(
        "background",
        LayerContent::Background(cfg.background_style),
        whole,
        Position::Fill,
        Z_BACKGROUND,
    ));

    let region = photo_region(canvas, photo.image.width, photo.image.height);
    let zoom = if cfg.ken_burns_enabled {
        ZoomRamp {
            max_zoom: cfg.ken_burns.max_zoom,
            total: total_duration,
        }
    } else {
        ZoomRamp::constant()
    };

    if let Some(video) = &caps.lipsync_video {
        layers.push(layer(
            "lipsync_video",
            LayerContent::Video(video.clone()),
            whole,
            Position::Region(region),
            Z_PHOTO,
        ));
    } else {
        layers.push(layer(
            "photo",
            LayerContent::Photo {
                image: photo.image.clone(),
                zoom,
            },
            whole,
            Position::Region(region),
            Z_PHOTO,
        ));

        match (cfg.mouth_animation_enabled, envelope) {
            (true, Some(env)) => layers.push(layer(
                "mouth",
                LayerContent::Mouth(MouthLayer {
                    envelope: env,
                    photo_region: region,
                    reference: face_reference(region, &photo.image, caps.face),
                    zoom,
                    config: cfg.mouth.clone(),
                }),
                whole,
                Position::Region(region),
                Z_MOUTH,
            )),
            (true, None) => tracing::warn!("no audio envelope, mouth overlay omitted"),
            (false, _) => {}
        }
    }

    let t = &cfg.text;
    if let Some(w) = sched.title
        && !cfg.title_text.trim().is_empty()
    {
        layers.push(text_layer(
            "title",
            &cfg.title_text,
            text_style(t.title_font_size, &t.title_color, &t.font_family, false),
            None,
            w,
            Position::CenterX { y: t.title_top },
            Z_TITLE,
        ));
    }
    if let Some(w) = sched.closing
        && !cfg.closing_text.trim().is_empty()
    {
        layers.push(text_layer(
            "closing",
            &cfg.closing_text,
            text_style(t.closing_font_size, &t.title_color, &t.font_family, false),
            None,
            w,
            Position::CenterX { y: t.closing_top },
            Z_TITLE,
        ));
    }

    let rows = stacked_rows(canvas, t.caption_top, t.caption_line_step, t.caption_font_size);
    for (i, (sentence, w)) in sentences.iter().zip(&sched.captions).enumerate() {
        let (position, plate) = match cfg.caption_style {
            CaptionStyle::Stacked => (
                Position::CenterX {
                    y: t.caption_top + (i % rows) as f64 * t.caption_line_step,
                },
                false,
            ),
            CaptionStyle::LowerThird => (
                Position::BottomCenter {
                    margin: LOWER_THIRD_MARGIN,
                },
                true,
            ),
        };
        layers.push(text_layer(
            &format!("caption_{i}"),
            sentence,
            text_style(t.caption_font_size, &t.caption_color, &t.font_family, plate),
            None,
            *w,
            position,
            Z_CAPTION,
        ));
    }

    let bounce = Bounce {
        amplitude: t.bounce_amplitude,
        period: t.bounce_period,
    };
    for (i, (skill, w)) in cfg.skill_highlights.iter().zip(&sched.skills).enumerate() {
        layers.push(text_layer(
            &format!("skill_{i}"),
            &format!("\u{2022} {}", skill.trim()),
            text_style(t.skill_font_size, &t.skill_color, &t.font_family, false),
            Some(bounce),
            *w,
            Position::CenterX {
                y: t.skill_top + i as f64 * t.skill_line_step,
            },
            Z_SKILL,
        ));
    }

    layers.sort_by_key(|l| l.z_order);
    let timeline = Timeline {
        total_duration,
        canvas,
        layers,
        schedule: sched,
    };
    timeline.validate()?;

    tracing::info!(
        layers = timeline.layers.len(),
        captions = timeline.schedule.captions.len(),
        skills = timeline.schedule.skills.len(),
        "timeline built"
    );
    Ok(timeline)
}

/// Number of stacked caption rows that fit before wrapping back to the top.
fn stacked_rows(canvas: Canvas, top: f64, step: f64, font_size: f32) -> usize {
    if step <= 0.0 {
        return 1;
    }
    let room = f64::from(canvas.height) - top - f64::from(font_size) * 1.2;
    if room < 0.0 {
        return 1;
    }
    (room / step).floor() as usize + 1
}

fn text_style(font_size: f32, color: &str, family: &str, plate: bool) -> TextStyle {
    TextStyle {
        font_size,
        color: color.to_string(),
        font_family: family.to_string(),
        plate,
    }
}

fn layer(
    name: &str,
    content: LayerContent,
    w: Window,
    position: Position,
    z_order: u32,
) -> VisualLayer {
    VisualLayer {
        name: name.to_string(),
        content,
        start: w.start,
        duration: w.duration,
        position,
        fade_in: w.fade_in,
        fade_out: w.fade_out,
        z_order,
    }
}

fn text_layer(
    name: &str,
    text: &str,
    style: TextStyle,
    bounce: Option<Bounce>,
    w: Window,
    position: Position,
    z_order: u32,
) -> VisualLayer {
    layer(
        name,
        LayerContent::Text {
            text: text.to_string(),
            style,
            bounce,
        },
        w,
        position,
        z_order,
    )
}

#[cfg(test)]
#[path = "../../tests/unit/layout/timeline.rs"]
mod tests;
