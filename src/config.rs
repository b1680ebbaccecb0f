use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{ReelError, ReelResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Procedural background drawn at z-order 0.
pub enum BackgroundStyle {
    /// Vertical blue gradient that brightens over the video.
    Gradient,
    /// Static vertical gradient with a slow horizontal shimmer.
    #[default]
    Drift,
    /// Separable sine/cosine interference pattern.
    Neural,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Placement of sentence captions.
pub enum CaptionStyle {
    /// Captions stack downwards from `caption_top`.
    #[default]
    Stacked,
    /// Every caption sits on a translucent plate near the bottom edge.
    LowerThird,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Shape drawn by the energy-driven mouth overlay.
pub enum MouthShape {
    /// Filled axis-aligned rectangle.
    Rect,
    /// Filled ellipse inscribed in the mouth rectangle.
    #[default]
    Ellipse,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Timing constants for the caption schedule, in seconds.
pub struct TimingConfig {
    /// Reserved title window at the start of the video.
    pub title_duration: f64,
    /// Reserved closing window at the end of the video.
    pub closing_duration: f64,
    /// Silence between consecutive captions.
    pub caption_gap: f64,
    /// Caption fade-in and fade-out length (clamped to half the caption).
    pub caption_fade: f64,
    /// Title fade-in length.
    pub title_fade_in: f64,
    /// Title fade-out length.
    pub title_fade_out: f64,
    /// Closing fade-in and fade-out length.
    pub closing_fade: f64,
    /// Captions shorter than this are dropped rather than squeezed.
    pub min_caption_duration: f64,
    /// On-screen time of one skill highlight.
    pub skill_duration: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            title_duration: 3.5,
            closing_duration: 3.0,
            caption_gap: 0.5,
            caption_fade: 0.8,
            title_fade_in: 1.5,
            title_fade_out: 0.8,
            closing_fade: 1.0,
            min_caption_duration: 1.0,
            skill_duration: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Ken Burns zoom settings.
pub struct KenBurnsConfig {
    /// Zoom reached at the end of the video (`>= 1.0`).
    pub max_zoom: f64,
}

impl Default for KenBurnsConfig {
    fn default() -> Self {
        Self { max_zoom: 1.1 }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Mouth overlay geometry, as fractions of the reference box (face box or whole photo).
///
/// Height in pixels is `ref_h * height * (base + gain * energy)`, never below `min_height_px`.
pub struct MouthConfig {
    pub center_x: f64,
    pub top_y: f64,
    pub width: f64,
    pub height: f64,
    pub base: f64,
    pub gain: f64,
    pub min_height_px: f64,
    pub shape: MouthShape,
    /// Straight-alpha RGBA.
    pub color: [u8; 4],
}

impl Default for MouthConfig {
    fn default() -> Self {
        Self {
            center_x: 0.5,
            top_y: 0.65,
            width: 0.25,
            height: 0.08,
            base: 0.3,
            gain: 0.7,
            min_height_px: 2.0,
            shape: MouthShape::Ellipse,
            color: [20, 8, 8, 230],
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Typography and placement of text layers, in pixels.
pub struct TextConfig {
    pub caption_font_size: f32,
    pub title_font_size: f32,
    pub closing_font_size: f32,
    pub skill_font_size: f32,
    pub caption_color: String,
    pub title_color: String,
    pub skill_color: String,
    pub font_family: String,
    pub caption_top: f64,
    pub caption_line_step: f64,
    pub title_top: f64,
    pub closing_top: f64,
    pub skill_top: f64,
    pub skill_line_step: f64,
    pub bounce_amplitude: f64,
    /// Seconds per bounce cycle.
    pub bounce_period: f64,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            caption_font_size: 42.0,
            title_font_size: 64.0,
            closing_font_size: 56.0,
            skill_font_size: 36.0,
            caption_color: "#FFFFFF".to_string(),
            title_color: "#FFD700".to_string(),
            skill_color: "#00FF99".to_string(),
            font_family: "DejaVu Sans, Arial, sans-serif".to_string(),
            caption_top: 200.0,
            caption_line_step: 80.0,
            title_top: 100.0,
            closing_top: 600.0,
            skill_top: 400.0,
            skill_line_step: 50.0,
            bounce_amplitude: 15.0,
            bounce_period: 1.5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Audio analysis settings.
pub struct AudioConfig {
    /// Canonical mono sample rate the voice recording is resampled to.
    pub sample_rate: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Everything that varies between intro videos besides the three input files.
///
/// Loadable from JSON; every field is optional in the file and falls back to its default.
pub struct PipelineConfig {
    /// Output width in pixels (even).
    pub width: u32,
    /// Output height in pixels (even).
    pub height: u32,
    /// Output frame rate; also the envelope sample rate.
    pub fps: u32,
    pub background_style: BackgroundStyle,
    pub caption_style: CaptionStyle,
    pub mouth_animation_enabled: bool,
    pub ken_burns_enabled: bool,
    /// Bulleted highlights shown during the caption section.
    pub skill_highlights: Vec<String>,
    pub title_text: String,
    pub closing_text: String,
    /// Already-rendered talking-head video to use instead of the still photo.
    pub lipsync_video: Option<PathBuf>,
    /// External face detector program (receives the photo path, prints JSON).
    pub face_detector: Option<PathBuf>,
    pub timing: TimingConfig,
    pub ken_burns: KenBurnsConfig,
    pub mouth: MouthConfig,
    pub text: TextConfig,
    pub audio: AudioConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fps: 24,
            background_style: BackgroundStyle::default(),
            caption_style: CaptionStyle::default(),
            mouth_animation_enabled: true,
            ken_burns_enabled: true,
            skill_highlights: Vec::new(),
            title_text: "Hello!".to_string(),
            closing_text: "Thank you for watching!".to_string(),
            lipsync_video: None,
            face_detector: None,
            timing: TimingConfig::default(),
            ken_burns: KenBurnsConfig::default(),
            mouth: MouthConfig::default(),
            text: TextConfig::default(),
            audio: AudioConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn from_path(path: &Path) -> ReelResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_slice(&bytes).map_err(|e| {
            ReelError::validation(format!("config '{}' is not valid: {e}", path.display()))
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    pub fn fps(&self) -> ReelResult<Fps> {
        Fps::integer(self.fps)
    }

    /// Set the title from a person's name, e.g. `Hello! I'm Ada Lovelace`.
    pub fn with_name(mut self, name: &str) -> Self {
        let name = name.trim();
        if !name.is_empty() {
            self.title_text = format!("Hello! I'm {name}");
        }
        self
    }

    pub fn validate(&self) -> ReelResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ReelError::validation("width/height must be non-zero"));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            return Err(ReelError::validation(
                "width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if self.fps == 0 {
            return Err(ReelError::validation("fps must be non-zero"));
        }
        if self.audio.sample_rate == 0 {
            return Err(ReelError::validation("audio sample_rate must be non-zero"));
        }

        let t = &self.timing;
        for (name, v) in [
            ("timing.title_duration", t.title_duration),
            ("timing.closing_duration", t.closing_duration),
            ("timing.caption_gap", t.caption_gap),
            ("timing.caption_fade", t.caption_fade),
            ("timing.title_fade_in", t.title_fade_in),
            ("timing.title_fade_out", t.title_fade_out),
            ("timing.closing_fade", t.closing_fade),
            ("timing.min_caption_duration", t.min_caption_duration),
            ("timing.skill_duration", t.skill_duration),
            ("mouth.width", self.mouth.width),
            ("mouth.height", self.mouth.height),
            ("mouth.base", self.mouth.base),
            ("mouth.gain", self.mouth.gain),
            ("mouth.min_height_px", self.mouth.min_height_px),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(ReelError::validation(format!(
                    "{name} must be finite and >= 0 (got {v})"
                )));
            }
        }
        if t.min_caption_duration + t.caption_gap <= 0.0 {
            return Err(ReelError::validation(
                "timing.min_caption_duration + timing.caption_gap must be > 0",
            ));
        }
        if !self.ken_burns.max_zoom.is_finite() || self.ken_burns.max_zoom < 1.0 {
            return Err(ReelError::validation("ken_burns.max_zoom must be >= 1.0"));
        }
        if !(self.text.bounce_period.is_finite() && self.text.bounce_period > 0.0) {
            return Err(ReelError::validation("text.bounce_period must be > 0"));
        }
        for (name, size) in [
            ("text.caption_font_size", self.text.caption_font_size),
            ("text.title_font_size", self.text.title_font_size),
            ("text.closing_font_size", self.text.closing_font_size),
            ("text.skill_font_size", self.text.skill_font_size),
        ] {
            if !(size.is_finite() && size > 0.0) {
                return Err(ReelError::validation(format!("{name} must be > 0")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
