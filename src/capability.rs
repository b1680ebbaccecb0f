use std::path::{Path, PathBuf};
use std::process::Command;

use crate::assets::loader::PhotoAsset;
use crate::assets::media::{self, VideoSourceInfo};
use crate::config::PipelineConfig;
use crate::foundation::error::{ReelError, ReelResult};

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Face bounding box in source photo pixels.
pub struct FaceBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl FaceBox {
    /// Intersect with the `width`x`height` image. `None` when nothing usable is left.
    pub fn clamped_to(self, width: u32, height: u32) -> Option<Self> {
        let vals = [self.x, self.y, self.width, self.height];
        if vals.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let x0 = self.x.clamp(0.0, f64::from(width));
        let y0 = self.y.clamp(0.0, f64::from(height));
        let x1 = (self.x + self.width).clamp(0.0, f64::from(width));
        let y1 = (self.y + self.height).clamp(0.0, f64::from(height));
        if x1 - x0 < 1.0 || y1 - y0 < 1.0 {
            return None;
        }
        Some(Self {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        })
    }
}

/// Something that can find the speaker's face in the photo.
///
/// `Ok(None)` means "ran fine, found no face". Both that and `Err` are treated as a missing
/// capability by the caller.
pub trait FaceDetector {
    fn detect(&self, photo: &PhotoAsset) -> ReelResult<Option<FaceBox>>;
}

#[derive(Clone, Debug)]
/// Runs an external program with the photo path as its only argument.
///
/// The program prints either `null` or `{"x":..,"y":..,"width":..,"height":..}` on stdout.
pub struct CommandFaceDetector {
    program: PathBuf,
}

impl CommandFaceDetector {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl FaceDetector for CommandFaceDetector {
    fn detect(&self, photo: &PhotoAsset) -> ReelResult<Option<FaceBox>> {
        let out = Command::new(&self.program)
            .arg(&photo.asset.path)
            .output()
            .map_err(|e| {
                ReelError::validation(format!(
                    "failed to run face detector '{}': {e}",
                    self.program.display()
                ))
            })?;
        if !out.status.success() {
            return Err(ReelError::validation(format!(
                "face detector '{}' failed: {}",
                self.program.display(),
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        parse_face_box(&out.stdout)
    }
}

pub(crate) fn parse_face_box(stdout: &[u8]) -> ReelResult<Option<FaceBox>> {
    serde_json::from_slice::<Option<FaceBox>>(stdout)
        .map_err(|e| ReelError::validation(format!("face detector output is not valid: {e}")))
}

#[derive(Clone, Debug, Default)]
/// Optional collaborators found at startup.
///
/// Probed once per run. Downstream stages branch on these fields instead of catching failures.
pub struct Capabilities {
    pub ffmpeg: bool,
    pub ffprobe: bool,
    /// Face box in photo pixels, when a detector was configured and found one.
    pub face: Option<FaceBox>,
    /// Usable external lip-sync video.
    pub lipsync_video: Option<VideoSourceInfo>,
}

impl Capabilities {
    /// Probe the tools on `PATH` plus whatever `cfg` asks for.
    #[tracing::instrument(skip_all)]
    pub fn probe(cfg: &PipelineConfig, photo: &PhotoAsset) -> Self {
        let detector = cfg.face_detector.as_ref().map(CommandFaceDetector::new);
        Self::probe_with(
            cfg,
            photo,
            detector.as_ref().map(|d| d as &dyn FaceDetector),
            media::is_ffmpeg_on_path(),
            media::is_ffprobe_on_path(),
        )
    }

    /// Same as [`Capabilities::probe`] with the detector and tool availability supplied.
    pub fn probe_with(
        cfg: &PipelineConfig,
        photo: &PhotoAsset,
        detector: Option<&dyn FaceDetector>,
        ffmpeg: bool,
        ffprobe: bool,
    ) -> Self {
        let face = detector.and_then(|d| detect_face(d, photo));
        if detector.is_none() && cfg.mouth_animation_enabled {
            tracing::debug!("no face detector configured, mouth placed relative to whole photo");
        }

        let lipsync_video = cfg
            .lipsync_video
            .as_deref()
            .and_then(|p| probe_lipsync(p, ffmpeg, ffprobe));

        let caps = Self {
            ffmpeg,
            ffprobe,
            face,
            lipsync_video,
        };
        tracing::info!(
            ffmpeg = caps.ffmpeg,
            ffprobe = caps.ffprobe,
            face = caps.face.is_some(),
            lipsync = caps.lipsync_video.is_some(),
            "capabilities probed"
        );
        caps
    }
}

fn detect_face(detector: &dyn FaceDetector, photo: &PhotoAsset) -> Option<FaceBox> {
    match detector.detect(photo) {
        Ok(Some(b)) => {
            let clamped = b.clamped_to(photo.image.width, photo.image.height);
            if clamped.is_none() {
                tracing::warn!(?b, "face box lies outside the photo, ignoring it");
            }
            clamped
        }
        Ok(None) => {
            tracing::warn!("no face found, mouth placed relative to whole photo");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "face detection unavailable, mouth placed relative to whole photo");
            None
        }
    }
}

fn probe_lipsync(path: &Path, ffmpeg: bool, ffprobe: bool) -> Option<VideoSourceInfo> {
    if !path.is_file() {
        tracing::warn!(
            path = %path.display(),
            "lip-sync video not found, falling back to procedural mouth"
        );
        return None;
    }
    if !(ffmpeg && ffprobe) {
        tracing::warn!(
            path = %path.display(),
            "lip-sync video needs ffmpeg and ffprobe, falling back to procedural mouth"
        );
        return None;
    }
    match media::probe_video(path) {
        Ok(info) => Some(info),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "lip-sync video unusable, falling back to procedural mouth"
            );
            None
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/capability.rs"]
mod tests;
