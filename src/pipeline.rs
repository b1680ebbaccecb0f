use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::assets::loader::{LoadedAssets, load_assets};
use crate::audio::{AudioAnalysis, analyze};
use crate::capability::Capabilities;
use crate::config::PipelineConfig;
use crate::encode::ffmpeg::{EncodeConfig, OutputVideo, encode_video, ensure_parent_dir};
use crate::foundation::error::{ReelError, ReelResult};
use crate::layout::timeline::{Timeline, build_timeline};
use crate::render::composite::Compositor;

#[derive(Clone, Debug)]
/// The three input files and where the video goes.
pub struct PipelineInputs {
    pub photo: PathBuf,
    pub audio: PathBuf,
    pub text: PathBuf,
    /// Final `.mp4` path (see [`resolve_output_path`]).
    pub output: PathBuf,
}

/// Everything derived before frames are produced.
pub struct Prepared {
    pub assets: LoadedAssets,
    pub capabilities: Capabilities,
    pub analysis: AudioAnalysis,
    pub timeline: Timeline,
}

/// Load, probe, analyze and lay out. Nothing is written to disk.
///
/// Assets are validated before any audio decoding happens, so a missing photo fails first.
pub fn prepare(inputs: &PipelineInputs, cfg: &PipelineConfig) -> ReelResult<Prepared> {
    cfg.validate()?;
    let fps = cfg.fps()?;

    let assets = load_assets(&inputs.photo, &inputs.audio, &inputs.text)?;
    let capabilities = Capabilities::probe(cfg, &assets.photo);
    let analysis = analyze(
        &assets.audio,
        cfg.audio.sample_rate,
        fps,
        capabilities.ffmpeg,
    )?;
    let timeline = build_timeline(
        cfg,
        &assets.photo,
        &assets.text.sentences,
        analysis.duration_secs,
        Some(Arc::clone(&analysis.envelope)),
        &capabilities,
    )?;

    Ok(Prepared {
        assets,
        capabilities,
        analysis,
        timeline,
    })
}

/// Run the whole pipeline and write the intro video.
#[tracing::instrument(skip_all, fields(output = %inputs.output.display()))]
pub fn run(inputs: &PipelineInputs, cfg: &PipelineConfig) -> ReelResult<OutputVideo> {
    let prepared = prepare(inputs, cfg)?;
    let fps = cfg.fps()?;
    let mut compositor = Compositor::new(&prepared.timeline, fps)?;

    let enc = EncodeConfig {
        width: cfg.width,
        height: cfg.height,
        fps,
        out_path: inputs.output.clone(),
        audio_path: prepared.assets.audio.path.clone(),
        bg_rgba: [0, 0, 0, 255],
    };
    encode_video(compositor.frames(), &enc)
}

/// Render the single frame at `at_secs` to a PNG instead of encoding a video.
///
/// `at_secs` is clamped into the video.
#[tracing::instrument(skip_all, fields(at_secs))]
pub fn render_preview(
    inputs: &PipelineInputs,
    cfg: &PipelineConfig,
    at_secs: f64,
    png_path: &Path,
) -> ReelResult<PathBuf> {
    let prepared = prepare(inputs, cfg)?;
    let fps = cfg.fps()?;
    let mut compositor = Compositor::new(&prepared.timeline, fps)?;

    let last = compositor.frame_count().saturating_sub(1);
    let idx = fps.secs_to_frames_floor(at_secs.max(0.0)).min(last);
    let frame = compositor.render_frame(crate::foundation::core::FrameIndex(idx))?;

    let mut rgba = vec![0u8; frame.data.len()];
    crate::encode::ffmpeg::flatten_to_opaque_rgba8(
        &mut rgba,
        &frame.data,
        frame.premultiplied,
        [0, 0, 0, 255],
    )?;
    let img = image::RgbaImage::from_raw(frame.width, frame.height, rgba)
        .ok_or_else(|| ReelError::validation("frame buffer does not match its dimensions"))?;
    ensure_parent_dir(png_path)?;
    img.save(png_path).map_err(|e| {
        ReelError::encode(format!("failed to write '{}': {e}", png_path.display()))
    })?;

    tracing::info!(path = %png_path.display(), frame = idx, "preview written");
    Ok(png_path.to_path_buf())
}

/// `<lowercased_underscored_name>_intro.mp4`, or `intro.mp4` without a usable name.
pub fn output_file_name(name: Option<&str>) -> String {
    let slug = name
        .map(|n| {
            n.split_whitespace()
                .collect::<Vec<_>>()
                .join("_")
                .to_lowercase()
        })
        .unwrap_or_default();
    if slug.is_empty() {
        "intro.mp4".to_string()
    } else {
        format!("{slug}_intro.mp4")
    }
}

/// An `output` ending in `.mp4` is the file itself; anything else is a directory.
pub fn resolve_output_path(output: &Path, name: Option<&str>) -> PathBuf {
    let is_file = output
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("mp4"));
    if is_file {
        output.to_path_buf()
    } else {
        output.join(output_file_name(name))
    }
}

#[cfg(test)]
#[path = "../tests/unit/pipeline.rs"]
mod tests;
