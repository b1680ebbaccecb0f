use std::io::Read as _;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::assets::media::is_ffmpeg_on_path;
use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::surface::FrameRGBA;

pub const VIDEO_CODEC: &str = "h264";

#[derive(Clone, Debug)]
/// Settings for one encode.
pub struct EncodeConfig {
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
    pub out_path: PathBuf,
    /// Voice track muxed into the output.
    pub audio_path: PathBuf,
    /// Color transparent pixels are flattened onto (straight RGBA).
    pub bg_rgba: [u8; 4],
}

impl EncodeConfig {
    pub fn validate(&self) -> ReelResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ReelError::validation("encode width/height must be non-zero"));
        }
        if self.fps.num == 0 || self.fps.den == 0 {
            return Err(ReelError::validation("encode fps must be non-zero"));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            return Err(ReelError::validation(
                "encode width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        Ok(())
    }

    fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
/// The one file a run produces.
pub struct OutputVideo {
    pub path: PathBuf,
    pub fps: Fps,
    pub width: u32,
    pub height: u32,
    pub codec: String,
    pub has_audio: bool,
    /// Frames written to the video stream.
    pub frames: u64,
    /// `frames / fps`; the muxed file may be trimmed to the audio if that is shorter.
    pub duration_secs: f64,
}

/// Encode `frames` and mux them with the voice track into `cfg.out_path`.
///
/// Stage one streams frames into a silent MP4 in the temp directory; stage two copies that
/// video stream next to AAC audio with `-shortest`. The temporary file is removed on every
/// path, and a partial output is removed if muxing fails.
#[tracing::instrument(skip_all, fields(out = %cfg.out_path.display()))]
pub fn encode_video<I>(frames: I, cfg: &EncodeConfig) -> ReelResult<OutputVideo>
where
    I: IntoIterator<Item = ReelResult<(FrameIndex, FrameRGBA)>>,
{
    cfg.validate()?;
    if !is_ffmpeg_on_path() {
        return Err(ReelError::encode(
            "ffmpeg is required for MP4 encoding, but was not found on PATH",
        ));
    }

    let silent = TempFileGuard(Some(temp_video_path()));
    let silent_path = silent.path().to_path_buf();

    let mut enc = FfmpegEncoder::new(cfg.canvas(), cfg.fps, &silent_path, cfg.bg_rgba)?;
    let mut written = 0u64;
    for item in frames {
        let (idx, frame) = item?;
        enc.encode_frame(idx, &frame)?;
        written += 1;
    }
    enc.finish()?;
    if written == 0 {
        return Err(ReelError::encode("no frames to encode"));
    }
    tracing::debug!(frames = written, "silent video written");

    ensure_parent_dir(&cfg.out_path)?;
    if let Err(e) = mux_audio(&silent_path, &cfg.audio_path, &cfg.out_path) {
        let _ = std::fs::remove_file(&cfg.out_path);
        return Err(e);
    }
    drop(silent);

    let out = OutputVideo {
        path: cfg.out_path.clone(),
        fps: cfg.fps,
        width: cfg.width,
        height: cfg.height,
        codec: VIDEO_CODEC.to_string(),
        has_audio: true,
        frames: written,
        duration_secs: cfg.fps.frames_to_secs(written),
    };
    tracing::info!(
        path = %out.path.display(),
        frames = out.frames,
        duration_secs = out.duration_secs,
        "video encoded"
    );
    Ok(out)
}

/// Streams raw RGBA frames into a silent H.264 MP4 through the system `ffmpeg`.
pub struct FfmpegEncoder {
    canvas: Canvas,
    bg_rgba: [u8; 4],
    child: Child,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,
    scratch: Vec<u8>,
    last_idx: Option<FrameIndex>,
}

impl FfmpegEncoder {
    pub fn new(canvas: Canvas, fps: Fps, out_path: &Path, bg_rgba: [u8; 4]) -> ReelResult<Self> {
        ensure_parent_dir(out_path)?;

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        // Input: opaque RGBA8 frames (flattened in `encode_frame`).
        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", canvas.width, canvas.height),
            "-r",
            &format!("{}/{}", fps.num, fps.den),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ])
        .arg(out_path);

        let mut child = cmd.spawn().map_err(|e| {
            ReelError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ReelError::encode("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| ReelError::encode("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut bytes = Vec::new();
            stderr.read_to_end(&mut bytes)?;
            Ok(bytes)
        });

        Ok(Self {
            canvas,
            bg_rgba,
            child,
            stdin: Some(stdin),
            stderr_drain: Some(stderr_drain),
            scratch: vec![0u8; canvas.byte_len()],
            last_idx: None,
        })
    }

    /// Write one frame. Indices must strictly increase.
    pub fn encode_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ReelResult<()> {
        check_frame_order(self.last_idx, idx)?;
        self.last_idx = Some(idx);

        if frame.width != self.canvas.width || frame.height != self.canvas.height {
            return Err(ReelError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.canvas.width, self.canvas.height
            )));
        }
        flatten_to_opaque_rgba8(
            &mut self.scratch,
            &frame.data,
            frame.premultiplied,
            self.bg_rgba,
        )?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(ReelError::encode("ffmpeg encoder is already finalized"));
        };
        use std::io::Write as _;
        if let Err(e) = stdin.write_all(&self.scratch) {
            // ffmpeg closed its input early; its stderr says why.
            let diag = self.collect_failure();
            return Err(ReelError::encode(format!(
                "failed to write frame to ffmpeg stdin: {e}{diag}"
            )));
        }
        Ok(())
    }

    pub fn finish(mut self) -> ReelResult<()> {
        drop(self.stdin.take());
        let status = self
            .child
            .wait()
            .map_err(|e| ReelError::encode(format!("failed to wait for ffmpeg to finish: {e}")))?;
        let stderr = self.join_stderr();
        if !status.success() {
            return Err(ReelError::encode(format!(
                "ffmpeg exited with status {status}: {}",
                stderr.trim()
            )));
        }
        Ok(())
    }

    fn collect_failure(&mut self) -> String {
        drop(self.stdin.take());
        let _ = self.child.wait();
        let stderr = self.join_stderr();
        if stderr.trim().is_empty() {
            String::new()
        } else {
            format!(": {}", stderr.trim())
        }
    }

    fn join_stderr(&mut self) -> String {
        match self.stderr_drain.take().map(|h| h.join()) {
            Some(Ok(Ok(bytes))) => String::from_utf8_lossy(&bytes).into_owned(),
            _ => String::new(),
        }
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        if self.stdin.take().is_some() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Copy the video stream of `video` and encode `audio` as AAC into `out`, trimmed to the shorter
/// of the two.
pub fn mux_audio(video: &Path, audio: &Path, out: &Path) -> ReelResult<()> {
    let output = Command::new("ffmpeg")
        .args(["-y", "-loglevel", "error", "-i"])
        .arg(video)
        .arg("-i")
        .arg(audio)
        .args([
            "-map",
            "0:v:0",
            "-map",
            "1:a:0",
            "-c:v",
            "copy",
            "-c:a",
            "aac",
            "-shortest",
            "-movflags",
            "+faststart",
        ])
        .arg(out)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| ReelError::encode(format!("failed to run ffmpeg for muxing: {e}")))?;

    if !output.status.success() {
        return Err(ReelError::encode(format!(
            "ffmpeg mux exited with status {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(())
}

pub(crate) fn check_frame_order(last: Option<FrameIndex>, idx: FrameIndex) -> ReelResult<()> {
    if let Some(last) = last
        && idx.0 <= last.0
    {
        return Err(ReelError::encode(format!(
            "frames must be encoded in order: got {} after {}",
            idx.0, last.0
        )));
    }
    Ok(())
}

pub(crate) fn flatten_to_opaque_rgba8(
    dst: &mut [u8],
    src: &[u8],
    src_is_premul: bool,
    bg_rgba: [u8; 4],
) -> ReelResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(ReelError::validation(
            "flatten_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let bg = [
        u16::from(bg_rgba[0]),
        u16::from(bg_rgba[1]),
        u16::from(bg_rgba[2]),
    ];
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255 - a;
        for c in 0..3 {
            let fg = if src_is_premul {
                u16::from(s[c])
            } else {
                mul_div255_u16(u16::from(s[c]), a)
            };
            d[c] = (fg + mul_div255_u16(bg[c], inv)).min(255) as u8;
        }
        d[3] = 255;
    }
    Ok(())
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> ReelResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

fn temp_video_path() -> PathBuf {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    std::env::temp_dir().join(format!(
        "introreel_silent_{}_{}_{}.mp4",
        std::process::id(),
        nanos,
        COUNTER.fetch_add(1, Ordering::Relaxed)
    ))
}

/// Removes the file it holds when dropped.
pub(crate) struct TempFileGuard(pub(crate) Option<PathBuf>);

impl TempFileGuard {
    fn path(&self) -> &Path {
        self.0.as_deref().unwrap_or(Path::new(""))
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
