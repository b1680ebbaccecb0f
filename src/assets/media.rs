use std::io::Read as _;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{ReelError, ReelResult};

#[derive(Clone, Debug)]
/// Basic metadata about a source video file.
pub struct VideoSourceInfo {
    /// Source path used for probing/decoding.
    pub source_path: PathBuf,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Container duration in seconds, when ffprobe reports one.
    pub duration_secs: Option<f64>,
    /// Whether ffprobe detected at least one audio stream.
    pub has_audio: bool,
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    tool_runs("ffmpeg")
}

/// Return `true` when `ffprobe` can be invoked from `PATH`.
pub fn is_ffprobe_on_path() -> bool {
    tool_runs("ffprobe")
}

fn tool_runs(program: &str) -> bool {
    Command::new(program)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Probe source video metadata through `ffprobe`.
pub fn probe_video(source_path: &Path) -> ReelResult<VideoSourceInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| ReelError::validation(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(ReelError::validation(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| ReelError::validation(format!("ffprobe json parse failed: {e}")))?;
    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| ReelError::validation("no video stream found"))?;
    let width = video_stream
        .width
        .ok_or_else(|| ReelError::validation("missing video width from ffprobe"))?;
    let height = video_stream
        .height
        .ok_or_else(|| ReelError::validation("missing video height from ffprobe"))?;
    let has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));
    let duration_secs = parsed
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok());

    Ok(VideoSourceInfo {
        source_path: source_path.to_path_buf(),
        width,
        height,
        duration_secs,
        has_audio,
    })
}

/// Decode any audio `ffmpeg` understands to mono `f32` PCM at `sample_rate`.
pub fn decode_audio_f32_mono(path: &Path, sample_rate: u32) -> ReelResult<Vec<f32>> {
    let out = Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            "1",
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| {
            ReelError::audio_decode(format!("failed to run ffmpeg for audio decode: {e}"))
        })?;

    if !out.status.success() {
        return Err(ReelError::audio_decode(format!(
            "ffmpeg audio decode failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    if !out.stdout.len().is_multiple_of(4) {
        return Err(ReelError::audio_decode(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    Ok(out
        .stdout
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Sequential reader over the frames of a video, resampled to `fps` and scaled to `size`.
///
/// Backed by one long-lived `ffmpeg` process. Requests must normally move forward; asking for an
/// earlier frame restarts the process. Past the end of the source the last frame is repeated.
pub struct VideoFrameStream {
    path: PathBuf,
    fps: Fps,
    size: Canvas,
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    next_index: u64,
    current: Option<Vec<u8>>,
    scratch: Vec<u8>,
    exhausted: bool,
}

impl VideoFrameStream {
    pub fn new(path: impl Into<PathBuf>, fps: Fps, size: Canvas) -> ReelResult<Self> {
        if size.width == 0 || size.height == 0 {
            return Err(ReelError::validation(
                "video frame stream size must be non-zero",
            ));
        }
        Ok(Self {
            path: path.into(),
            fps,
            size,
            child: None,
            stdout: None,
            next_index: 0,
            current: None,
            scratch: Vec::new(),
            exhausted: false,
        })
    }

    pub fn size(&self) -> Canvas {
        self.size
    }

    /// Opaque RGBA8 pixels of frame `index` (`None` if the source has no frames at all).
    pub fn frame(&mut self, index: u64) -> ReelResult<Option<&[u8]>> {
        let want_next = index + 1;
        if self.current.is_some() && want_next < self.next_index {
            self.restart();
        }
        while self.next_index < want_next && !self.exhausted {
            self.read_next()?;
        }
        Ok(self.current.as_deref())
    }

    fn restart(&mut self) {
        self.shutdown();
        self.next_index = 0;
        self.current = None;
        self.exhausted = false;
    }

    fn spawn(&mut self) -> ReelResult<()> {
        let filter = format!(
            "fps={}/{},scale={}:{}",
            self.fps.num, self.fps.den, self.size.width, self.size.height
        );
        let mut child = Command::new("ffmpeg")
            .args(["-v", "error", "-i"])
            .arg(&self.path)
            .args([
                "-an", "-vf", &filter, "-f", "rawvideo", "-pix_fmt", "rgba", "pipe:1",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                ReelError::validation(format!(
                    "failed to spawn ffmpeg for '{}': {e}",
                    self.path.display()
                ))
            })?;
        self.stdout = child.stdout.take();
        self.child = Some(child);
        Ok(())
    }

    fn read_next(&mut self) -> ReelResult<()> {
        if self.stdout.is_none() {
            self.spawn()?;
        }
        let Some(stdout) = self.stdout.as_mut() else {
            return Err(ReelError::validation("ffmpeg stdout unavailable (unexpected)"));
        };

        if self.scratch.len() != self.size.byte_len() {
            self.scratch = vec![0u8; self.size.byte_len()];
        }
        match stdout.read_exact(&mut self.scratch) {
            Ok(()) => {
                let mut frame = self.current.take().unwrap_or_default();
                std::mem::swap(&mut frame, &mut self.scratch);
                self.current = Some(frame);
                self.next_index += 1;
            }
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                self.exhausted = true;
                self.shutdown();
            }
            Err(e) => {
                return Err(ReelError::validation(format!(
                    "failed reading frames from '{}': {e}",
                    self.path.display()
                )));
            }
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        drop(self.stdout.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl Drop for VideoFrameStream {
    fn drop(&mut self) {
        self.shutdown();
    }
}

