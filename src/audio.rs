pub mod decode;
pub mod envelope;

use std::sync::Arc;

use crate::assets::loader::MediaAsset;
use crate::audio::decode::decode_mono;
use crate::audio::envelope::AudioEnvelope;
use crate::foundation::core::Fps;
use crate::foundation::error::{AssetKind, ReelError, ReelResult};

#[derive(Clone, Debug)]
/// What the rest of the pipeline needs to know about the voice track.
pub struct AudioAnalysis {
    /// Length of the decoded voice track; this is the length of the output video.
    pub duration_secs: f64,
    /// One bucket per output frame.
    pub envelope: Arc<AudioEnvelope>,
}

/// Decode the voice track and compute its energy envelope at the video frame rate.
#[tracing::instrument(skip(audio), fields(path = %audio.path.display()))]
pub fn analyze(
    audio: &MediaAsset,
    sample_rate: u32,
    fps: Fps,
    ffmpeg_available: bool,
) -> ReelResult<AudioAnalysis> {
    if audio.kind != AssetKind::Audio {
        return Err(ReelError::validation(format!(
            "expected an audio asset, got {}",
            audio.kind
        )));
    }

    let pcm = decode_mono(&audio.path, sample_rate, ffmpeg_available)?;
    let duration_secs = pcm.duration_secs();
    let envelope = AudioEnvelope::from_pcm(&pcm, fps.as_f64())?;

    tracing::info!(
        duration_secs,
        buckets = envelope.len(),
        "audio analyzed"
    );
    Ok(AudioAnalysis {
        duration_secs,
        envelope: Arc::new(envelope),
    })
}
