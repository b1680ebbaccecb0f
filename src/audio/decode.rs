use std::fs::File;
use std::io;
use std::path::Path;

use symphonia::core::{
    audio::SampleBuffer, codecs::DecoderOptions, errors::Error, formats::FormatOptions,
    io::MediaSourceStream, meta::MetadataOptions, probe::Hint,
};

use crate::assets::media;
use crate::foundation::error::{ReelError, ReelResult};

#[derive(Clone, Debug)]
/// Mono PCM at a known sample rate.
pub struct MonoPcm {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Samples, nominally in `[-1, 1]`.
    pub samples: Vec<f32>,
}

impl MonoPcm {
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }
}

/// Decode `path` to mono PCM at `sample_rate`.
///
/// Tries the in-process decoder first. Formats it cannot probe go through `ffmpeg` when
/// `ffmpeg_available` is set.
pub fn decode_mono(path: &Path, sample_rate: u32, ffmpeg_available: bool) -> ReelResult<MonoPcm> {
    if sample_rate == 0 {
        return Err(ReelError::validation("canonical sample rate must be non-zero"));
    }

    let pcm = match decode_with_symphonia(path) {
        Ok(decoded) => {
            let mono = downmix_to_mono(&decoded.interleaved, decoded.channels);
            MonoPcm {
                sample_rate,
                samples: resample_linear(&mono, decoded.sample_rate, sample_rate),
            }
        }
        Err(SymphoniaFailure::Unsupported(msg)) if ffmpeg_available => {
            tracing::debug!(%msg, "in-process decoder rejected audio, using ffmpeg");
            MonoPcm {
                sample_rate,
                samples: media::decode_audio_f32_mono(path, sample_rate)?,
            }
        }
        Err(SymphoniaFailure::Unsupported(msg)) => {
            return Err(ReelError::audio_decode(format!(
                "unsupported audio format '{}' ({msg}); install ffmpeg for more formats",
                path.display()
            )));
        }
        Err(SymphoniaFailure::Broken(msg)) => {
            return Err(ReelError::audio_decode(format!(
                "failed to decode '{}': {msg}",
                path.display()
            )));
        }
    };

    if pcm.samples.is_empty() {
        return Err(ReelError::audio_decode(format!(
            "'{}' decoded to a zero-length signal",
            path.display()
        )));
    }
    Ok(pcm)
}

struct Decoded {
    interleaved: Vec<f32>,
    channels: usize,
    sample_rate: u32,
}

enum SymphoniaFailure {
    /// Container or codec not recognized.
    Unsupported(String),
    /// Recognized but unreadable.
    Broken(String),
}

fn decode_with_symphonia(path: &Path) -> Result<Decoded, SymphoniaFailure> {
    let file = File::open(path).map_err(|e| SymphoniaFailure::Broken(e.to_string()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| SymphoniaFailure::Unsupported(e.to_string()))?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| SymphoniaFailure::Unsupported("no default audio track".to_string()))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let sample_rate = codec_params
        .sample_rate
        .filter(|&r| r > 0)
        .ok_or_else(|| SymphoniaFailure::Broken("audio track missing sample rate".to_string()))?;
    let channels = codec_params.channels.map(|c| c.count()).unwrap_or(1).max(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| SymphoniaFailure::Unsupported(e.to_string()))?;

    let mut interleaved: Vec<f32> = Vec::new();
    loop {
        match format.next_packet() {
            Ok(packet) => {
                if packet.track_id() != track_id {
                    continue;
                }
                let decoded = match decoder.decode(&packet) {
                    Ok(buf) => buf,
                    Err(Error::DecodeError(_)) => continue,
                    Err(err) => return Err(SymphoniaFailure::Broken(err.to_string())),
                };
                let mut sample_buf =
                    SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
                sample_buf.copy_interleaved_ref(decoded);
                interleaved.extend_from_slice(sample_buf.samples());
            }
            Err(Error::IoError(err)) if err.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(Error::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(Error::DecodeError(_)) => continue,
            Err(err) => return Err(SymphoniaFailure::Broken(err.to_string())),
        }
    }

    Ok(Decoded {
        interleaved,
        channels,
        sample_rate,
    })
}

/// Average interleaved channels into one.
pub fn downmix_to_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    let inv = 1.0 / channels as f32;
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() * inv)
        .collect()
}

/// Linear-interpolation resampler. Output length is `round(len * to / from)`.
pub fn resample_linear(src: &[f32], from: u32, to: u32) -> Vec<f32> {
    if from == to || src.is_empty() {
        return src.to_vec();
    }
    let out_len = ((src.len() as u128 * u128::from(to) + u128::from(from) / 2) / u128::from(from))
        as usize;
    let step = f64::from(from) / f64::from(to);
    let last = src.len() - 1;

    (0..out_len)
        .map(|i| {
            let pos = i as f64 * step;
            let i0 = (pos.floor() as usize).min(last);
            let i1 = (i0 + 1).min(last);
            let frac = (pos - i0 as f64) as f32;
            src[i0] + (src[i1] - src[i0]) * frac
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/audio/decode.rs"]
mod tests;
