use crate::audio::decode::MonoPcm;
use crate::foundation::error::{ReelError, ReelResult};

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
/// One envelope bucket.
pub struct EnvelopeSample {
    /// Bucket start time in seconds (`index / rate`).
    pub timestamp: f64,
    /// Normalized RMS energy in `[0, 1]`.
    pub energy: f32,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
/// Coarse per-frame loudness of the voice track.
///
/// This only says "how loud is the speaker right now". It is not aligned to phonemes and
/// drives nothing more precise than an opening/closing mouth shape.
pub struct AudioEnvelope {
    /// Buckets per second.
    pub rate: f64,
    /// Buckets in time order.
    pub samples: Vec<EnvelopeSample>,
}

impl AudioEnvelope {
    /// Partition `pcm` into `round(duration * rate)` equal chunks and take the RMS of each,
    /// normalized by the loudest chunk. A silent signal gives all-zero energies.
    pub fn from_pcm(pcm: &MonoPcm, rate: f64) -> ReelResult<Self> {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(ReelError::validation("envelope rate must be > 0"));
        }
        let n = pcm.samples.len();
        if n == 0 {
            return Err(ReelError::audio_decode(
                "cannot build an envelope from a zero-length signal",
            ));
        }

        let bucket_count = (pcm.duration_secs() * rate).round().max(0.0) as usize;
        let mut rms = Vec::with_capacity(bucket_count);
        for i in 0..bucket_count {
            let start = i * n / bucket_count;
            let end = (i + 1) * n / bucket_count;
            rms.push(chunk_rms(&pcm.samples[start..end]));
        }

        let peak = rms.iter().copied().fold(0.0f32, f32::max);
        let samples = rms
            .into_iter()
            .enumerate()
            .map(|(i, e)| EnvelopeSample {
                timestamp: i as f64 / rate,
                energy: if peak > 0.0 {
                    (e / peak).clamp(0.0, 1.0)
                } else {
                    0.0
                },
            })
            .collect();

        Ok(Self { rate, samples })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Energy of the bucket containing `t`, clamped to the first/last bucket.
    pub fn energy_at(&self, t: f64) -> f32 {
        if self.samples.is_empty() || !t.is_finite() {
            return 0.0;
        }
        let idx = (t * self.rate).floor().max(0.0) as usize;
        self.samples[idx.min(self.samples.len() - 1)].energy
    }
}

fn chunk_rms(chunk: &[f32]) -> f32 {
    if chunk.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = chunk.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
    (sum_sq / chunk.len() as f64).sqrt() as f32
}

#[cfg(test)]
#[path = "../../tests/unit/audio/envelope.rs"]
mod tests;
