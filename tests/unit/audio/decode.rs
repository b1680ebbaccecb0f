use std::path::PathBuf;

use super::*;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("audio_decode_unit").join(name);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_wav(path: &Path, sample_rate: u32, channels: u16, frames: usize, value: i16) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut w = hound::WavWriter::create(path, spec).unwrap();
    for _ in 0..frames * usize::from(channels) {
        w.write_sample(value).unwrap();
    }
    w.finalize().unwrap();
}

#[test]
fn downmix_averages_channels() {
    let mono = downmix_to_mono(&[1.0, 0.0, 0.5, 0.5, -1.0, 1.0], 2);
    assert_eq!(mono, vec![0.5, 0.5, 0.0]);
    assert_eq!(downmix_to_mono(&[0.25, 0.75], 1), vec![0.25, 0.75]);
}

#[test]
fn resample_length_is_rounded_ratio() {
    let src = vec![0.0f32; 44_100];
    assert_eq!(resample_linear(&src, 44_100, 16_000).len(), 16_000);
    assert_eq!(resample_linear(&src[..3], 3, 2).len(), 2);
    assert_eq!(resample_linear(&[], 48_000, 16_000).len(), 0);
}

#[test]
fn resample_interpolates_between_samples() {
    let up = resample_linear(&[0.0, 1.0], 1, 2);
    assert_eq!(up.len(), 4);
    assert!((up[1] - 0.5).abs() < 1e-6);
    assert!((up[3] - 1.0).abs() < 1e-6);
}

#[test]
fn wav_decodes_to_canonical_rate_and_duration() {
    let dir = scratch_dir("stereo_44k");
    let p = dir.join("tone.wav");
    write_wav(&p, 44_100, 2, 44_100 * 2, 8_000);

    let pcm = decode_mono(&p, 16_000, false).unwrap();
    assert_eq!(pcm.sample_rate, 16_000);
    assert_eq!(pcm.samples.len(), 32_000);
    assert!((pcm.duration_secs() - 2.0).abs() < 1e-9);
    let expected = 8_000.0 / 32_768.0;
    assert!((pcm.samples[100] - expected).abs() < 1e-3);
}

#[test]
fn zero_length_wav_is_a_decode_error() {
    let dir = scratch_dir("empty_wav");
    let p = dir.join("empty.wav");
    write_wav(&p, 16_000, 1, 0, 0);
    let err = decode_mono(&p, 16_000, false).unwrap_err();
    assert!(matches!(err, ReelError::AudioDecode(_)));
}

#[test]
fn garbage_without_ffmpeg_is_a_decode_error() {
    let dir = scratch_dir("garbage");
    let p = dir.join("voice.xyz");
    std::fs::write(&p, b"this is not audio at all, just bytes").unwrap();
    let err = decode_mono(&p, 16_000, false).unwrap_err();
    assert!(matches!(err, ReelError::AudioDecode(_)));
}
