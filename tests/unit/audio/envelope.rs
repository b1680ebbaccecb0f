use super::*;

fn pcm(samples: Vec<f32>, sample_rate: u32) -> MonoPcm {
    MonoPcm {
        sample_rate,
        samples,
    }
}

#[test]
fn length_matches_rounded_duration_times_rate() {
    for (n, sr, rate) in [
        (16_000usize, 16_000u32, 24.0f64),
        (16_001, 16_000, 24.0),
        (15_300, 16_000, 30.0),
        (100, 16_000, 24.0),
    ] {
        let env = AudioEnvelope::from_pcm(&pcm(vec![0.1; n], sr), rate).unwrap();
        let expected = ((n as f64 / f64::from(sr)) * rate).round() as usize;
        assert_eq!(env.len(), expected, "n={n} rate={rate}");
    }
}

#[test]
fn timestamps_increase_and_energy_is_normalized() {
    let mut samples = vec![0.0f32; 1_600];
    for s in samples.iter_mut().skip(800) {
        *s = 0.5;
    }
    for s in samples.iter_mut().skip(1_200) {
        *s = -1.0;
    }
    let env = AudioEnvelope::from_pcm(&pcm(samples, 1_600), 4.0).unwrap();
    assert_eq!(env.len(), 4);
    assert!(env.samples.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    assert_eq!(env.samples[0].energy, 0.0);
    assert!((env.samples[2].energy - 0.5).abs() < 1e-6);
    assert_eq!(env.samples[3].energy, 1.0);
    assert!(env.samples.iter().all(|s| (0.0..=1.0).contains(&s.energy)));
}

#[test]
fn silence_gives_all_zero_energy() {
    let env = AudioEnvelope::from_pcm(&pcm(vec![0.0; 32_000], 16_000), 24.0).unwrap();
    assert_eq!(env.len(), 48);
    assert!(env.samples.iter().all(|s| s.energy == 0.0));
}

#[test]
fn zero_length_is_decode_error() {
    let err = AudioEnvelope::from_pcm(&pcm(Vec::new(), 16_000), 24.0).unwrap_err();
    assert!(matches!(err, ReelError::AudioDecode(_)));
}

#[test]
fn energy_at_picks_containing_bucket_and_clamps() {
    let env = AudioEnvelope {
        rate: 2.0,
        samples: vec![
            EnvelopeSample {
                timestamp: 0.0,
                energy: 0.1,
            },
            EnvelopeSample {
                timestamp: 0.5,
                energy: 0.9,
            },
        ],
    };
    assert_eq!(env.energy_at(0.0), 0.1);
    assert_eq!(env.energy_at(0.49), 0.1);
    assert_eq!(env.energy_at(0.5), 0.9);
    assert_eq!(env.energy_at(10.0), 0.9);
    assert_eq!(env.energy_at(-3.0), 0.1);
}

#[test]
fn analysis_is_deterministic() {
    let samples: Vec<f32> = (0..8_000).map(|i| ((i as f32) * 0.01).sin()).collect();
    let a = AudioEnvelope::from_pcm(&pcm(samples.clone(), 16_000), 24.0).unwrap();
    let b = AudioEnvelope::from_pcm(&pcm(samples, 16_000), 24.0).unwrap();
    assert_eq!(a, b);
}
