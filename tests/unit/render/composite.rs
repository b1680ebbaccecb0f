use std::path::PathBuf;
use std::sync::Arc;

use super::*;
use crate::assets::decode::PreparedImage;
use crate::assets::loader::{MediaAsset, PhotoAsset};
use crate::audio::envelope::{AudioEnvelope, EnvelopeSample};
use crate::capability::Capabilities;
use crate::config::{PipelineConfig, TimingConfig};
use crate::foundation::error::AssetKind;
use crate::layout::schedule::schedule;
use crate::layout::timeline::{VisualLayer, build_timeline};

fn white(w: u32, h: u32) -> PreparedImage {
    PreparedImage {
        width: w,
        height: h,
        rgba8_premul: Arc::new(vec![255; (w * h * 4) as usize]),
    }
}

fn small_config() -> PipelineConfig {
    PipelineConfig {
        width: 64,
        height: 36,
        fps: 10,
        ..PipelineConfig::default()
    }
}

fn photo_asset() -> PhotoAsset {
    PhotoAsset {
        asset: MediaAsset {
            kind: AssetKind::Photo,
            path: PathBuf::from("photo.png"),
            validated: true,
        },
        image: white(8, 8),
    }
}

fn full_timeline(total: f64) -> Timeline {
    let cfg = small_config();
    let env = AudioEnvelope {
        rate: 10.0,
        samples: (0..(total * 10.0).round() as usize)
            .map(|i| EnvelopeSample {
                timestamp: i as f64 / 10.0,
                energy: if i % 2 == 0 { 0.2 } else { 0.9 },
            })
            .collect(),
    };
    build_timeline(
        &cfg,
        &photo_asset(),
        &["Hello.".to_string(), "I am testing.".to_string()],
        total,
        Some(Arc::new(env)),
        &Capabilities::default(),
    )
    .unwrap()
}

/// Timeline with a single white photo layer covering the canvas.
fn photo_only(total: f64, fade_in: f64) -> Timeline {
    let canvas = Canvas {
        width: 8,
        height: 8,
    };
    Timeline {
        total_duration: total,
        canvas,
        layers: vec![VisualLayer {
            name: "photo".into(),
            content: LayerContent::Photo {
                image: white(8, 8),
                zoom: ZoomRamp::constant(),
            },
            start: 0.0,
            duration: total,
            position: Position::Region(canvas.rect()),
            fade_in,
            fade_out: 0.0,
            z_order: 1,
        }],
        schedule: schedule(total.max(0.1), 1, 0, &TimingConfig::default()).unwrap(),
    }
}

#[test]
fn frame_count_is_floor_of_duration_times_fps() {
    let fps = Fps::integer(10).unwrap();
    for (total, expected) in [(10.0, 100), (2.05, 20), (2.0999, 20), (0.1, 1)] {
        let c = Compositor::new(&photo_only(total, 0.0), fps).unwrap();
        assert_eq!(c.frame_count(), expected, "total={total}");
    }
}

#[test]
fn zero_frames_is_layout_error() {
    let fps = Fps::integer(10).unwrap();
    let err = Compositor::new(&photo_only(0.05, 0.0), fps).err().unwrap();
    assert!(matches!(err, ReelError::Layout(_)));
}

#[test]
fn frames_iterate_in_order_and_stop() {
    let fps = Fps::integer(10).unwrap();
    let mut c = Compositor::new(&photo_only(1.25, 0.0), fps).unwrap();
    let idx: Vec<u64> = c.frames().map(|r| r.unwrap().0.0).collect();
    assert_eq!(idx, (0..12).collect::<Vec<_>>());
    assert!(c.render_frame(FrameIndex(12)).is_err());
}

#[test]
fn fade_in_scales_layer_opacity() {
    let fps = Fps::integer(10).unwrap();
    let mut c = Compositor::new(&photo_only(2.0, 1.0), fps).unwrap();
    assert_eq!(c.render_frame(FrameIndex(0)).unwrap().pixel(4, 4)[3], 0);
    assert_eq!(c.render_frame(FrameIndex(5)).unwrap().pixel(4, 4)[3], 128);
    assert_eq!(c.render_frame(FrameIndex(15)).unwrap().pixel(4, 4)[3], 255);
}

#[test]
fn full_timeline_frames_are_opaque_and_deterministic() {
    let fps = Fps::integer(10).unwrap();
    let timeline = full_timeline(10.0);
    let mut a = Compositor::new(&timeline, fps).unwrap();
    let mut b = Compositor::new(&timeline, fps).unwrap();
    assert_eq!(a.frame_count(), 100);

    for i in [0u64, 37, 52, 99] {
        let fa = a.render_frame(FrameIndex(i)).unwrap();
        let fb = b.render_frame(FrameIndex(i)).unwrap();
        assert_eq!(fa, fb, "frame {i}");
        assert!(fa.data.chunks_exact(4).all(|px| px[3] == 255));
    }

    // Restarting the sequence yields the same frames again.
    let first: Vec<FrameRGBA> = a.frames().take(3).map(|r| r.unwrap().1).collect();
    let again: Vec<FrameRGBA> = a.frames().take(3).map(|r| r.unwrap().1).collect();
    assert_eq!(first, again);
}

#[test]
fn text_origin_centers_and_anchors_bottom() {
    let canvas = Canvas {
        width: 100,
        height: 50,
    };
    let sprite = Sprite {
        width: 60,
        height: 10,
        data: vec![0; 60 * 10 * 4],
    };
    assert_eq!(
        text_origin(Position::CenterX { y: 7.0 }, canvas, &sprite),
        (20, 7)
    );
    assert_eq!(
        text_origin(Position::BottomCenter { margin: 5.0 }, canvas, &sprite),
        (20, 35)
    );
}

#[test]
fn tall_text_on_a_low_row_stays_on_canvas() {
    let canvas = Canvas {
        width: 1280,
        height: 720,
    };
    // Two wrapped caption lines at 42px: 2 * 52.5 + 32 padding.
    let sprite = Sprite {
        width: 1180,
        height: 137,
        data: vec![0; 1180 * 137 * 4],
    };
    let (_, y) = text_origin(Position::CenterX { y: 600.0 }, canvas, &sprite);
    assert_eq!(y, 720 - 137);

    let huge = Sprite {
        width: 10,
        height: 900,
        data: vec![0; 10 * 900 * 4],
    };
    assert_eq!(text_origin(Position::CenterX { y: 600.0 }, canvas, &huge).1, 0);
}
