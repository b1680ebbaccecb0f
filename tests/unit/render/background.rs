use super::*;
use crate::foundation::core::Canvas;

fn frame(w: u32, h: u32) -> FrameRGBA {
    FrameRGBA::new(Canvas {
        width: w,
        height: h,
    })
}

#[test]
fn gradient_is_brightest_at_top_and_brightens_over_time() {
    let mut f = frame(4, 10);
    render_background(BackgroundStyle::Gradient, &mut f, 0.0, 10.0);
    assert_eq!(f.pixel(0, 0), [10, 15, 30, 255]);
    assert!(f.pixel(0, 9)[2] < f.pixel(0, 0)[2]);
    assert_eq!(f.pixel(0, 3), f.pixel(3, 3));

    let mut late = frame(4, 10);
    render_background(BackgroundStyle::Gradient, &mut late, 10.0, 10.0);
    assert_eq!(late.pixel(0, 0)[2], 80);
}

#[test]
fn every_style_is_opaque_and_deterministic() {
    for style in [
        BackgroundStyle::Gradient,
        BackgroundStyle::Drift,
        BackgroundStyle::Neural,
    ] {
        let mut a = frame(32, 18);
        let mut b = frame(32, 18);
        render_background(style, &mut a, 3.25, 10.0);
        render_background(style, &mut b, 3.25, 10.0);
        assert_eq!(a, b, "{style:?}");
        assert!(a.data.chunks_exact(4).all(|px| px[3] == 255));
    }
}

#[test]
fn drift_shimmer_moves_with_time() {
    let mut a = frame(64, 4);
    let mut b = frame(64, 4);
    render_background(BackgroundStyle::Drift, &mut a, 0.0, 10.0);
    render_background(BackgroundStyle::Drift, &mut b, 3.0, 10.0);
    assert_ne!(a.data, b.data);
}

#[test]
fn neural_varies_across_columns() {
    let mut f = frame(400, 2);
    render_background(BackgroundStyle::Neural, &mut f, 0.0, 10.0);
    assert_ne!(f.pixel(0, 0), f.pixel(157, 0));
}
