//! Procedural backgrounds.
//!
//! Every style is separable: one table per row and one per column are evaluated for the frame
//! and combined per pixel with adds and multiplies only.

use crate::config::BackgroundStyle;
use crate::foundation::math::clamp01;
use crate::render::surface::FrameRGBA;

/// Overwrite `frame` with the opaque background for time `t` of a `total`-second video.
pub fn render_background(style: BackgroundStyle, frame: &mut FrameRGBA, t: f64, total: f64) {
    let w = frame.width as usize;
    let h = frame.height as usize;
    if w == 0 || h == 0 {
        return;
    }
    let p = if total > 0.0 {
        clamp01(t / total)
    } else {
        0.0
    };

    let (rows, cols) = tables(style, w, h, t, p);
    for (y, row_px) in frame.data.chunks_exact_mut(w * 4).enumerate() {
        let r = rows[y];
        match &cols {
            None => {
                let px = [to_u8(r[0]), to_u8(r[1]), to_u8(r[2]), 255];
                for d in row_px.chunks_exact_mut(4) {
                    d.copy_from_slice(&px);
                }
            }
            Some(cols) => {
                for (d, c) in row_px.chunks_exact_mut(4).zip(cols) {
                    d[0] = to_u8(r[0] + c[0]);
                    d[1] = to_u8(r[1] + c[1]);
                    d[2] = to_u8(r[2] + c[2]);
                    d[3] = 255;
                }
            }
        }
    }
}

type Rgb = [f32; 3];

/// Per-row base color and optional per-column additive term.
fn tables(
    style: BackgroundStyle,
    w: usize,
    h: usize,
    t: f64,
    p: f64,
) -> (Vec<Rgb>, Option<Vec<Rgb>>) {
    let hf = h as f64;
    match style {
        BackgroundStyle::Gradient => {
            let peak = 30.0 + 50.0 * p;
            let rows = (0..h)
                .map(|y| {
                    let i = peak * (1.0 - y as f64 / hf);
                    [(i / 3.0) as f32, (i / 2.0) as f32, i as f32]
                })
                .collect();
            (rows, None)
        }
        BackgroundStyle::Drift => {
            let rows = (0..h)
                .map(|y| {
                    let i = 20.0 + 60.0 * (1.0 - y as f64 / hf);
                    [(i / 4.0) as f32, (i / 3.0) as f32, i as f32]
                })
                .collect();
            let shift = 10.0 * (0.5 * t).sin();
            let cols = (0..w)
                .map(|x| {
                    let s = (8.0 * (0.02 * (x as f64 + shift)).sin()) as f32;
                    [s * 0.25, s / 3.0, s]
                })
                .collect();
            (rows, Some(cols))
        }
        BackgroundStyle::Neural => {
            let rows = (0..h)
                .map(|y| {
                    let v = ((0.01 * y as f64 + 1.5 * p).cos() / 2.0 + 0.5) as f32;
                    [20.0 + 40.0 * v, 30.0 + 50.0 * v, 50.0 + 60.0 * v]
                })
                .collect();
            let cols = (0..w)
                .map(|x| {
                    let v = ((0.01 * x as f64 + 2.0 * p).sin() / 2.0) as f32;
                    [40.0 * v, 50.0 * v, 60.0 * v]
                })
                .collect();
            (rows, Some(cols))
        }
    }
}

fn to_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/render/background.rs"]
mod tests;
