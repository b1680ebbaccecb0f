use crate::config::MouthShape;
use crate::foundation::core::{Rect, Rgba8Premul};
use crate::foundation::math::{opacity_to_u8, premul_over_px};
use crate::layout::timeline::MouthLayer;
use crate::render::surface::FrameRGBA;

/// Canvas rectangle of the mouth at time `t`.
///
/// Height is `ref_h * height * (base + gain * energy)`, at least `min_height_px`, where
/// `energy` comes from the envelope bucket containing `t`. The rectangle then follows the
/// photo's zoom about the photo region's center.
pub fn mouth_rect(layer: &MouthLayer, t: f64) -> Rect {
    let cfg = &layer.config;
    let r = layer.reference;
    let energy = f64::from(layer.envelope.energy_at(t));

    let cx = r.x0 + cfg.center_x * r.width();
    let top = r.y0 + cfg.top_y * r.height();
    let w = cfg.width * r.width();
    let h = (r.height() * cfg.height * (cfg.base + cfg.gain * energy)).max(cfg.min_height_px);

    let z = layer.zoom.at(t);
    let pc = layer.photo_region.center();
    let x0 = pc.x + (cx - w / 2.0 - pc.x) * z;
    let y0 = pc.y + (top - pc.y) * z;
    Rect::new(x0, y0, x0 + w * z, y0 + h * z)
}

/// Fill the mouth shape for time `t`, clipped to the photo region.
pub fn render_mouth(layer: &MouthLayer, frame: &mut FrameRGBA, t: f64, opacity: f32) {
    let rect = mouth_rect(layer, t);
    let [r, g, b, a] = layer.config.color;
    let color = Rgba8Premul::from_straight_rgba(r, g, b, a).to_array();
    let op = opacity_to_u8(opacity);
    if op == 0 || color[3] == 0 {
        return;
    }

    let clip = layer.photo_region.intersect(frame.canvas().rect());
    let y_start = rect.y0.max(clip.y0).floor().max(0.0) as u32;
    let y_end = rect.y1.min(clip.y1).ceil().max(0.0) as u32;
    let (cx, cy) = (rect.center().x, rect.center().y);
    let (ax, ay) = (rect.width() / 2.0, rect.height() / 2.0);

    for y in y_start..y_end.min(frame.height) {
        let py = f64::from(y) + 0.5;
        if py < rect.y0 || py >= rect.y1 {
            continue;
        }
        let (sx0, sx1) = match layer.config.shape {
            MouthShape::Rect => (rect.x0, rect.x1),
            MouthShape::Ellipse => {
                let dy = (py - cy) / ay;
                let half = ax * (1.0 - dy * dy).max(0.0).sqrt();
                (cx - half, cx + half)
            }
        };
        // Pixel centers inside [sx0, sx1).
        let x_start = (sx0.max(clip.x0) - 0.5).ceil().max(0.0) as u32;
        let x_end = (sx1.min(clip.x1) - 0.5).ceil().max(0.0) as u32;
        let x_end = x_end.min(frame.width);
        if x_start >= x_end {
            continue;
        }
        let row = y as usize * frame.width as usize;
        for x in x_start..x_end {
            let i = (row + x as usize) * 4;
            let d = [
                frame.data[i],
                frame.data[i + 1],
                frame.data[i + 2],
                frame.data[i + 3],
            ];
            frame.data[i..i + 4].copy_from_slice(&premul_over_px(d, color, op));
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/mouth.rs"]
mod tests;
