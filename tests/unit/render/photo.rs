use std::sync::Arc;

use super::*;
use crate::foundation::core::Canvas;

fn striped(w: u32, h: u32) -> PreparedImage {
    let mut data = Vec::with_capacity((w * h * 4) as usize);
    for _y in 0..h {
        for x in 0..w {
            let v = (x * 255 / (w - 1)) as u8;
            data.extend_from_slice(&[v, v, v, 255]);
        }
    }
    PreparedImage {
        width: w,
        height: h,
        rgba8_premul: Arc::new(data),
    }
}

#[test]
fn identity_zoom_maps_each_pixel_to_itself() {
    let mut idx = Vec::new();
    zoom_indices(&mut idx, 6, 1.0);
    assert_eq!(idx, vec![0, 1, 2, 3, 4, 5]);
}

#[test]
fn zoom_pulls_edges_towards_center() {
    let mut idx = Vec::new();
    zoom_indices(&mut idx, 10, 2.0);
    assert_eq!(idx.first(), Some(&2));
    assert_eq!(idx.last(), Some(&7));
    assert!(idx.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn photo_lands_in_its_region_only() {
    let mut frame = FrameRGBA::new(Canvas {
        width: 20,
        height: 10,
    });
    let mut r = PhotoRenderer::new(&striped(8, 8), Rect::new(0.0, 2.0, 8.0, 10.0)).unwrap();
    r.render(&mut frame, 1.0, 1.0).unwrap();
    assert_eq!(frame.pixel(0, 2), [0, 0, 0, 255]);
    assert_eq!(frame.pixel(7, 9), [255, 255, 255, 255]);
    assert_eq!(frame.pixel(0, 1), [0, 0, 0, 0]);
    assert_eq!(frame.pixel(8, 5), [0, 0, 0, 0]);
}

#[test]
fn zoomed_photo_crops_the_edges() {
    let mut frame = FrameRGBA::new(Canvas {
        width: 8,
        height: 8,
    });
    let mut r = PhotoRenderer::new(&striped(8, 8), Rect::new(0.0, 0.0, 8.0, 8.0)).unwrap();
    r.render(&mut frame, 1.5, 1.0).unwrap();
    // Leftmost column now shows source column 1, no longer pure black.
    assert!(frame.pixel(0, 4)[0] > 0);
    assert!(frame.pixel(7, 4)[0] < 255);
}
