use super::*;

fn canvas(w: u32, h: u32) -> Canvas {
    Canvas {
        width: w,
        height: h,
    }
}

fn view(data: &[u8], width: u32, height: u32) -> ImageView<'_> {
    ImageView {
        width,
        height,
        data,
    }
}

#[test]
fn new_frame_is_transparent_and_premultiplied() {
    let f = FrameRGBA::new(canvas(3, 2));
    assert_eq!(f.data.len(), 24);
    assert!(f.premultiplied);
    assert!(f.data.iter().all(|&b| b == 0));
}

#[test]
fn blit_clips_to_frame_bounds() {
    let mut f = FrameRGBA::new(canvas(4, 4));
    let red = [255u8, 0, 0, 255].repeat(4);
    f.blit_over(view(&red, 2, 2), -1, 3, 1.0, None).unwrap();
    assert_eq!(f.pixel(0, 3), [255, 0, 0, 255]);
    assert_eq!(f.pixel(1, 3), [0, 0, 0, 0]);
    assert_eq!(f.pixel(0, 2), [0, 0, 0, 0]);
}

#[test]
fn blit_respects_clip_rect_and_opacity() {
    let mut f = FrameRGBA::new(canvas(4, 1));
    let white = [255u8, 255, 255, 255].repeat(4);
    f.blit_over(view(&white, 4, 1), 0, 0, 0.5, Some([1, 0, 3, 1])).unwrap();
    assert_eq!(f.pixel(0, 0), [0, 0, 0, 0]);
    assert_eq!(f.pixel(1, 0), [128, 128, 128, 128]);
    assert_eq!(f.pixel(3, 0), [0, 0, 0, 0]);
}

#[test]
fn blit_rejects_bad_source_length() {
    let mut f = FrameRGBA::new(canvas(2, 2));
    assert!(f.blit_over(view(&[0u8; 7], 1, 2), 0, 0, 1.0, None).is_err());
}
