use std::path::PathBuf;
use std::sync::Arc;

use super::*;
use crate::assets::decode::PreparedImage;
use crate::assets::loader::MediaAsset;
use crate::foundation::error::AssetKind;

fn photo(w: u32, h: u32) -> PhotoAsset {
    PhotoAsset {
        asset: MediaAsset {
            kind: AssetKind::Photo,
            path: PathBuf::from("photo.png"),
            validated: true,
        },
        image: PreparedImage {
            width: w,
            height: h,
            rgba8_premul: Arc::new(vec![255; (w * h * 4) as usize]),
        },
    }
}

struct Fixed(ReelResult<Option<FaceBox>>);

impl FaceDetector for Fixed {
    fn detect(&self, _photo: &PhotoAsset) -> ReelResult<Option<FaceBox>> {
        match &self.0 {
            Ok(v) => Ok(*v),
            Err(e) => Err(ReelError::validation(e.to_string())),
        }
    }
}

#[test]
fn parse_face_box_accepts_object_and_null() {
    let b = parse_face_box(br#"{"x": 10, "y": 20.5, "width": 30, "height": 40}"#)
        .unwrap()
        .unwrap();
    assert_eq!(b.y, 20.5);
    assert_eq!(b.height, 40.0);
    assert!(parse_face_box(b"null\n").unwrap().is_none());
    assert!(parse_face_box(b"not json").is_err());
}

#[test]
fn face_box_is_clamped_to_the_photo() {
    let b = FaceBox {
        x: -10.0,
        y: 50.0,
        width: 40.0,
        height: 100.0,
    };
    let c = b.clamped_to(100, 120).unwrap();
    assert_eq!((c.x, c.y, c.width, c.height), (0.0, 50.0, 30.0, 70.0));

    let outside = FaceBox {
        x: 200.0,
        y: 0.0,
        width: 10.0,
        height: 10.0,
    };
    assert!(outside.clamped_to(100, 100).is_none());
}

#[test]
fn detector_results_never_fail_capability_detection() {
    let cfg = PipelineConfig::default();
    let p = photo(64, 48);

    let found = Fixed(Ok(Some(FaceBox {
        x: 8.0,
        y: 8.0,
        width: 16.0,
        height: 16.0,
    })));
    let caps = Capabilities::probe_with(&cfg, &p, Some(&found), false, false);
    assert_eq!(caps.face.map(|f| f.width), Some(16.0));

    let none = Fixed(Ok(None));
    assert!(
        Capabilities::probe_with(&cfg, &p, Some(&none), false, false)
            .face
            .is_none()
    );

    let broken = Fixed(Err(ReelError::validation("model missing")));
    assert!(
        Capabilities::probe_with(&cfg, &p, Some(&broken), false, false)
            .face
            .is_none()
    );
}

#[test]
fn missing_lipsync_video_falls_back() {
    let cfg = PipelineConfig {
        lipsync_video: Some(PathBuf::from("target/capability_unit/does_not_exist.mp4")),
        ..PipelineConfig::default()
    };
    let caps = Capabilities::probe_with(&cfg, &photo(4, 4), None, true, true);
    assert!(caps.lipsync_video.is_none());
    assert!(caps.face.is_none());
}

#[test]
fn missing_detector_program_is_an_error_not_a_panic() {
    let det = CommandFaceDetector::new("target/capability_unit/no-such-detector");
    assert!(det.detect(&photo(4, 4)).is_err());
}
