use super::*;

fn cfg(width: u32, height: u32, fps: u32) -> EncodeConfig {
    EncodeConfig {
        width,
        height,
        fps: Fps { num: fps, den: 1 },
        out_path: PathBuf::from("target/encode_unit/out.mp4"),
        audio_path: PathBuf::from("target/encode_unit/voice.wav"),
        bg_rgba: [0, 0, 0, 255],
    }
}

#[test]
fn config_validation_catches_bad_values() {
    assert!(cfg(0, 10, 30).validate().is_err());
    assert!(cfg(11, 10, 30).validate().is_err());
    assert!(cfg(10, 10, 0).validate().is_err());
    assert!(cfg(1280, 720, 24).validate().is_ok());
}

#[test]
fn flatten_premul_over_black_produces_expected_rgb() {
    let src = vec![128u8, 0, 0, 128];
    let mut dst = vec![0u8; 4];
    flatten_to_opaque_rgba8(&mut dst, &src, true, [0, 0, 0, 255]).unwrap();
    assert_eq!(dst, vec![128, 0, 0, 255]);
}

#[test]
fn flatten_straight_over_white_produces_expected_rgb() {
    let src = vec![0u8, 0, 0, 0, 255, 0, 0, 128];
    let mut dst = vec![0u8; 8];
    flatten_to_opaque_rgba8(&mut dst, &src, false, [255, 255, 255, 255]).unwrap();
    assert_eq!(dst, vec![255, 255, 255, 255, 255, 127, 127, 255]);
}

#[test]
fn flatten_rejects_mismatched_buffers() {
    let mut dst = vec![0u8; 4];
    assert!(flatten_to_opaque_rgba8(&mut dst, &[0u8; 8], true, [0, 0, 0, 255]).is_err());
}

#[test]
fn frame_order_must_strictly_increase() {
    assert!(check_frame_order(None, FrameIndex(0)).is_ok());
    assert!(check_frame_order(Some(FrameIndex(3)), FrameIndex(4)).is_ok());
    let err = check_frame_order(Some(FrameIndex(4)), FrameIndex(4)).unwrap_err();
    assert!(matches!(err, ReelError::Encode(_)));
    assert!(check_frame_order(Some(FrameIndex(4)), FrameIndex(2)).is_err());
}

#[test]
fn temp_file_guard_removes_file_on_drop() {
    let dir = PathBuf::from("target/encode_unit");
    std::fs::create_dir_all(&dir).unwrap();
    let p = dir.join("guarded.tmp");
    std::fs::write(&p, b"x").unwrap();
    {
        let _g = TempFileGuard(Some(p.clone()));
        assert!(p.exists());
    }
    assert!(!p.exists());
}

#[test]
fn temp_paths_are_unique() {
    assert_ne!(temp_video_path(), temp_video_path());
}

#[test]
fn ensure_parent_dir_creates_nested_dirs() {
    let p = PathBuf::from("target/encode_unit/nested/a/b/out.mp4");
    ensure_parent_dir(&p).unwrap();
    assert!(p.parent().unwrap().is_dir());
    ensure_parent_dir(Path::new("bare.mp4")).unwrap();
}
